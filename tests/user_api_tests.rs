//! 用户 API 集成测试
//!
//! 真实 SQLite 存储 + 完整的提取器错误处理与路由配置。

mod common;

use actix_web::App;
use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use serde_json::{Value, json};

use crudkit::api::middleware::RequestTrace;
use crudkit::api::response::SYSTEM_ERROR_MESSAGE;
use crudkit::runtime::configure_app;

use common::{app_state, sqlite_repository};

macro_rules! init_app {
    ($repo:expr) => {
        test::init_service(
            App::new()
                .wrap(RequestTrace)
                .configure(configure_app(app_state($repo))),
        )
        .await
    };
}

fn user_body(name: &str) -> Value {
    json!({
        "username": name,
        "email": format!("{}@example.com", name),
        "phone": "13800000000",
        "age": 30
    })
}

#[actix_web::test]
async fn test_create_and_get_user() {
    let (repo, _dir) = sqlite_repository().await;
    let app = init_app!(repo);

    let req = TestRequest::post()
        .uri("/api/v1/users")
        .set_json(user_body("alice"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 200);
    assert_eq!(body["message"], "成功");
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["status"], "active");

    let id = body["data"]["id"].as_str().expect("id rendered as string").to_string();
    assert!(id.parse::<i64>().is_ok());

    let req = TestRequest::get()
        .uri(&format!("/api/v1/users/{}", id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["code"], 200);
    assert_eq!(body["data"]["email"], "alice@example.com");
    assert_eq!(body["data"]["id"], id.as_str());
}

#[actix_web::test]
async fn test_blank_username_is_rejected_with_exact_message() {
    let (repo, _dir) = sqlite_repository().await;
    let app = init_app!(repo);

    let req = TestRequest::post()
        .uri("/api/v1/users")
        .set_json(json!({ "username": "   ", "email": "bob@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        json!({ "code": 500, "message": "username must not be blank", "data": null })
    );
}

#[actix_web::test]
async fn test_duplicate_email_is_declared_fault() {
    let (repo, _dir) = sqlite_repository().await;
    let app = init_app!(repo);

    for expected in [StatusCode::OK, StatusCode::BAD_REQUEST] {
        let req = TestRequest::post()
            .uri("/api/v1/users")
            .set_json(user_body("carol"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), expected);
        if expected == StatusCode::BAD_REQUEST {
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["message"], "邮箱已被注册");
            assert!(body["data"].is_null());
        }
    }
}

#[actix_web::test]
async fn test_first_page_of_25_users() {
    let (repo, _dir) = sqlite_repository().await;
    let app = init_app!(repo);

    for i in 0..25 {
        let req = TestRequest::post()
            .uri("/api/v1/users")
            .set_json(user_body(&format!("user{:02}", i)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let req = TestRequest::get()
        .uri("/api/v1/users?page=1&size=10")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["code"], 200);
    assert_eq!(body["data"]["records"].as_array().unwrap().len(), 10);
    assert_eq!(body["data"]["total"], 25);

    let req = TestRequest::get()
        .uri("/api/v1/users?page=3&size=10")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["records"].as_array().unwrap().len(), 5);

    let req = TestRequest::get()
        .uri("/api/v1/users?page=9&size=10")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["data"]["records"].as_array().unwrap().is_empty());
    assert_eq!(body["data"]["total"], 25);

    let req = TestRequest::get()
        .uri("/api/v1/users?keyword=user1&size=50")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["total"], 10);
}

#[actix_web::test]
async fn test_invalid_paging_is_validation_fault() {
    let (repo, _dir) = sqlite_repository().await;
    let app = init_app!(repo);

    for (uri, message) in [
        ("/api/v1/users?page=0", "page must be greater than 0"),
        ("/api/v1/users?size=-1", "size must be greater than 0"),
        ("/api/v1/users?size=501", "size must not exceed 500"),
    ] {
        let req = TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], 500);
        assert_eq!(body["message"], message);
    }

    let req = TestRequest::get().uri("/api/v1/users?page=abc").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_update_and_delete_user() {
    let (repo, _dir) = sqlite_repository().await;
    let app = init_app!(repo);

    let req = TestRequest::post()
        .uri("/api/v1/users")
        .set_json(user_body("dave"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let req = TestRequest::put()
        .uri(&format!("/api/v1/users/{}", id))
        .set_json(json!({ "age": 45, "status": 0 }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["code"], 200);
    assert_eq!(body["data"]["age"], 45);
    assert_eq!(body["data"]["status"], "disabled");
    assert_eq!(body["data"]["username"], "dave");

    let req = TestRequest::delete()
        .uri(&format!("/api/v1/users/{}", id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["code"], 200);
    assert_eq!(body["data"]["id"], id.as_str());

    let req = TestRequest::get()
        .uri(&format!("/api/v1/users/{}", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        json!({ "code": 500, "message": "用户不存在", "data": null })
    );
}

#[actix_web::test]
async fn test_malformed_requests_are_validation_faults() {
    let (repo, _dir) = sqlite_repository().await;
    let app = init_app!(repo);

    let req = TestRequest::post()
        .uri("/api/v1/users")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 500);
    assert!(body["message"].as_str().unwrap().starts_with("请求体格式错误"));

    let req = TestRequest::get().uri("/api/v1/users/not-a-number").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["message"].as_str().unwrap().starts_with("路径参数格式错误"));
}

#[actix_web::test]
async fn test_unknown_route_is_enveloped() {
    let (repo, _dir) = sqlite_repository().await;
    let app = init_app!(repo);

    let req = TestRequest::get().uri("/api/v1/nothing-here").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "接口不存在");
    assert_ne!(body["message"], SYSTEM_ERROR_MESSAGE);
}

#[actix_web::test]
async fn test_health_check() {
    let (repo, _dir) = sqlite_repository().await;
    let app = init_app!(repo);

    let req = TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 200);
    assert_eq!(body["data"]["status"], "healthy");
}
