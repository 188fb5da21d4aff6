//! 路由配置

use actix_web::web;

use super::health::health_check;
use super::users::{create_user, delete_user, get_user, list_users, update_user};

/// API 版本前缀
pub const API_PREFIX: &str = "/api/v1";

/// 用户路由 `/users`
///
/// - GET /users - 分页查询
/// - POST /users - 创建
/// - GET /users/{id} - 详情
/// - PUT /users/{id} - 部分更新
/// - DELETE /users/{id} - 删除
pub fn users_routes() -> actix_web::Scope {
    web::scope("/users")
        .route("", web::get().to(list_users))
        .route("", web::post().to(create_user))
        .route("/{id}", web::get().to(get_user))
        .route("/{id}", web::put().to(update_user))
        .route("/{id}", web::delete().to(delete_user))
}

/// 注册全部路由
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .service(web::scope(API_PREFIX).service(users_routes()));
}
