//! 用户管理端点 `/api/v1/users`

use actix_web::{HttpResponse, web};
use tracing::debug;

use crate::api::response::{Envelope, PagedResult};
use crate::api::types::{
    CreateUserRequest, DeletedResponse, UpdateUserRequest, UserListQuery, UserResponse,
};
use crate::api::validation::{ValidatedJson, ValidatedQuery};
use crate::config::PaginationConfig;
use crate::errors::AppError;
use crate::services::UserService;

/// 成功响应
fn success_response<T: serde::Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok()
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(Envelope::success(data))
}

/// POST /users
pub async fn create_user(
    service: web::Data<UserService>,
    body: ValidatedJson<CreateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let user = service.create_user(body.into_inner().into()).await?;
    Ok(success_response(UserResponse::from(user)))
}

/// GET /users?page=&size=&keyword=&status=
pub async fn list_users(
    service: web::Data<UserService>,
    pagination: web::Data<PaginationConfig>,
    query: ValidatedQuery<UserListQuery>,
) -> Result<HttpResponse, AppError> {
    let request = query
        .page_query()
        .to_request(pagination.default_size, pagination.max_size)?;
    let filter = query.filter()?;
    debug!("Listing users: {:?} page {}", filter, request.page());

    let page: PagedResult<UserResponse> = service
        .get_users(&filter, &request)
        .await?
        .map(UserResponse::from);
    Ok(success_response(page))
}

/// GET /users/{id}
pub async fn get_user(
    service: web::Data<UserService>,
    id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let user = service.get_user(id.into_inner()).await?;
    Ok(success_response(UserResponse::from(user)))
}

/// PUT /users/{id}
pub async fn update_user(
    service: web::Data<UserService>,
    id: web::Path<i64>,
    body: ValidatedJson<UpdateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let changes = body.into_inner().into_changes()?;
    let user = service.update_user(id.into_inner(), changes).await?;
    Ok(success_response(UserResponse::from(user)))
}

/// DELETE /users/{id}
pub async fn delete_user(
    service: web::Data<UserService>,
    id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = id.into_inner();
    service.delete_user(id).await?;
    Ok(success_response(DeletedResponse { id: id.to_string() }))
}
