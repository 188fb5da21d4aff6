//! HTTP 请求/响应 DTO
//!
//! 实体与 DTO 之间的转换全部显式写出，不做反射式拷贝。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::pagination::PageQuery;
use crate::api::validation::{email_address, not_blank};
use crate::errors::Result;
use crate::storage::{NewUser, User, UserChanges, UserFilter, UserStatus};

/// 创建用户请求
///
/// 缺失的必填字段按空串处理，统一报告为 "must not be blank"。
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateUserRequest {
    #[serde(default)]
    #[validate(custom(function = "not_blank"), length(max = 64))]
    pub username: String,
    #[serde(default)]
    #[validate(custom(function = "email_address"), length(max = 128))]
    pub email: String,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(range(min = 0, max = 150))]
    pub age: Option<i32>,
}

impl From<CreateUserRequest> for NewUser {
    fn from(req: CreateUserRequest) -> Self {
        NewUser {
            username: req.username,
            email: req.email,
            phone: req.phone.filter(|p| !p.trim().is_empty()),
            age: req.age,
        }
    }
}

/// 更新用户请求，只修改提供了的字段
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(custom(function = "not_blank"), length(max = 64))]
    pub username: Option<String>,
    #[validate(custom(function = "email_address"), length(max = 128))]
    pub email: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(range(min = 0, max = 150))]
    pub age: Option<i32>,
    #[validate(range(min = 0, max = 1))]
    pub status: Option<i16>,
}

impl UpdateUserRequest {
    pub fn into_changes(self) -> Result<UserChanges> {
        Ok(UserChanges {
            username: self.username,
            email: self.email,
            phone: self.phone.filter(|p| !p.trim().is_empty()),
            age: self.age,
            status: self.status.map(UserStatus::from_i16).transpose()?,
        })
    }
}

/// 用户列表查询参数
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    #[validate(length(max = 64))]
    pub keyword: Option<String>,
    #[validate(range(min = 0, max = 1))]
    pub status: Option<i16>,
}

impl UserListQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            size: self.size,
        }
    }

    pub fn filter(&self) -> Result<UserFilter> {
        Ok(UserFilter {
            keyword: self
                .keyword
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
            status: self.status.map(UserStatus::from_i16).transpose()?,
        })
    }
}

/// 用户响应
///
/// id 以字符串输出，避免 JavaScript 端精度丢失。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub age: Option<i32>,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id.to_string(),
            username: user.username,
            email: user.email,
            phone: user.phone,
            age: user.age,
            status: user.status,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedResponse {
    pub id: String,
}

/// 健康检查响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub storage: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_secs: u64,
    pub response_time_ms: u64,
}
