//! 用户管理业务逻辑
//!
//! HTTP handler 只负责参数提取与 DTO 转换，所有规则集中在这里。

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::api::pagination::{PageRequest, assemble_page};
use crate::api::response::PagedResult;
use crate::errors::{AppError, Result};
use crate::storage::{NewUser, User, UserChanges, UserFilter, UserRepository, UserStatus};
use crate::utils::snowflake::SnowflakeIdGenerator;

pub const USER_NOT_FOUND: &str = "用户不存在";
pub const EMAIL_TAKEN: &str = "邮箱已被注册";

#[derive(Clone)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,
    ids: Arc<SnowflakeIdGenerator>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>, ids: Arc<SnowflakeIdGenerator>) -> Self {
        Self { repository, ids }
    }

    pub async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let email = new_user.email.trim().to_string();
        if self.repository.find_by_email(&email).await?.is_some() {
            return Err(AppError::business(EMAIL_TAKEN));
        }

        let now = Utc::now();
        let user = User {
            id: self.ids.next_id()?,
            username: new_user.username.trim().to_string(),
            email,
            phone: new_user.phone,
            age: new_user.age,
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
        };

        self.repository.insert(&user).await?;
        info!("UserService: created user {} <{}>", user.id, user.email);
        Ok(user)
    }

    pub async fn get_user(&self, id: i64) -> Result<User> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))
    }

    pub async fn get_users(
        &self,
        filter: &UserFilter,
        request: &PageRequest,
    ) -> Result<PagedResult<User>> {
        assemble_page(self.repository.as_ref(), filter, request).await
    }

    /// 部分更新，未提供的字段保持原值
    pub async fn update_user(&self, id: i64, mut changes: UserChanges) -> Result<User> {
        let mut user = self.get_user(id).await?;
        if changes.is_empty() {
            return Ok(user);
        }

        if let Some(email) = changes.email.take() {
            let email = email.trim().to_string();
            if email != user.email
                && let Some(other) = self.repository.find_by_email(&email).await?
                && other.id != id
            {
                return Err(AppError::business(EMAIL_TAKEN));
            }
            changes.email = Some(email);
        }
        if let Some(username) = changes.username.take() {
            changes.username = Some(username.trim().to_string());
        }

        changes.apply_to(&mut user);
        user.updated_at = Utc::now();

        if !self.repository.update(&user).await? {
            // 读取之后被并发删除
            return Err(AppError::not_found(USER_NOT_FOUND));
        }
        info!("UserService: updated user {}", id);
        Ok(user)
    }

    pub async fn delete_user(&self, id: i64) -> Result<()> {
        if !self.repository.delete(id).await? {
            return Err(AppError::not_found(USER_NOT_FOUND));
        }
        info!("UserService: deleted user {}", id);
        Ok(())
    }

    /// 存储健康检查
    pub async fn check_storage(&self) -> Result<()> {
        self.repository.ping().await
    }
}
