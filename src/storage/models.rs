use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, Result};

/// 用户状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Disabled,
    #[default]
    Active,
}

impl UserStatus {
    pub fn as_i16(self) -> i16 {
        match self {
            UserStatus::Disabled => 0,
            UserStatus::Active => 1,
        }
    }

    pub fn from_i16(value: i16) -> Result<Self> {
        match value {
            0 => Ok(UserStatus::Disabled),
            1 => Ok(UserStatus::Active),
            other => Err(AppError::validation(format!(
                "status must be 0 (disabled) or 1 (active), got {}",
                other
            ))),
        }
    }
}

/// 用户实体（存储层与业务层之间传递）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub age: Option<i32>,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 新建用户所需字段（id 与时间戳由业务层生成）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub age: Option<i32>,
}

/// 部分更新，`None` 表示保持原值
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub age: Option<i32>,
    pub status: Option<UserStatus>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.age.is_none()
            && self.status.is_none()
    }

    /// 把变更应用到已有用户上
    pub fn apply_to(self, user: &mut User) {
        if let Some(username) = self.username {
            user.username = username;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(phone) = self.phone {
            user.phone = Some(phone);
        }
        if let Some(age) = self.age {
            user.age = Some(age);
        }
        if let Some(status) = self.status {
            user.status = status;
        }
    }
}

/// 用户列表过滤条件
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct UserFilter {
    /// 模糊匹配 username 或 email
    pub keyword: Option<String>,
    pub status: Option<UserStatus>,
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        let keyword_ok = match self.keyword.as_deref().map(str::trim) {
            Some(k) if !k.is_empty() => user.username.contains(k) || user.email.contains(k),
            _ => true,
        };
        keyword_ok && self.status.is_none_or(|s| s == user.status)
    }
}
