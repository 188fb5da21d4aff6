use tracing::warn;

use crate::storage::{User, UserStatus};
use migration::entities::user;

/// 将 Sea-ORM Model 转换为 User
pub fn model_to_user(model: user::Model) -> User {
    let status = UserStatus::from_i16(model.status).unwrap_or_else(|_| {
        warn!(
            "User {} has unknown status {}, treating as disabled",
            model.id, model.status
        );
        UserStatus::Disabled
    });

    User {
        id: model.id,
        username: model.username,
        email: model.email,
        phone: model.phone,
        age: model.age,
        status,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

/// 将 User 转换为 ActiveModel（用于插入/更新）
///
/// 更新时不覆盖 `created_at`。
pub fn user_to_active_model(user: &User, is_new: bool) -> user::ActiveModel {
    use sea_orm::ActiveValue::*;

    user::ActiveModel {
        id: Set(user.id),
        username: Set(user.username.clone()),
        email: Set(user.email.clone()),
        phone: Set(user.phone.clone()),
        age: Set(user.age),
        status: Set(user.status.as_i16()),
        created_at: if is_new { Set(user.created_at) } else { NotSet },
        updated_at: Set(user.updated_at),
    }
}
