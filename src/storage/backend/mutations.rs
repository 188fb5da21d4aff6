//! 写操作

use sea_orm::{ActiveModelTrait, DbErr, EntityTrait, SqlErr};
use tracing::info;

use super::converters::user_to_active_model;
use super::{SeaOrmUserRepository, retry};
use crate::errors::{AppError, Result};
use crate::storage::User;

use migration::entities::user;

/// 唯一约束冲突（邮箱并发注册）翻译为业务错误
fn map_write_error(err: DbErr, action: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::business("邮箱已被注册"),
        _ => AppError::database_operation(format!("{}失败: {}", action, err)),
    }
}

impl SeaOrmUserRepository {
    pub(super) async fn insert_user(&self, user: &User) -> Result<()> {
        let db = &self.db;

        retry::with_retry(&format!("insert({})", user.id), self.retry_config, || async {
            user::Entity::insert(user_to_active_model(user, true))
                .exec_without_returning(db)
                .await
        })
        .await
        .map_err(|e| map_write_error(e, "创建用户"))?;

        info!("User created: {}", user.id);
        Ok(())
    }

    pub(super) async fn update_user(&self, user: &User) -> Result<bool> {
        let db = &self.db;

        let result = retry::with_retry(&format!("update({})", user.id), self.retry_config, || async {
            user_to_active_model(user, false).update(db).await
        })
        .await;

        match result {
            Ok(_) => {
                info!("User updated: {}", user.id);
                Ok(true)
            }
            Err(DbErr::RecordNotUpdated) | Err(DbErr::RecordNotFound(_)) => Ok(false),
            Err(e) => Err(map_write_error(e, "更新用户")),
        }
    }

    pub(super) async fn remove_user(&self, id: i64) -> Result<bool> {
        let db = &self.db;

        let result = retry::with_retry(&format!("delete({})", id), self.retry_config, || async {
            user::Entity::delete_by_id(id).exec(db).await
        })
        .await
        .map_err(|e| AppError::database_operation(format!("删除用户失败: {}", e)))?;

        if result.rows_affected > 0 {
            info!("User deleted: {}", id);
        }
        Ok(result.rows_affected > 0)
    }
}
