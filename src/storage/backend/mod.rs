//! SeaORM storage backend
//!
//! 支持 SQLite、MySQL/MariaDB、PostgreSQL。

mod connection;
mod converters;
mod mutations;
mod query;
pub mod retry;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use tracing::info;

use crate::api::pagination::PageSource;
use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use crate::storage::{User, UserFilter, UserRepository};

pub use connection::{connect_generic, connect_sqlite, run_migrations};
pub use converters::{model_to_user, user_to_active_model};

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite:")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(AppError::database_config(format!(
            "无法从 URL 推断数据库类型: {}. 支持的 URL 格式: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

#[derive(Clone)]
pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
    backend_name: String,
    retry_config: retry::RetryConfig,
}

impl SeaOrmUserRepository {
    /// 建立连接并执行迁移
    pub async fn new(config: &DatabaseConfig, backend_name: &str) -> Result<Self> {
        if config.database_url.trim().is_empty() {
            return Err(AppError::database_config("database.database_url 未设置"));
        }

        let db = if backend_name == "sqlite" {
            connect_sqlite(config).await?
        } else {
            connect_generic(config, backend_name).await?
        };

        run_migrations(&db).await?;

        info!(
            "{} storage initialized (pool size {})",
            backend_name.to_uppercase(),
            config.pool_size
        );
        Ok(Self::from_connection(db, backend_name, retry::RetryConfig::from(config)))
    }

    /// 包装已有连接（不执行迁移）
    pub fn from_connection(
        db: DatabaseConnection,
        backend_name: &str,
        retry_config: retry::RetryConfig,
    ) -> Self {
        Self {
            db,
            backend_name: backend_name.to_string(),
            retry_config,
        }
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl PageSource<User, UserFilter> for SeaOrmUserRepository {
    async fn fetch(&self, filter: &UserFilter, offset: u64, limit: u64) -> Result<Vec<User>> {
        self.load_filtered(filter, offset, limit).await
    }

    async fn count(&self, filter: &UserFilter) -> Result<u64> {
        self.count_filtered(filter).await
    }
}

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn insert(&self, user: &User) -> Result<()> {
        self.insert_user(user).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.get_by_email(email).await
    }

    async fn update(&self, user: &User) -> Result<bool> {
        self.update_user(user).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        self.remove_user(id).await
    }

    async fn ping(&self) -> Result<()> {
        self.db
            .ping()
            .await
            .map_err(|e| AppError::database_connection(format!("数据库不可用: {}", e)))
    }
}
