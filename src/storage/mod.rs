use std::sync::Arc;

use async_trait::async_trait;

use crate::api::pagination::PageSource;
use crate::config::DatabaseConfig;
use crate::errors::Result;

pub mod backend;
pub mod models;

pub use backend::SeaOrmUserRepository;
pub use models::{NewUser, User, UserChanges, UserFilter, UserStatus};

/// 用户仓储
///
/// 同时作为用户列表的分页数据源。
#[async_trait]
pub trait UserRepository: PageSource<User, UserFilter> {
    async fn insert(&self, user: &User) -> Result<()>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// 按 id 覆盖整行，返回是否命中
    async fn update(&self, user: &User) -> Result<bool>;

    /// 按 id 删除，返回是否命中
    async fn delete(&self, id: i64) -> Result<bool>;

    /// 存活检查
    async fn ping(&self) -> Result<()>;
}

pub struct StorageFactory;

impl StorageFactory {
    pub async fn create(config: &DatabaseConfig) -> Result<Arc<SeaOrmUserRepository>> {
        // 从 URL 自动推断数据库类型
        let backend_type = backend::infer_backend_from_url(&config.database_url)?;

        let storage = SeaOrmUserRepository::new(config, &backend_type).await?;
        Ok(Arc::new(storage))
    }
}
