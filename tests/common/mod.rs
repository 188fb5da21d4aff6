//! 集成测试共用的仓储替身与应用构建

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;

use crudkit::api::pagination::PageSource;
use crudkit::config::{DatabaseConfig, PaginationConfig};
use crudkit::errors::{AppError, Result};
use crudkit::runtime::AppState;
use crudkit::storage::{SeaOrmUserRepository, User, UserFilter, UserRepository};
use crudkit::utils::SnowflakeIdGenerator;

pub fn id_generator() -> Arc<SnowflakeIdGenerator> {
    Arc::new(SnowflakeIdGenerator::new(1, 1).expect("valid node ids"))
}

pub fn app_state(repository: Arc<dyn UserRepository>) -> AppState {
    AppState::new(
        repository,
        id_generator(),
        PaginationConfig::default(),
        1024 * 1024,
    )
}

/// 临时目录中的 SQLite 仓储（已执行迁移）
pub async fn sqlite_repository() -> (Arc<SeaOrmUserRepository>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("crudkit_test.db");
    let config = DatabaseConfig {
        database_url: format!("sqlite://{}?mode=rwc", db_path.display()),
        pool_size: 5,
        min_connections: 1,
        retry_count: 1,
        retry_base_delay_ms: 5,
        retry_max_delay_ms: 10,
        ..DatabaseConfig::default()
    };

    let repository = SeaOrmUserRepository::new(&config, "sqlite")
        .await
        .expect("Failed to create storage");
    (Arc::new(repository), temp_dir)
}

/// 记录调用次数的内存仓储
#[derive(Default)]
pub struct CountingRepository {
    pub users: Mutex<Vec<User>>,
    pub calls: AtomicUsize,
}

impl CountingRepository {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PageSource<User, UserFilter> for CountingRepository {
    async fn fetch(&self, filter: &UserFilter, offset: u64, limit: u64) -> Result<Vec<User>> {
        self.touch();
        Ok(self
            .users
            .lock()
            .iter()
            .filter(|u| filter.matches(u))
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &UserFilter) -> Result<u64> {
        self.touch();
        Ok(self.users.lock().iter().filter(|u| filter.matches(u)).count() as u64)
    }
}

#[async_trait]
impl UserRepository for CountingRepository {
    async fn insert(&self, user: &User) -> Result<()> {
        self.touch();
        self.users.lock().push(user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        self.touch();
        Ok(self.users.lock().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.touch();
        Ok(self.users.lock().iter().find(|u| u.email == email).cloned())
    }

    async fn update(&self, user: &User) -> Result<bool> {
        self.touch();
        let mut users = self.users.lock();
        match users.iter_mut().find(|u| u.id == user.id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        self.touch();
        let mut users = self.users.lock();
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() != before)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// 每个操作都失败的仓储，错误信息里带有不应泄露的细节
pub struct BrokenRepository {
    pub detail: String,
}

impl BrokenRepository {
    pub fn new(detail: &str) -> Self {
        Self {
            detail: detail.to_string(),
        }
    }

    fn fail<T>(&self) -> Result<T> {
        Err(AppError::database_operation(self.detail.clone()))
    }
}

#[async_trait]
impl PageSource<User, UserFilter> for BrokenRepository {
    async fn fetch(&self, _filter: &UserFilter, _offset: u64, _limit: u64) -> Result<Vec<User>> {
        self.fail()
    }

    async fn count(&self, _filter: &UserFilter) -> Result<u64> {
        self.fail()
    }
}

#[async_trait]
impl UserRepository for BrokenRepository {
    async fn insert(&self, _user: &User) -> Result<()> {
        self.fail()
    }

    async fn find_by_id(&self, _id: i64) -> Result<Option<User>> {
        self.fail()
    }

    async fn find_by_email(&self, _email: &str) -> Result<Option<User>> {
        self.fail()
    }

    async fn update(&self, _user: &User) -> Result<bool> {
        self.fail()
    }

    async fn delete(&self, _id: i64) -> Result<bool> {
        self.fail()
    }

    async fn ping(&self) -> Result<()> {
        Err(AppError::database_connection(self.detail.clone()))
    }
}
