//! 启动准备：连接存储、执行迁移、构建服务

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::api::fault::FaultTranslator;
use crate::api::services::AppStartTime;
use crate::config::{PaginationConfig, StaticConfig};
use crate::services::UserService;
use crate::storage::{SeaOrmUserRepository, StorageFactory, UserRepository};
use crate::utils::snowflake::SnowflakeIdGenerator;

use super::cors::validate_cors_config;

/// 请求处理期间共享的应用状态
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub pagination: PaginationConfig,
    pub payload_limit_bytes: usize,
    pub start_time: AppStartTime,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        ids: Arc<SnowflakeIdGenerator>,
        pagination: PaginationConfig,
        payload_limit_bytes: usize,
    ) -> Self {
        Self {
            user_service: UserService::new(repository, ids),
            pagination,
            payload_limit_bytes,
            start_time: AppStartTime::default(),
        }
    }
}

/// 启动上下文
pub struct StartupContext {
    pub storage: Arc<SeaOrmUserRepository>,
    pub ids: Arc<SnowflakeIdGenerator>,
    pub state: AppState,
}

pub async fn prepare_startup(config: &StaticConfig) -> Result<StartupContext> {
    debug!("Preparing startup with {:?}", config.server);

    validate_cors_config(&config.cors).context("Invalid CORS configuration")?;

    if !FaultTranslator::default().install() {
        warn!("Fault translator already installed, keeping the existing one");
    }

    let ids = Arc::new(
        SnowflakeIdGenerator::new(config.id.datacenter_id, config.id.worker_id)
            .context("Failed to create id generator")?,
    );

    let storage = StorageFactory::create(&config.database)
        .await
        .context("Failed to initialize storage")?;
    info!("Storage backend: {}", storage.backend_name());

    let state = AppState::new(
        storage.clone(),
        ids.clone(),
        config.pagination.clone(),
        config.server.payload_limit_bytes,
    );

    Ok(StartupContext {
        storage,
        ids,
        state,
    })
}
