use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::api::pagination::HARD_MAX_PAGE_SIZE;
use crate::errors::{AppError, Result};

/// 默认配置文件
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
/// 环境变量前缀，分隔符为 `__`，例如 `CK__SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "CK";
/// 指定运行环境（dev / test / prod ...）的环境变量
pub const PROFILE_ENV: &str = "CK_PROFILE";

/// 配置来源
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    /// 基础配置文件路径，缺省为 `config.toml`
    pub path: Option<String>,
    /// 运行环境，会额外加载 `config.<profile>.toml`
    pub profile: Option<String>,
    /// 是否读取 `CK__*` 环境变量
    pub skip_env: bool,
}

impl ConfigSource {
    pub fn new(path: Option<String>, profile: Option<String>) -> Self {
        Self {
            path,
            profile,
            skip_env: false,
        }
    }

    /// 命令行未指定 profile 时回退到 `CK_PROFILE`
    pub fn resolved_profile(&self) -> Option<String> {
        self.profile
            .clone()
            .or_else(|| std::env::var(PROFILE_ENV).ok())
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
    }

    pub fn base_path(&self) -> &str {
        self.path.as_deref().unwrap_or(DEFAULT_CONFIG_PATH)
    }

    /// `config.toml` + `dev` -> `config.dev.toml`
    pub fn profile_path(&self, profile: &str) -> PathBuf {
        let base = Path::new(self.base_path());
        let stem = base
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("config");
        let ext = base.extension().and_then(|s| s.to_str()).unwrap_or("toml");
        base.with_file_name(format!("{}.{}.{}", stem, profile, ext))
    }
}

/// 静态配置（启动时加载，运行期间不可变）
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub id: IdConfig,
}

impl StaticConfig {
    /// 从配置文件和环境变量加载配置并校验
    pub fn load(source: &ConfigSource) -> Result<Self> {
        use config::{Config, Environment, File};

        let base_path = source.base_path();
        let mut builder = Config::builder().add_source(File::with_name(base_path).required(false));

        if let Some(profile) = source.resolved_profile() {
            let profile_path = source.profile_path(&profile);
            builder = builder.add_source(
                File::from(profile_path.as_path()).required(false),
            );
        }

        if !source.skip_env {
            builder = builder.add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .with_list_parse_key("cors.allowed_methods")
                    .with_list_parse_key("cors.allowed_headers")
                    .with_list_parse_key("rate_limit.trusted_proxies")
                    .try_parsing(true),
            );
        }

        let config: StaticConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 校验配置取值
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(AppError::config("server.port must not be 0"));
        }
        if self.server.workers == 0 {
            return Err(AppError::config("server.workers must be at least 1"));
        }
        if self.database.database_url.trim().is_empty() {
            return Err(AppError::config("database.database_url must not be empty"));
        }
        if self.database.pool_size == 0 {
            return Err(AppError::config("database.pool_size must be at least 1"));
        }
        if self.database.min_connections > self.database.pool_size {
            return Err(AppError::config(
                "database.min_connections must not exceed database.pool_size",
            ));
        }
        if self.pagination.max_size == 0 || self.pagination.max_size > HARD_MAX_PAGE_SIZE {
            return Err(AppError::config(format!(
                "pagination.max_size must be between 1 and {}",
                HARD_MAX_PAGE_SIZE
            )));
        }
        if self.pagination.default_size == 0
            || self.pagination.default_size > self.pagination.max_size
        {
            return Err(AppError::config(
                "pagination.default_size must be between 1 and pagination.max_size",
            ));
        }
        if self.rate_limit.enabled && (self.rate_limit.per_second == 0 || self.rate_limit.burst_size == 0)
        {
            return Err(AppError::config(
                "rate_limit.per_second and rate_limit.burst_size must be at least 1",
            ));
        }
        if self.id.datacenter_id > crate::utils::snowflake::MAX_NODE_ID
            || self.id.worker_id > crate::utils::snowflake::MAX_NODE_ID
        {
            return Err(AppError::config(format!(
                "id.datacenter_id and id.worker_id must be between 0 and {}",
                crate::utils::snowflake::MAX_NODE_ID
            )));
        }
        Ok(())
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 把配置模板写入文件，缺失的上级目录会被创建
    pub fn write_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, Self::generate_sample_config())?;
        Ok(())
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
    #[serde(default = "default_client_request_timeout_ms")]
    pub client_request_timeout_ms: u64,
    #[serde(default = "default_payload_limit_bytes")]
    pub payload_limit_bytes: usize,
}

/// 数据库连接与连接池配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime_secs")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// 日志文件滚动周期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Minutely,
    Hourly,
    #[default]
    Daily,
    Never,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
    #[serde(default)]
    pub rotation: LogRotation,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
}

/// CORS 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    #[serde(default = "default_cors_methods")]
    pub allowed_methods: Vec<String>,
    #[serde(default = "default_cors_headers")]
    pub allowed_headers: Vec<String>,
    #[serde(default = "default_cors_max_age")]
    pub max_age: u64,
    #[serde(default)]
    pub allow_credentials: bool,
}

/// 限流配置（进程内令牌桶，按客户端 IP）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_rate_limit_enabled")]
    pub enabled: bool,
    #[serde(default = "default_rate_limit_per_second")]
    pub per_second: u64,
    #[serde(default = "default_rate_limit_burst")]
    pub burst_size: u32,
    /// 可信反向代理，来自这些地址的请求使用 X-Forwarded-For
    #[serde(default)]
    pub trusted_proxies: Vec<String>,
}

/// 分页配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    #[serde(default = "default_page_size")]
    pub default_size: u64,
    #[serde(default = "default_max_page_size")]
    pub max_size: u64,
}

/// 雪花 ID 节点配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IdConfig {
    #[serde(default)]
    pub datacenter_id: u64,
    #[serde(default)]
    pub worker_id: u64,
}

// ============================================================
// Default value functions for static config
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_keep_alive_secs() -> u64 {
    30
}

fn default_client_request_timeout_ms() -> u64 {
    5000
}

fn default_payload_limit_bytes() -> usize {
    1024 * 1024
}

fn default_database_url() -> String {
    "sqlite://crudkit.db?mode=rwc".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout_secs() -> u64 {
    8
}

fn default_acquire_timeout_secs() -> u64 {
    8
}

fn default_idle_timeout_secs() -> u64 {
    300
}

fn default_max_lifetime_secs() -> u64 {
    3600
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_enable_rotation() -> bool {
    true
}

fn default_max_backups() -> u32 {
    5
}

fn default_cors_methods() -> Vec<String> {
    ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
        .iter()
        .map(|m| m.to_string())
        .collect()
}

fn default_cors_headers() -> Vec<String> {
    ["Content-Type", "Authorization", "Accept", "X-Request-ID"]
        .iter()
        .map(|h| h.to_string())
        .collect()
}

fn default_cors_max_age() -> u64 {
    3600
}

fn default_rate_limit_enabled() -> bool {
    true
}

fn default_rate_limit_per_second() -> u64 {
    10
}

fn default_rate_limit_burst() -> u32 {
    50
}

fn default_page_size() -> u64 {
    crate::api::pagination::DEFAULT_PAGE_SIZE
}

fn default_max_page_size() -> u64 {
    HARD_MAX_PAGE_SIZE
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            workers: default_workers(),
            keep_alive_secs: default_keep_alive_secs(),
            client_request_timeout_ms: default_client_request_timeout_ms(),
            payload_limit_bytes: default_payload_limit_bytes(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout_secs(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
            max_lifetime_secs: default_max_lifetime_secs(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            file: None,
            enable_rotation: default_enable_rotation(),
            rotation: LogRotation::default(),
            max_backups: default_max_backups(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            allowed_origins: Vec::new(),
            allowed_methods: default_cors_methods(),
            allowed_headers: default_cors_headers(),
            max_age: default_cors_max_age(),
            allow_credentials: false,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_rate_limit_enabled(),
            per_second: default_rate_limit_per_second(),
            burst_size: default_rate_limit_burst(),
            trusted_proxies: Vec::new(),
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_size: default_page_size(),
            max_size: default_max_page_size(),
        }
    }
}
