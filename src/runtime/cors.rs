//! CORS 中间件构建

use actix_cors::Cors;
use actix_web::http::Method;
use tracing::warn;

use crate::config::CorsConfig;
use crate::errors::{AppError, Result};

fn is_any_origin(config: &CorsConfig) -> bool {
    config.allowed_origins.iter().any(|o| o == "*")
}

/// 启动时校验一次 CORS 配置
///
/// 任意来源 + 携带凭证的组合直接拒绝启动。
pub fn validate_cors_config(config: &CorsConfig) -> Result<()> {
    if !config.enabled {
        return Ok(());
    }

    if config.allowed_origins.is_empty() {
        warn!(
            "CORS enabled but allowed_origins is empty. \
            No cross-origin requests will be allowed."
        );
    }

    if is_any_origin(config) && config.allow_credentials {
        return Err(AppError::config(
            "cors.allowed_origins = [\"*\"] cannot be combined with cors.allow_credentials = true",
        ));
    }

    for method in &config.allowed_methods {
        if method.parse::<Method>().is_err() {
            return Err(AppError::config(format!(
                "cors.allowed_methods contains invalid method '{}'",
                method
            )));
        }
    }
    Ok(())
}

pub fn build_cors_middleware(config: &CorsConfig) -> Cors {
    if !config.enabled {
        // 默认配置拒绝所有跨域请求
        return Cors::default();
    }

    let mut cors = Cors::default();

    if is_any_origin(config) {
        cors = cors.allow_any_origin();
    } else {
        for origin in &config.allowed_origins {
            cors = cors.allowed_origin(origin);
        }
    }

    let methods: Vec<Method> = config
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();
    if !methods.is_empty() {
        cors = cors.allowed_methods(methods);
    }

    for header in &config.allowed_headers {
        cors = cors.allowed_header(header.as_str());
    }

    cors = cors.max_age(config.max_age as usize);

    if config.allow_credentials && !is_any_origin(config) {
        cors = cors.supports_credentials();
    }

    cors
}
