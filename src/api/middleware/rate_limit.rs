//! 进程内限流
//!
//! 按客户端 IP 的令牌桶（`actix-governor`），超限时返回 429 状态码与
//! `code = 429` 的失败信封。

use std::sync::Arc;

use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, KeyExtractor, SimpleKeyExtractionError,
};
use actix_web::dev::ServiceRequest;
use actix_web::{HttpResponse, HttpResponseBuilder};
use governor::NotUntil;
use governor::clock::{Clock, DefaultClock, QuantaInstant};
use governor::middleware::NoOpMiddleware;
use tracing::{debug, warn};

use crate::api::response::{Envelope, TOO_MANY_REQUESTS_CODE};
use crate::config::RateLimitConfig;
use crate::errors::{AppError, Result};
use crate::utils::ip::client_ip;

pub const RATE_LIMITED_MESSAGE: &str = "请求过于频繁，请稍后重试";

/// 基于客户端 IP 的限流 key 提取器
#[derive(Clone, Debug, Default)]
pub struct ClientIpKeyExtractor {
    trusted_proxies: Arc<Vec<String>>,
}

impl ClientIpKeyExtractor {
    pub fn new(trusted_proxies: Vec<String>) -> Self {
        Self {
            trusted_proxies: Arc::new(trusted_proxies),
        }
    }
}

impl KeyExtractor for ClientIpKeyExtractor {
    type Key = String;
    type KeyExtractionError = SimpleKeyExtractionError<&'static str>;

    fn extract(&self, req: &ServiceRequest) -> std::result::Result<Self::Key, Self::KeyExtractionError> {
        client_ip(&req.connection_info(), &self.trusted_proxies)
            .ok_or_else(|| SimpleKeyExtractionError::new("Unable to extract client IP"))
    }

    fn exceed_rate_limit_response(
        &self,
        negative: &NotUntil<QuantaInstant>,
        mut response: HttpResponseBuilder,
    ) -> HttpResponse {
        let wait_secs = negative
            .wait_time_from(DefaultClock::default().now())
            .as_secs();
        warn!("Rate limit exceeded, retry in {}s", wait_secs);
        response
            .insert_header(("Retry-After", wait_secs.max(1).to_string()))
            .json(Envelope::<()>::failure_with_code(
                TOO_MANY_REQUESTS_CODE,
                RATE_LIMITED_MESSAGE,
            ))
    }
}

pub type RateLimiter = Governor<ClientIpKeyExtractor, NoOpMiddleware>;
pub type RateLimitState = GovernorConfig<ClientIpKeyExtractor, NoOpMiddleware>;

/// 根据配置创建令牌桶状态
///
/// 状态内部持有共享的限流器，每个 worker 用它构建自己的中间件，
/// 所有 worker 共用同一组配额。
pub fn rate_limit_state(config: &RateLimitConfig) -> Result<RateLimitState> {
    let governor_config = GovernorConfigBuilder::default()
        .requests_per_second(config.per_second.max(1))
        .burst_size(config.burst_size.max(1))
        .key_extractor(ClientIpKeyExtractor::new(config.trusted_proxies.clone()))
        .finish()
        .ok_or_else(|| AppError::config("rate_limit 配置无效"))?;

    debug!(
        "Rate limiter created: {} req/s, burst {}",
        config.per_second, config.burst_size
    );
    Ok(governor_config)
}

/// 基于共享状态创建限流中间件
pub fn rate_limiter(state: &RateLimitState) -> RateLimiter {
    Governor::new(state)
}
