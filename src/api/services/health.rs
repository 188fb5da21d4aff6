use std::time::{Duration, Instant};

use actix_web::{HttpResponse, web};
use tracing::trace;

use crate::api::response::Envelope;
use crate::api::types::HealthResponse;
use crate::errors::AppError;
use crate::services::UserService;

const STORAGE_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

// 应用启动时间
#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

impl Default for AppStartTime {
    fn default() -> Self {
        Self {
            start_datetime: chrono::Utc::now(),
        }
    }
}

/// GET /health
///
/// 存储不可用时按未分类故障处理，探针只会看到通用失败消息。
pub async fn health_check(
    service: web::Data<UserService>,
    start_time: web::Data<AppStartTime>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    trace!("Received health check request");

    match tokio::time::timeout(STORAGE_CHECK_TIMEOUT, service.check_storage()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(e),
        Err(_) => {
            return Err(AppError::database_connection("storage health check timed out"));
        }
    }

    let now = chrono::Utc::now();
    let uptime = (now - start_time.start_datetime).num_seconds().max(0) as u64;

    Ok(HttpResponse::Ok().json(Envelope::success(HealthResponse {
        status: "healthy".to_string(),
        storage: "healthy".to_string(),
        timestamp: now,
        uptime_secs: uptime,
        response_time_ms: started.elapsed().as_millis() as u64,
    })))
}
