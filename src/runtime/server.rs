use std::time::Duration;

use actix_web::{
    App, HttpServer,
    middleware::{Compress, Condition, DefaultHeaders},
    web,
};
use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::api::fault::{
    json_error_handler, not_found_handler, path_error_handler, query_error_handler,
};
use crate::api::middleware::{RequestTrace, rate_limit_state, rate_limiter};
use crate::api::services::configure;
use crate::config::StaticConfig;

use super::cors::build_cors_middleware;
use super::startup::{AppState, prepare_startup};

/// 注册共享状态、提取器错误处理、路由与兜底 404
pub fn configure_app(state: AppState) -> impl Fn(&mut web::ServiceConfig) + Clone {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::Data::new(state.user_service.clone()))
            .app_data(web::Data::new(state.pagination.clone()))
            .app_data(web::Data::new(state.start_time.clone()))
            .app_data(
                web::JsonConfig::default()
                    .limit(state.payload_limit_bytes)
                    .error_handler(json_error_handler),
            )
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .app_data(web::PathConfig::default().error_handler(path_error_handler))
            .configure(configure)
            .default_service(web::to(not_found_handler));
    }
}

pub async fn run_server(config: StaticConfig) -> Result<()> {
    let startup = prepare_startup(&config).await.map_err(|e| {
        tracing::error!("Server startup failed: {:#}", e);
        e
    })?;

    let state = startup.state.clone();
    let db_for_shutdown = startup.storage.get_db().clone();

    let server_config = config.server.clone();
    let cors_config = config.cors.clone();
    let rate_limit_config = config.rate_limit.clone();
    let limiter_state = rate_limit_state(&rate_limit_config)?;
    if rate_limit_config.enabled {
        info!(
            "Rate limiting enabled: {} req/s per client, burst {}",
            rate_limit_config.per_second, rate_limit_config.burst_size
        );
    } else {
        warn!("Rate limiting disabled");
    }

    let workers = server_config.workers.max(1);
    let keep_alive = format!("timeout={}, max=1000", server_config.keep_alive_secs);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Condition::new(
                rate_limit_config.enabled,
                rate_limiter(&limiter_state),
            ))
            .wrap(build_cors_middleware(&cors_config))
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("Keep-Alive", keep_alive.as_str()))
                    .add(("Cache-Control", "no-cache, no-store, must-revalidate")),
            )
            // 最外层，覆盖整个请求生命周期
            .wrap(RequestTrace)
            .configure(configure_app(state.clone()))
    })
    .keep_alive(Duration::from_secs(server_config.keep_alive_secs))
    .client_request_timeout(Duration::from_millis(server_config.client_request_timeout_ms))
    .client_disconnect_timeout(Duration::from_millis(1000))
    .workers(workers);

    let bind_address = format!("{}:{}", server_config.host, server_config.port);
    warn!(
        "Starting server at http://{} with {} workers",
        bind_address, workers
    );
    let server = server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run();

    server.await?;

    info!("Server stopped, closing database connections");
    if let Err(e) = db_for_shutdown.close().await {
        warn!("Failed to close database connection: {}", e);
    }
    Ok(())
}
