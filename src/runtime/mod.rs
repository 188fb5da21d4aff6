//! 运行时：启动准备与 HTTP 服务

mod cors;
pub mod server;
pub mod startup;

pub use cors::{build_cors_middleware, validate_cors_config};
pub use server::{configure_app, run_server};
pub use startup::{AppState, StartupContext, prepare_startup};
