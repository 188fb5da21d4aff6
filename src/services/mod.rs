//! 业务服务层

mod user_service;

pub use user_service::*;
