//! crudkit - 企业级 CRUD 后端骨架
//!
//! # Architecture
//! - `api`: 统一响应信封、故障翻译、参数校验、分页以及 HTTP 端点
//! - `services`: 业务逻辑
//! - `storage`: 仓储接口与 SeaORM 实现
//! - `config`: 多环境配置
//! - `runtime`: 启动准备与 HTTP 服务
//! - `system`: 日志
//! - `utils`: 雪花 ID、客户端 IP

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
