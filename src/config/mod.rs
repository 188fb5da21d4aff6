//! 配置管理
//!
//! 加载优先级（后者覆盖前者）：
//! 默认值 < `config.toml` < `config.<profile>.toml` < 环境变量 `CK__*`

mod structs;

pub use structs::*;
