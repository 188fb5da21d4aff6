//! 系统级设施

pub mod logging;
