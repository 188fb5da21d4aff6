//! 日志系统初始化
//!
//! 根据 [`LoggingConfig`] 选择输出目标（stdout / 追加文件 / 滚动文件）与格式。
//! 只能在启动时调用一次。

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;

use crate::config::{LogFormat, LogRotation, LoggingConfig};
use crate::errors::{AppError, Result};

const DEFAULT_LOG_FILE_NAME: &str = "crudkit.log";

/// 初始化全局 tracing subscriber
///
/// 返回的 `WorkerGuard` 必须在程序运行期间保持存活，否则缓冲中的日志会丢失。
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let writer = build_writer(config)?;

    let (non_blocking_writer, guard) = tracing_appender::non_blocking(writer);
    let filter = tracing_subscriber::EnvFilter::try_new(&config.level).map_err(|e| {
        AppError::config(format!("logging.level '{}' 无效: {}", config.level, e))
    })?;

    let subscriber_builder = tracing_subscriber::fmt()
        .with_writer(non_blocking_writer)
        .with_env_filter(filter)
        .with_level(true)
        .with_ansi(writes_to_console(config));

    let installed = match config.format {
        LogFormat::Json => subscriber_builder.json().try_init(),
        LogFormat::Text => subscriber_builder.try_init(),
    };
    installed.map_err(|e| AppError::internal(format!("日志系统初始化失败: {}", e)))?;

    Ok(guard)
}

fn writes_to_console(config: &LoggingConfig) -> bool {
    config.file.as_ref().is_none_or(|f| f.trim().is_empty())
}

fn build_writer(config: &LoggingConfig) -> Result<Box<dyn std::io::Write + Send + Sync>> {
    let log_file = match config.file.as_deref().map(str::trim) {
        Some(file) if !file.is_empty() => file,
        _ => return Ok(Box::new(std::io::stdout())),
    };

    let path = Path::new(log_file);
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)?;
    }

    if !config.enable_rotation || config.rotation == LogRotation::Never {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| AppError::file_operation(format!("无法打开日志文件 {}: {}", log_file, e)))?;
        return Ok(Box::new(file));
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let filename = path
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or(DEFAULT_LOG_FILE_NAME);

    let appender = rolling::Builder::new()
        .rotation(rotation_of(config.rotation))
        .filename_prefix(filename.trim_end_matches(".log"))
        .filename_suffix("log")
        .max_log_files(config.max_backups.max(1) as usize)
        .build(dir)
        .map_err(|e| AppError::file_operation(format!("创建滚动日志失败: {}", e)))?;
    Ok(Box::new(appender))
}

fn rotation_of(rotation: LogRotation) -> rolling::Rotation {
    match rotation {
        LogRotation::Minutely => rolling::Rotation::MINUTELY,
        LogRotation::Hourly => rolling::Rotation::HOURLY,
        LogRotation::Daily => rolling::Rotation::DAILY,
        LogRotation::Never => rolling::Rotation::NEVER,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_console_when_no_file() {
        let config = LoggingConfig::default();
        assert!(writes_to_console(&config));

        let config = LoggingConfig {
            file: Some("  ".to_string()),
            ..LoggingConfig::default()
        };
        assert!(writes_to_console(&config));
    }

    #[test]
    fn test_append_file_is_created_with_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("app.log");
        let config = LoggingConfig {
            file: Some(path.display().to_string()),
            enable_rotation: false,
            ..LoggingConfig::default()
        };

        assert!(build_writer(&config).is_ok());
        assert!(path.exists());
        assert!(!writes_to_console(&config));
    }

    #[test]
    fn test_rolling_writer_builds() {
        let dir = TempDir::new().unwrap();
        let config = LoggingConfig {
            file: Some(dir.path().join("app.log").display().to_string()),
            rotation: LogRotation::Hourly,
            ..LoggingConfig::default()
        };
        assert!(build_writer(&config).is_ok());
    }

    #[test]
    fn test_rotation_mapping() {
        assert_eq!(rotation_of(LogRotation::Daily), rolling::Rotation::DAILY);
        assert_eq!(rotation_of(LogRotation::Never), rolling::Rotation::NEVER);
    }
}
