use std::fmt;

/// 故障分类
///
/// - `Validation`：请求参数不满足约束，消息可直接返回给调用方
/// - `Declared`：业务逻辑主动声明的预期失败（如"用户不存在"），消息可直接返回
/// - `Unclassified`：其余一切（数据库、IO、序列化、程序缺陷），消息绝不外泄
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultClass {
    Validation,
    Declared,
    Unclassified,
}

#[derive(Debug, Clone)]
pub enum AppError {
    Validation(String),
    NotFound(String),
    Business(String),
    Config(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    FileOperation(String),
    Serialization(String),
    IdGeneration(String),
    Internal(String),
}

impl AppError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "E001",
            AppError::NotFound(_) => "E002",
            AppError::Business(_) => "E003",
            AppError::Config(_) => "E004",
            AppError::DatabaseConfig(_) => "E005",
            AppError::DatabaseConnection(_) => "E006",
            AppError::DatabaseOperation(_) => "E007",
            AppError::FileOperation(_) => "E008",
            AppError::Serialization(_) => "E009",
            AppError::IdGeneration(_) => "E010",
            AppError::Internal(_) => "E011",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "Validation Error",
            AppError::NotFound(_) => "Resource Not Found",
            AppError::Business(_) => "Business Rule Violation",
            AppError::Config(_) => "Configuration Error",
            AppError::DatabaseConfig(_) => "Database Configuration Error",
            AppError::DatabaseConnection(_) => "Database Connection Error",
            AppError::DatabaseOperation(_) => "Database Operation Error",
            AppError::FileOperation(_) => "File Operation Error",
            AppError::Serialization(_) => "Serialization Error",
            AppError::IdGeneration(_) => "Id Generation Error",
            AppError::Internal(_) => "Internal Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::Business(msg)
            | AppError::Config(msg)
            | AppError::DatabaseConfig(msg)
            | AppError::DatabaseConnection(msg)
            | AppError::DatabaseOperation(msg)
            | AppError::FileOperation(msg)
            | AppError::Serialization(msg)
            | AppError::IdGeneration(msg)
            | AppError::Internal(msg) => msg,
        }
    }

    /// 故障分类，决定消息能否暴露给调用方
    pub fn fault_class(&self) -> FaultClass {
        match self {
            AppError::Validation(_) => FaultClass::Validation,
            AppError::NotFound(_) | AppError::Business(_) => FaultClass::Declared,
            _ => FaultClass::Unclassified,
        }
    }

    /// 是否为可直接展示给用户的故障（校验失败或业务声明的失败）
    pub fn is_user_facing(&self) -> bool {
        self.fault_class() != FaultClass::Unclassified
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for AppError {}

// 便捷的构造函数
impl AppError {
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn business<T: Into<String>>(msg: T) -> Self {
        AppError::Business(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        AppError::Config(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        AppError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        AppError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        AppError::DatabaseOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        AppError::FileOperation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        AppError::Serialization(msg.into())
    }

    pub fn id_generation<T: Into<String>>(msg: T) -> Self {
        AppError::IdGeneration(msg.into())
    }

    pub fn internal<T: Into<String>>(msg: T) -> Self {
        AppError::Internal(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
