//! 请求参数校验
//!
//! 约束由调用方在 DTO 上通过 `validator` 的派生属性声明。校验发生在业务逻辑
//! 之前：[`ValidatedJson`] / [`ValidatedQuery`] 在提取阶段就会拒绝非法输入，
//! handler 根本不会被调用。
//!
//! 多个约束同时失败时，所有失败项按字段名排序后以 `"; "` 拼接。

use std::ops::Deref;

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest, web};
use futures_util::future::LocalBoxFuture;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidateEmail, ValidationError, ValidationErrors};

use crate::errors::AppError;

/// 非空白校验：拒绝空字符串和全空白字符串
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("not_blank"));
    }
    Ok(())
}

/// 必填邮箱：空白按 `not_blank` 报告，否则检查格式
pub fn email_address(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::new("not_blank"));
    }
    if !value.validate_email() {
        return Err(ValidationError::new("email"));
    }
    Ok(())
}

/// 校验输入，通过时原样返回
pub fn validate_input<T: Validate>(input: T) -> Result<T, AppError> {
    input.validate()?;
    Ok(input)
}

/// 把 `ValidationErrors` 渲染成一条面向用户的消息
pub fn render_validation_errors(errors: &ValidationErrors) -> String {
    let mut failures: Vec<(String, String)> = Vec::new();
    for (field, field_errors) in errors.field_errors() {
        let field = field.to_string();
        for error in field_errors.iter() {
            failures.push((field.clone(), describe(&field, error)));
        }
    }

    if failures.is_empty() {
        return "请求参数校验失败".to_string();
    }

    failures.sort();
    failures
        .into_iter()
        .map(|(_, message)| message)
        .collect::<Vec<_>>()
        .join("; ")
}

fn describe(field: &str, error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }

    let param = |name: &str| error.params.get(name).map(|v| v.to_string());

    match error.code.as_ref() {
        "not_blank" => format!("{} must not be blank", field),
        "email" => format!("{} must be a valid email address", field),
        "length" => match (param("min"), param("max"), param("equal")) {
            (_, _, Some(equal)) => format!("{} length must be exactly {}", field, equal),
            (Some(min), Some(max), _) => {
                format!("{} length must be between {} and {}", field, min, max)
            }
            (Some(min), None, _) => format!("{} length must be at least {}", field, min),
            (None, Some(max), _) => format!("{} length must be at most {}", field, max),
            _ => format!("{} has an invalid length", field),
        },
        "range" => match (param("min"), param("max")) {
            (Some(min), Some(max)) => format!("{} must be between {} and {}", field, min, max),
            (Some(min), None) => format!("{} must be at least {}", field, min),
            (None, Some(max)) => format!("{} must be at most {}", field, max),
            _ => format!("{} is out of range", field),
        },
        _ => format!("{} is invalid", field),
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::validation(render_validation_errors(&errors))
    }
}

/// 带校验的 JSON 请求体提取器
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T> ValidatedJson<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> FromRequest for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
{
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = web::Json::<T>::from_request(req, payload);
        Box::pin(async move {
            let web::Json(value) = fut.await?;
            let value = validate_input(value)?;
            Ok(ValidatedJson(value))
        })
    }
}

/// 带校验的查询参数提取器
#[derive(Debug)]
pub struct ValidatedQuery<T>(pub T);

impl<T> ValidatedQuery<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for ValidatedQuery<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> FromRequest for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate + 'static,
{
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = web::Query::<T>::from_request(req, payload);
        Box::pin(async move {
            let web::Query(value) = fut.await?;
            let value = validate_input(value)?;
            Ok(ValidatedQuery(value))
        })
    }
}
