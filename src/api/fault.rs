//! 故障翻译器
//!
//! 请求处理过程中抛出的所有故障，最终都在这里被转换成 [`Envelope`]。
//! 校验故障与业务声明的故障原样返回消息；未分类故障只把完整细节交给
//! 日志 sink，对外统一返回 [`SYSTEM_ERROR_MESSAGE`]。

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, OnceLock};

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use tracing::{debug, error};

use crate::errors::{AppError, FaultClass};

use super::response::{Envelope, SYSTEM_ERROR_MESSAGE};

/// 运维日志 sink，接收未分类故障的完整细节
///
/// 返回错误或发生 panic 都不会影响响应的渲染。
pub trait FaultSink: Send + Sync {
    fn record(&self, detail: &str) -> anyhow::Result<()>;
}

/// 默认 sink：写入 tracing
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingFaultSink;

impl FaultSink for TracingFaultSink {
    fn record(&self, detail: &str) -> anyhow::Result<()> {
        error!("Unclassified fault: {}", detail);
        Ok(())
    }
}

static GLOBAL_TRANSLATOR: OnceLock<FaultTranslator> = OnceLock::new();

#[derive(Clone)]
pub struct FaultTranslator {
    sink: Arc<dyn FaultSink>,
}

impl Default for FaultTranslator {
    fn default() -> Self {
        Self::new(Arc::new(TracingFaultSink))
    }
}

impl FaultTranslator {
    pub fn new(sink: Arc<dyn FaultSink>) -> Self {
        Self { sink }
    }

    /// 安装进程级翻译器，供 `ResponseError` 渲染使用
    ///
    /// 只有第一次安装生效，返回是否安装成功。
    pub fn install(self) -> bool {
        GLOBAL_TRANSLATOR.set(self).is_ok()
    }

    /// 获取进程级翻译器，未安装时使用写入 tracing 的默认实现
    pub fn global() -> &'static FaultTranslator {
        GLOBAL_TRANSLATOR.get_or_init(FaultTranslator::default)
    }

    /// 将故障转换为失败信封
    pub fn translate(&self, err: &AppError) -> Envelope<()> {
        match err.fault_class() {
            FaultClass::Validation | FaultClass::Declared => {
                debug!("Declared fault rendered: {}", err.format_simple());
                Envelope::failure(err.message())
            }
            FaultClass::Unclassified => {
                self.report(err);
                Envelope::failure(SYSTEM_ERROR_MESSAGE)
            }
        }
    }

    /// 渲染完整 HTTP 响应
    pub fn render(&self, err: &AppError) -> HttpResponse {
        HttpResponse::build(http_status(err))
            .append_header(("Content-Type", "application/json; charset=utf-8"))
            .json(self.translate(err))
    }

    fn report(&self, err: &AppError) {
        let detail = format!("[{}] {}", err.code(), err.format_simple());
        let sink = &self.sink;

        // sink 的失败被吞掉，翻译器自身永不失败
        match catch_unwind(AssertUnwindSafe(|| sink.record(&detail))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!("Fault sink rejected record: {}", e),
            Err(_) => debug!("Fault sink panicked while recording"),
        }
    }
}

/// 故障对应的 HTTP 状态码
///
/// 信封里的 `code` 始终为 500，HTTP 状态码只用于区分故障类别。
pub fn http_status(err: &AppError) -> StatusCode {
    match err {
        AppError::Validation(_) => StatusCode::BAD_REQUEST,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::Business(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        http_status(self)
    }

    fn error_response(&self) -> HttpResponse {
        FaultTranslator::global().render(self)
    }
}

/// JSON 请求体解析失败
pub fn json_error_handler(
    err: actix_web::error::JsonPayloadError,
    _req: &HttpRequest,
) -> actix_web::Error {
    AppError::validation(format!("请求体格式错误: {}", err)).into()
}

/// 查询参数解析失败
pub fn query_error_handler(
    err: actix_web::error::QueryPayloadError,
    _req: &HttpRequest,
) -> actix_web::Error {
    AppError::validation(format!("查询参数格式错误: {}", err)).into()
}

/// 路径参数解析失败
pub fn path_error_handler(
    err: actix_web::error::PathError,
    _req: &HttpRequest,
) -> actix_web::Error {
    AppError::validation(format!("路径参数格式错误: {}", err)).into()
}

/// 未匹配任何路由
pub async fn not_found_handler() -> Result<HttpResponse, AppError> {
    Err(AppError::not_found("接口不存在"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;

    use crate::api::response::FAILURE_CODE;

    #[derive(Default)]
    struct RecordingSink {
        records: Mutex<Vec<String>>,
    }

    impl FaultSink for RecordingSink {
        fn record(&self, detail: &str) -> anyhow::Result<()> {
            self.records.lock().push(detail.to_string());
            Ok(())
        }
    }

    struct FailingSink {
        calls: AtomicUsize,
    }

    impl FaultSink for FailingSink {
        fn record(&self, _detail: &str) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("log disk full")
        }
    }

    struct PanickingSink;

    impl FaultSink for PanickingSink {
        fn record(&self, _detail: &str) -> anyhow::Result<()> {
            panic!("sink exploded")
        }
    }

    #[test]
    fn test_declared_fault_message_is_rendered_verbatim() {
        let sink = Arc::new(RecordingSink::default());
        let translator = FaultTranslator::new(sink.clone());

        let envelope = translator.translate(&AppError::not_found("用户不存在"));
        assert_eq!(envelope.code(), FAILURE_CODE);
        assert_eq!(envelope.message(), "用户不存在");
        assert!(envelope.data().is_none());
        assert!(sink.records.lock().is_empty());
    }

    #[test]
    fn test_validation_fault_message_is_rendered_verbatim() {
        let translator = FaultTranslator::new(Arc::new(RecordingSink::default()));
        let envelope = translator.translate(&AppError::validation("email must not be blank"));
        assert_eq!(envelope.message(), "email must not be blank");
    }

    #[test]
    fn test_unclassified_fault_hides_detail_and_logs_once() {
        let sink = Arc::new(RecordingSink::default());
        let translator = FaultTranslator::new(sink.clone());
        let err = AppError::database_operation(
            "SELECT * FROM users WHERE email = 'a@b.c': no such table: users",
        );

        let envelope = translator.translate(&err);
        assert_eq!(envelope.code(), FAILURE_CODE);
        assert_eq!(envelope.message(), SYSTEM_ERROR_MESSAGE);
        assert!(!envelope.message().contains("SELECT"));
        assert!(!envelope.message().contains("users"));

        let records = sink.records.lock();
        assert_eq!(records.len(), 1);
        assert!(records[0].contains("no such table: users"));
    }

    #[test]
    fn test_failing_sink_is_swallowed() {
        let sink = Arc::new(FailingSink {
            calls: AtomicUsize::new(0),
        });
        let translator = FaultTranslator::new(sink.clone());

        let envelope = translator.translate(&AppError::internal("boom"));
        assert_eq!(envelope.message(), SYSTEM_ERROR_MESSAGE);
        assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_sink_is_swallowed() {
        let translator = FaultTranslator::new(Arc::new(PanickingSink));
        let envelope = translator.translate(&AppError::internal("boom"));
        assert_eq!(envelope.message(), SYSTEM_ERROR_MESSAGE);
    }

    #[test]
    fn test_release_profile_unwinds_on_panic() {
        // abort 会让 catch_unwind 失效
        let manifest: toml::Table = toml::from_str(include_str!("../../Cargo.toml")).unwrap();
        for profile in ["dev", "release"] {
            let strategy = manifest
                .get("profile")
                .and_then(|p| p.get(profile))
                .and_then(|p| p.get("panic"))
                .and_then(|v| v.as_str());
            assert_ne!(strategy, Some("abort"), "profile.{}", profile);
        }
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(
            http_status(&AppError::validation("x")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(http_status(&AppError::not_found("x")), StatusCode::NOT_FOUND);
        assert_eq!(http_status(&AppError::business("x")), StatusCode::BAD_REQUEST);
        assert_eq!(
            http_status(&AppError::database_connection("x")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_render_sets_status() {
        let translator = FaultTranslator::new(Arc::new(RecordingSink::default()));
        let response = translator.render(&AppError::not_found("用户不存在"));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
