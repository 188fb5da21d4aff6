//! 统一响应结构
//!
//! 所有接口，无论成功还是失败，都返回同一形状的 [`Envelope`]：
//!
//! ```json
//! { "code": 200, "message": "成功", "data": { ... } }
//! { "code": 500, "message": "用户不存在", "data": null }
//! ```

use serde::Serialize;
use tracing::warn;

/// 成功状态码
pub const SUCCESS_CODE: i32 = 200;
/// 通用失败状态码
pub const FAILURE_CODE: i32 = 500;
/// 请求过于频繁
pub const TOO_MANY_REQUESTS_CODE: i32 = 429;

/// 成功时的固定消息
pub const SUCCESS_MESSAGE: &str = "成功";
/// 失败消息为空时的兜底文案
pub const FALLBACK_FAILURE_MESSAGE: &str = "操作失败";
/// 未分类故障对外展示的统一文案，不包含任何内部细节
pub const SYSTEM_ERROR_MESSAGE: &str = "系统异常，请稍后重试";

/// 统一响应信封
///
/// 每个请求构造一次，构造后不可变。成功时 `data` 必有值，
/// 失败时 `data` 为 `null` 且 `message` 非空。
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Envelope<T> {
    code: i32,
    message: String,
    data: Option<T>,
}

impl<T> Envelope<T> {
    /// 构建成功响应
    pub fn success(data: T) -> Self {
        Self {
            code: SUCCESS_CODE,
            message: SUCCESS_MESSAGE.to_string(),
            data: Some(data),
        }
    }

    /// 构建失败响应（code = 500）
    pub fn failure(message: impl Into<String>) -> Self {
        Self::failure_with_code(FAILURE_CODE, message)
    }

    /// 构建带自定义状态码的失败响应
    ///
    /// `code` 不能是成功码，否则退化为通用失败码。
    pub fn failure_with_code(code: i32, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            FALLBACK_FAILURE_MESSAGE.to_string()
        } else {
            message
        };
        let code = if code == SUCCESS_CODE {
            FAILURE_CODE
        } else {
            code
        };

        Self {
            code,
            message,
            data: None,
        }
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }
}

/// 分页结果
///
/// `total` 是满足过滤条件的全部记录数，而不仅是当前页。
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct PagedResult<T> {
    records: Vec<T>,
    total: u64,
}

impl<T> PagedResult<T> {
    /// 构建分页结果，保证 `records.len() <= total`
    ///
    /// 计数查询与数据查询不在同一快照时，total 可能比当前页还小，
    /// 此时以当前页长度为准。
    pub fn new(records: Vec<T>, total: u64) -> Self {
        let len = records.len() as u64;
        let total = if total < len {
            warn!(
                "Paged result total ({}) smaller than page length ({}), raising total",
                total, len
            );
            len
        } else {
            total
        };
        Self { records, total }
    }

    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            total: 0,
        }
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn into_records(self) -> Vec<T> {
        self.records
    }

    /// 逐条转换记录（实体 -> DTO），total 保持不变
    pub fn map<U, F>(self, f: F) -> PagedResult<U>
    where
        F: FnMut(T) -> U,
    {
        PagedResult {
            records: self.records.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope() {
        let envelope = Envelope::success(vec![1, 2, 3]);
        assert_eq!(envelope.code(), 200);
        assert_eq!(envelope.message(), "成功");
        assert_eq!(envelope.data(), Some(&vec![1, 2, 3]));
        assert!(envelope.is_success());
    }

    #[test]
    fn test_success_envelope_keeps_payload_for_various_types() {
        assert_eq!(Envelope::success("text").into_data(), Some("text"));
        assert_eq!(Envelope::success(0u64).into_data(), Some(0));
        assert_eq!(Envelope::success(()).code(), SUCCESS_CODE);
    }

    #[test]
    fn test_failure_envelope() {
        let envelope = Envelope::<String>::failure("用户不存在");
        assert_eq!(envelope.code(), 500);
        assert_eq!(envelope.message(), "用户不存在");
        assert!(envelope.data().is_none());
        assert!(!envelope.is_success());
    }

    #[test]
    fn test_failure_with_empty_message_uses_fallback() {
        let envelope = Envelope::<()>::failure("");
        assert_eq!(envelope.message(), FALLBACK_FAILURE_MESSAGE);

        let envelope = Envelope::<()>::failure("   ");
        assert_eq!(envelope.message(), FALLBACK_FAILURE_MESSAGE);
    }

    #[test]
    fn test_failure_with_code_never_reports_success() {
        let envelope = Envelope::<()>::failure_with_code(SUCCESS_CODE, "oops");
        assert_eq!(envelope.code(), FAILURE_CODE);

        let envelope = Envelope::<()>::failure_with_code(TOO_MANY_REQUESTS_CODE, "slow down");
        assert_eq!(envelope.code(), 429);
    }

    #[test]
    fn test_failure_serializes_null_data() {
        let value = serde_json::to_value(Envelope::<u32>::failure("bad")).unwrap();
        assert_eq!(value, json!({"code": 500, "message": "bad", "data": null}));
    }

    #[test]
    fn test_paged_result_serialization() {
        let page = PagedResult::new(vec!["a", "b"], 25);
        let value = serde_json::to_value(Envelope::success(page)).unwrap();
        assert_eq!(
            value,
            json!({"code": 200, "message": "成功", "data": {"records": ["a", "b"], "total": 25}})
        );
    }

    #[test]
    fn test_paged_result_total_never_below_records() {
        let page = PagedResult::new(vec![1, 2, 3], 1);
        assert_eq!(page.total(), 3);
        assert!(page.records().len() as u64 <= page.total());
    }

    #[test]
    fn test_paged_result_beyond_range_keeps_total() {
        let page: PagedResult<i32> = PagedResult::new(Vec::new(), 25);
        assert!(page.records().is_empty());
        assert_eq!(page.total(), 25);
    }

    #[test]
    fn test_paged_result_map() {
        let page = PagedResult::new(vec![1, 2], 10).map(|n| n.to_string());
        assert_eq!(page.records(), &["1".to_string(), "2".to_string()]);
        assert_eq!(page.total(), 10);
    }

    #[test]
    fn test_paged_result_empty() {
        let page: PagedResult<()> = PagedResult::empty();
        assert_eq!(page.total(), 0);
        assert!(page.into_records().is_empty());
    }
}
