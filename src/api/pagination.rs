//! 分页组装
//!
//! 页码从 1 开始。page/size 非正数直接判为参数错误，不做静默修正；
//! size 超过上限同样拒绝。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::errors::{AppError, Result};

use super::response::PagedResult;

/// 单页条数的硬上限，防止无界结果集
pub const HARD_MAX_PAGE_SIZE: u64 = 500;
/// 未指定 size 时的默认值
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// 经过校验的分页请求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    size: u64,
}

impl PageRequest {
    /// 校验并构建分页请求
    ///
    /// `max_size` 会被限制在 [`HARD_MAX_PAGE_SIZE`] 以内。
    pub fn new(page: i64, size: i64, max_size: u64) -> Result<Self> {
        if page <= 0 {
            return Err(AppError::validation("page must be greater than 0"));
        }
        if size <= 0 {
            return Err(AppError::validation("size must be greater than 0"));
        }

        let max_size = max_size.clamp(1, HARD_MAX_PAGE_SIZE);
        let size = size as u64;
        if size > max_size {
            return Err(AppError::validation(format!(
                "size must not exceed {}",
                max_size
            )));
        }

        Ok(Self {
            page: page as u64,
            size,
        })
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// 起始偏移量 `(page - 1) * size`
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.size)
    }

    pub fn limit(&self) -> u64 {
        self.size
    }
}

/// 分页查询参数
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
}

impl PageQuery {
    /// 补齐默认值并校验
    pub fn to_request(&self, default_size: u64, max_size: u64) -> Result<PageRequest> {
        let page = self.page.unwrap_or(1);
        let size = self
            .size
            .unwrap_or_else(|| default_size.min(HARD_MAX_PAGE_SIZE) as i64);
        PageRequest::new(page, size, max_size)
    }
}

/// 分页数据源（存储/查询层协作者）
#[async_trait]
pub trait PageSource<T, F>: Send + Sync
where
    T: Send,
    F: Sync,
{
    /// 按过滤条件取出最多 `limit` 条，从 `offset` 开始
    async fn fetch(&self, filter: &F, offset: u64, limit: u64) -> Result<Vec<T>>;

    /// 满足过滤条件的总数，与分页无关
    async fn count(&self, filter: &F) -> Result<u64>;
}

/// 执行有界查询 + 计数查询并组装分页结果
pub async fn assemble_page<T, F, S>(
    source: &S,
    filter: &F,
    request: &PageRequest,
) -> Result<PagedResult<T>>
where
    T: Send,
    F: Sync,
    S: PageSource<T, F> + ?Sized,
{
    let total = source.count(filter).await?;
    let mut records = if request.offset() >= total {
        Vec::new()
    } else {
        source.fetch(filter, request.offset(), request.limit()).await?
    };
    records.truncate(request.limit() as usize);

    trace!(
        "Assembled page {} (size {}): {} records, total {}",
        request.page(),
        request.size(),
        records.len(),
        total
    );

    Ok(PagedResult::new(records, total))
}
