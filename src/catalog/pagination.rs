use serde::{Deserialize, Serialize};

/// 默认每页条数
pub const DEFAULT_PAGE_SIZE: u64 = 20;
/// 每页条数上限
pub const MAX_PAGE_SIZE: u64 = 100;
/// 偏移量上限，SQLite 绑定参数为有符号 64 位
const MAX_OFFSET: u64 = i64::MAX.unsigned_abs();

/// 分页参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationParams {
    /// 当前页码（>= 1）
    pub page: u64,
    /// 每页条数（1..=MAX_PAGE_SIZE）
    pub page_size: u64,
}

impl PaginationParams {
    /// 根据可选参数创建分页配置，并应用默认值与上限
    #[must_use]
    pub fn new(page: Option<u64>, page_size: Option<u64>) -> Self {
        let page = page.unwrap_or(1).max(1);
        let page_size = page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        Self { page, page_size }
    }

    #[must_use]
    pub const fn offset(&self) -> u64 {
        let offset = self.page.saturating_sub(1).saturating_mul(self.page_size);
        if offset > MAX_OFFSET { MAX_OFFSET } else { offset }
    }
}

/// 标准分页信息
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationInfo {
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub pages: u64,
}

/// 根据总数和分页参数计算分页信息
#[must_use]
pub const fn build_page(total: u64, params: PaginationParams) -> PaginationInfo {
    let pages = if total == 0 {
        0
    } else {
        total.div_ceil(params.page_size)
    };
    PaginationInfo {
        page: params.page,
        page_size: params.page_size,
        total,
        pages,
    }
}
