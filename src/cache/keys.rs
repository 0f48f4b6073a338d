//! # 缓存键命名规范

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::ChannelId;

/// 缓存键类型
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheKey {
    /// 价格列表分页 - `catalog:prices:{page}:{page_size}:{channel}:{model_type}:{status}`
    PriceList {
        page: u64,
        page_size: u64,
        channel_type: Option<ChannelId>,
        model_type: Option<String>,
        status: Option<String>,
    },

    /// 单条价格记录 - `catalog:price:{id}`
    PriceRecord { id: i32 },

    /// 厂商列表 - `catalog:vendors`
    Vendors,

    /// 模型类型列表 - `catalog:model_types`
    ModelTypes,

    /// 倍率结果 - `rates:{scope}`
    Rates { scope: String },
}

fn or_all<T: fmt::Display>(value: Option<&T>) -> String {
    value.map_or_else(|| "all".to_string(), ToString::to_string)
}

impl CacheKey {
    /// 生成缓存键字符串
    #[must_use]
    pub fn build(&self) -> String {
        match self {
            Self::PriceList {
                page,
                page_size,
                channel_type,
                model_type,
                status,
            } => format!(
                "catalog:prices:{page}:{page_size}:{}:{}:{}",
                or_all(channel_type.as_ref()),
                or_all(model_type.as_ref()),
                or_all(status.as_ref()),
            ),
            Self::PriceRecord { id } => format!("catalog:price:{id}"),
            Self::Vendors => "catalog:vendors".to_string(),
            Self::ModelTypes => "catalog:model_types".to_string(),
            Self::Rates { scope } => format!("rates:{scope}"),
        }
    }

    /// 缓存键的命名空间
    #[must_use]
    pub const fn namespace(&self) -> &'static str {
        match self {
            Self::PriceList { .. } | Self::PriceRecord { .. } | Self::Vendors | Self::ModelTypes => {
                "catalog"
            }
            Self::Rates { .. } => "rates",
        }
    }

    /// 是否为参考数据（变化极少）
    #[must_use]
    pub const fn is_reference(&self) -> bool {
        matches!(self, Self::Vendors | Self::ModelTypes)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.build())
    }
}
