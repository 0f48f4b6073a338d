//! # 缓存策略
//!
//! 不同类型数据的 TTL

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::keys::CacheKey;
use crate::config::CacheConfig;

/// 缓存 TTL 策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheTtl {
    /// 价格列表与单条记录
    pub listing: Duration,
    /// 厂商、模型类型
    pub reference: Duration,
    /// 倍率结果
    pub rates: Duration,
}

impl Default for CacheTtl {
    fn default() -> Self {
        Self {
            listing: Duration::from_secs(300),
            reference: Duration::from_secs(1800),
            rates: Duration::from_secs(86_400),
        }
    }
}

impl CacheTtl {
    #[must_use]
    pub const fn from_config(config: &CacheConfig) -> Self {
        Self {
            listing: Duration::from_secs(config.listing_ttl),
            reference: Duration::from_secs(config.reference_ttl),
            rates: Duration::from_secs(config.rates_ttl),
        }
    }

    /// 根据缓存键选择 TTL
    #[must_use]
    pub const fn for_key(&self, key: &CacheKey) -> Duration {
        match key {
            CacheKey::PriceList { .. } | CacheKey::PriceRecord { .. } => self.listing,
            CacheKey::Vendors | CacheKey::ModelTypes => self.reference,
            CacheKey::Rates { .. } => self.rates,
        }
    }
}
