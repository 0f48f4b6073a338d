//! # 价格倍率
//!
//! 把已通过记录的绝对价格换算为倍率：美元除以 2，其余币种除以 14，保留 4 位小数。
//! 扩展维度相对输入或输出倍率计算。同名模型（忽略大小写）只保留倍率之和更高的一条。

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use entity::{PriceRecords, price_records};

use crate::cache::{CacheCoordinator, CacheKey};
use crate::error::Result;
use crate::linfo;
use crate::logging::{LogComponent, LogStage};
use crate::pricing::{PriceDimension, round_to};
use crate::types::{CURRENCY_USD, ChannelId, RecordStatus};

/// 美元价格的换算除数
pub const USD_DIVISOR: f64 = 2.0;
/// 其他币种的换算除数
pub const DEFAULT_DIVISOR: f64 = 14.0;
/// 基准倍率低于该值时扩展倍率记为 1
const MIN_BASE_RATIO: f64 = 1e-7;

/// 倍率范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateScope {
    /// 全部已通过记录
    All,
    /// 仅官方厂商渠道
    Official,
}

impl RateScope {
    pub const ALL: [Self; 2] = [Self::All, Self::Official];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Official => "official",
        }
    }

    #[must_use]
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::Rates {
            scope: self.as_str().to_string(),
        }
    }
}

/// 一条倍率
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    pub model: String,
    /// 计费方式
    #[serde(rename = "type")]
    pub kind: String,
    pub channel_type: ChannelId,
    pub input: f64,
    pub output: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_ratios: Option<BTreeMap<String, f64>>,
}

/// 币种对应的除数
#[must_use]
pub fn divisor(currency: &str) -> f64 {
    if currency == CURRENCY_USD {
        USD_DIVISOR
    } else {
        DEFAULT_DIVISOR
    }
}

fn safe_ratio(value: f64, base: f64) -> f64 {
    if base < MIN_BASE_RATIO {
        1.0
    } else {
        round_to(value / base, 4)
    }
}

/// 单条记录的倍率
#[must_use]
pub fn rate_for(record: &price_records::Model) -> RateEntry {
    let divisor = divisor(&record.currency);
    let input = round_to(record.input_price / divisor, 4);
    let output = round_to(record.output_price / divisor, 4);

    let extra: BTreeMap<String, f64> = PriceDimension::ALL
        .into_iter()
        .filter_map(|dimension| {
            let value = dimension.confirmed(record)?;
            let normalized = round_to(value / divisor, 4);
            let base = if dimension.is_relative_to_input() {
                input
            } else {
                output
            };
            Some((dimension.as_str().to_string(), safe_ratio(normalized, base)))
        })
        .collect();

    RateEntry {
        model: record.model.clone(),
        kind: record.billing_type.clone(),
        channel_type: record.channel_type,
        input,
        output,
        extra_ratios: (!extra.is_empty()).then_some(extra),
    }
}

/// 计算倍率列表：同名去重、按小写模型名排序
#[must_use]
pub fn derive_entries(records: &[price_records::Model]) -> Vec<RateEntry> {
    let mut entries: Vec<RateEntry> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let rate = rate_for(record);
        let name = rate.model.to_lowercase();
        match index.get(&name) {
            Some(&slot) => {
                let existing = &entries[slot];
                if rate.input + rate.output > existing.input + existing.output {
                    entries[slot] = rate;
                }
            }
            None => {
                index.insert(name, entries.len());
                entries.push(rate);
            }
        }
    }

    entries.sort_by_cached_key(|entry| entry.model.to_lowercase());
    entries
}

/// 倍率计算引擎，结果按范围缓存
#[derive(Debug, Clone)]
pub struct RateDerivationEngine {
    db: Arc<DatabaseConnection>,
    cache: Arc<CacheCoordinator>,
    official_threshold: ChannelId,
}

impl RateDerivationEngine {
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        cache: Arc<CacheCoordinator>,
        official_threshold: ChannelId,
    ) -> Self {
        Self {
            db,
            cache,
            official_threshold,
        }
    }

    /// 获取倍率（读穿透缓存）
    pub async fn derive_rates(&self, scope: RateScope) -> Result<Vec<RateEntry>> {
        self.cache
            .get_or_load(&scope.cache_key(), || self.compute(scope))
            .await
    }

    async fn compute(&self, scope: RateScope) -> Result<Vec<RateEntry>> {
        let mut query = PriceRecords::find()
            .filter(price_records::Column::Status.eq(RecordStatus::Approved.as_str()));
        if scope == RateScope::Official {
            query = query.filter(price_records::Column::ChannelType.lt(self.official_threshold));
        }
        let records = query
            .order_by_asc(price_records::Column::Id)
            .all(self.db.as_ref())
            .await?;

        let entries = derive_entries(&records);
        linfo!(
            "rates",
            LogStage::RateDerivation,
            LogComponent::Rates,
            "derive_rates",
            "倍率已重新计算",
            scope = scope.as_str(),
            records = records.len(),
            entries = entries.len()
        );
        Ok(entries)
    }
}
