//! # 缓存预热
//!
//! 周期性重建热点键：首页（无筛选、按模型类型、按厂商）与两种倍率范围

use serde::Serialize;
use std::sync::Arc;

use crate::catalog::{CatalogService, PriceListQuery};
use crate::logging::{LogComponent, LogStage};
use crate::rates::{RateDerivationEngine, RateScope};
use crate::{linfo, lwarn};

/// 一次预热的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WarmReport {
    pub warmed: usize,
    pub failed: usize,
}

impl WarmReport {
    fn record<T>(&mut self, key: &str, result: crate::error::Result<T>) {
        match result {
            Ok(_) => self.warmed += 1,
            Err(e) => {
                self.failed += 1;
                lwarn!(
                    "cache_warmer",
                    LogStage::Cache,
                    LogComponent::Cache,
                    "warm_key_failed",
                    format!("预热失败: {e}"),
                    key = %key
                );
            }
        }
    }
}

/// 热点缓存预热器
#[derive(Debug, Clone)]
pub struct CacheWarmer {
    catalog: Arc<CatalogService>,
    rates: Arc<RateDerivationEngine>,
}

impl CacheWarmer {
    #[must_use]
    pub const fn new(catalog: Arc<CatalogService>, rates: Arc<RateDerivationEngine>) -> Self {
        Self { catalog, rates }
    }

    /// 预热全部热点键，单个键失败不影响其他键
    pub async fn warm(&self) -> WarmReport {
        let mut report = WarmReport::default();

        report.record(
            "prices:first_page",
            self.catalog.list_prices(&PriceListQuery::default()).await,
        );

        match self.catalog.list_model_types().await {
            Ok(types) => {
                report.warmed += 1;
                for model_type in types {
                    let query = PriceListQuery {
                        model_type: Some(model_type.type_key.clone()),
                        ..PriceListQuery::default()
                    };
                    report.record(&model_type.type_key, self.catalog.list_prices(&query).await);
                }
            }
            Err(e) => report.record::<()>("model_types", Err(e)),
        }

        match self.catalog.list_vendors().await {
            Ok(vendors) => {
                report.warmed += 1;
                for vendor in vendors {
                    let query = PriceListQuery {
                        channel_type: Some(vendor.id),
                        ..PriceListQuery::default()
                    };
                    report.record(&vendor.name, self.catalog.list_prices(&query).await);
                }
            }
            Err(e) => report.record::<()>("vendors", Err(e)),
        }

        for scope in RateScope::ALL {
            report.record(scope.as_str(), self.rates.derive_rates(scope).await);
        }

        linfo!(
            "cache_warmer",
            LogStage::Cache,
            LogComponent::Cache,
            "warm_complete",
            "缓存预热完成",
            warmed = report.warmed,
            failed = report.failed
        );
        report
    }
}
