//! # 目录查询与缓存失效集成测试

mod common;

use pretty_assertions::assert_eq;
use std::sync::Arc;

use common::{candidate, crawler, setup_cache, setup_db};
use price_hub::cache::{CacheKey, CacheWarmer};
use price_hub::catalog::{CatalogService, PriceListQuery};
use price_hub::rates::{RateDerivationEngine, RateScope};
use price_hub::reconcile::ReconciliationEngine;
use price_hub::types::TrustLevel;

#[tokio::test]
async fn test_listing_is_refreshed_after_write() {
    let db = setup_db().await;
    let cache = setup_cache();
    let catalog = CatalogService::new(db.clone(), cache.clone());
    let engine = ReconciliationEngine::new(db.clone(), cache.clone());

    let empty = catalog.list_prices(&PriceListQuery::default()).await.unwrap();
    assert_eq!(empty.pagination.total, 0);

    engine
        .reconcile(&candidate(1, "gpt-5", 1.25, 10.0), TrustLevel::Trusted, &crawler())
        .await
        .unwrap();

    let page = catalog.list_prices(&PriceListQuery::default()).await.unwrap();
    assert_eq!(page.pagination.total, 1);
    assert_eq!(page.items[0].model, "gpt-5");
}

#[tokio::test]
async fn test_pending_filters_use_proposed_values() {
    let db = setup_db().await;
    let cache = setup_cache();
    let catalog = CatalogService::new(db.clone(), cache.clone());
    let engine = ReconciliationEngine::new(db.clone(), cache);

    engine
        .reconcile(&candidate(14, "claude-haiku-4-5", 1.0, 5.0), TrustLevel::Untrusted, &crawler())
        .await
        .unwrap();

    let by_vendor = catalog
        .list_prices(&PriceListQuery {
            channel_type: Some(14),
            status: Some("pending".to_string()),
            ..PriceListQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(by_vendor.pagination.total, 1);

    let by_type = catalog
        .list_prices(&PriceListQuery {
            model_type: Some("text2text".to_string()),
            ..PriceListQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(by_type.pagination.total, 1);
}

#[tokio::test]
async fn test_warmer_then_write_clears_rates() {
    let db = setup_db().await;
    let cache = setup_cache();
    let catalog = Arc::new(CatalogService::new(db.clone(), cache.clone()));
    let rates = Arc::new(RateDerivationEngine::new(db.clone(), cache.clone(), 1000));
    let engine = ReconciliationEngine::new(db.clone(), cache.clone());

    let report = CacheWarmer::new(catalog, rates.clone()).warm().await;
    assert_eq!(report.failed, 0);
    assert!(cache.get::<serde_json::Value>(&RateScope::All.cache_key()).await.is_some());

    engine
        .reconcile(&candidate(25, "gemini-2.5-pro", 1.25, 10.0), TrustLevel::Trusted, &crawler())
        .await
        .unwrap();

    assert!(cache.get::<serde_json::Value>(&RateScope::All.cache_key()).await.is_none());
    assert!(cache.get::<serde_json::Value>(&CacheKey::Vendors).await.is_none());
    assert_eq!(rates.derive_rates(RateScope::All).await.unwrap().len(), 1);
}
