//! 集成测试公共工具

#![allow(dead_code)]

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use price_hub::auth::{Actor, PermissionLevel};
use price_hub::cache::{CacheCoordinator, CacheTtl, MokaCacheStore};
use price_hub::config::DatabaseConfig;
use price_hub::database::{init_database, run_migrations};
use price_hub::pricing::{ExtendedPrices, PriceCandidate};
use price_hub::types::{BillingType, CURRENCY_USD, ChannelId, ModelType};

/// 内存数据库，已执行迁移
pub async fn setup_db() -> Arc<DatabaseConnection> {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        ..DatabaseConfig::default()
    };
    let db = init_database(&config).await.expect("数据库连接失败");
    run_migrations(&db).await.expect("数据库迁移失败");
    Arc::new(db)
}

pub fn setup_cache() -> Arc<CacheCoordinator> {
    Arc::new(CacheCoordinator::new(
        Arc::new(MokaCacheStore::new(1_000)),
        CacheTtl::default(),
    ))
}

pub fn candidate(channel: ChannelId, model: &str, input: f64, output: f64) -> PriceCandidate {
    PriceCandidate {
        model: model.to_string(),
        model_type: ModelType::Text2Text,
        billing_type: BillingType::Tokens,
        channel_type: channel,
        currency: CURRENCY_USD.to_string(),
        input_price: input,
        output_price: output,
        price_source: "官网".to_string(),
        extended: ExtendedPrices::new(),
    }
}

pub fn crawler() -> Actor {
    Actor::system("cron自动任务")
}

pub fn moderator() -> Actor {
    Actor::new("moderator", PermissionLevel::MODERATOR)
}

pub fn contributor() -> Actor {
    Actor::from_groups("contributor", "t1")
}
