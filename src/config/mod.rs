//! # 配置管理模块
//!
//! 处理应用配置加载、验证和管理

mod app_config;
mod database;
mod manager;

pub use app_config::{
    AggregatorSourceConfig, AppConfig, AuditConfig, CacheConfig, ChannelListingSourceConfig,
    IngestionConfig, OfficialPageSourceConfig, RatesConfig, SecondarySourceConfig, SourcesConfig,
};
pub use database::DatabaseConfig;
pub use manager::ConfigManager;
