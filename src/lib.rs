//! # Price Hub Library
//!
//! AI 模型价格聚合核心库：多数据源采集、待审核对账、审批与倍率计算

pub mod app;
pub mod approval;
pub mod audit;
pub mod auth;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod database;
pub mod error;
pub mod ingestion;
pub mod logging;
pub mod normalizer;
pub mod pricing;
pub mod rates;
pub mod reconcile;
pub mod sources;
pub mod testing;
pub mod types;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{HubError, Result};
