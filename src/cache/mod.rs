//! # 缓存模块
//!
//! 可注入的缓存存储、缓存键、TTL 策略、读穿透协调器与热点预热

pub mod abstract_cache;
pub mod coordinator;
pub mod keys;
pub mod strategies;
pub mod warmer;

pub use abstract_cache::{CacheStats, CacheStore, MokaCacheStore};
pub use coordinator::CacheCoordinator;
pub use keys::CacheKey;
pub use strategies::CacheTtl;
pub use warmer::{CacheWarmer, WarmReport};
