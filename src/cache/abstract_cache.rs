//! # 缓存抽象层
//!
//! 缓存存储以 trait 注入，默认实现基于 `moka::future::Cache`，
//! 每个条目携带自己的 TTL。

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::error::Result;

/// 缓存存储接口，值为序列化后的 JSON 文本
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// 读取缓存值
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// 写入缓存值并设置过期时间
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    /// 删除单个键
    async fn delete(&self, key: &str) -> Result<()>;

    /// 清空全部缓存
    async fn clear(&self) -> Result<()>;

    /// 统计信息
    async fn stats(&self) -> Result<CacheStats>;
}

/// 缓存统计信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: u64,
    pub hit_count: u64,
    pub miss_count: u64,
    pub store_type: &'static str,
}

impl CacheStats {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Arc<str>,
    ttl: Duration,
}

/// 按条目自身 TTL 过期
struct EntryExpiry;

impl Expiry<String, CacheEntry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// 基于 moka 的内存缓存
pub struct MokaCacheStore {
    cache: Cache<String, CacheEntry>,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl MokaCacheStore {
    #[must_use]
    pub fn new(max_entries: u64) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(max_entries)
                .expire_after(EntryExpiry)
                .build(),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        }
    }
}

impl std::fmt::Debug for MokaCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaCacheStore")
            .field("entries", &self.cache.entry_count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CacheStore for MokaCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entry = self.cache.get(key).await;
        if entry.is_some() {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.miss_count.fetch_add(1, Ordering::Relaxed);
        }
        Ok(entry.map(|e| e.value.to_string()))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let entry = CacheEntry {
            value: Arc::from(value),
            ttl,
        };
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats> {
        self.cache.run_pending_tasks().await;
        Ok(CacheStats {
            entries: self.cache.entry_count(),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
            store_type: "moka",
        })
    }
}
