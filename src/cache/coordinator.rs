//! # 缓存协调器
//!
//! 读穿透缓存与失效。失效采用粗粒度策略：任何一次写入都清空全部目录缓存，
//! 并显式删除倍率键。代数计数器保证清空前开始的加载不会把旧数据写回缓存。

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use super::abstract_cache::{CacheStats, CacheStore};
use super::keys::CacheKey;
use super::strategies::CacheTtl;
use crate::error::Result;
use crate::logging::{LogComponent, LogStage};
use crate::rates::RateScope;
use crate::{ldebug, linfo, lwarn};

/// 缓存协调器
pub struct CacheCoordinator {
    store: Arc<dyn CacheStore>,
    ttl: CacheTtl,
    generation: AtomicU64,
    /// 写缓存持读锁，清空持写锁
    gate: RwLock<()>,
}

impl std::fmt::Debug for CacheCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheCoordinator")
            .field("ttl", &self.ttl)
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl CacheCoordinator {
    #[must_use]
    pub fn new(store: Arc<dyn CacheStore>, ttl: CacheTtl) -> Self {
        Self {
            store,
            ttl,
            generation: AtomicU64::new(0),
            gate: RwLock::new(()),
        }
    }

    /// 当前缓存代数，每次清空加一
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// 读取缓存值，反序列化失败视为未命中
    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let key_str = key.build();
        let raw = match self.store.get(&key_str).await {
            Ok(raw) => raw?,
            Err(e) => {
                lwarn!(
                    "system",
                    LogStage::Cache,
                    LogComponent::Cache,
                    "cache_get_failed",
                    format!("读取缓存失败: {e}"),
                    key = %key_str
                );
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                lwarn!(
                    "system",
                    LogStage::Cache,
                    LogComponent::Cache,
                    "cache_decode_failed",
                    format!("缓存值无法反序列化，已删除: {e}"),
                    key = %key_str
                );
                let _ = self.store.delete(&key_str).await;
                None
            }
        }
    }

    /// 在指定代数仍然有效时写入缓存，返回是否写入
    pub async fn put_if_current<T: Serialize>(
        &self,
        key: &CacheKey,
        value: &T,
        generation: u64,
    ) -> bool {
        let key_str = key.build();
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                lwarn!(
                    "system",
                    LogStage::Cache,
                    LogComponent::Cache,
                    "cache_encode_failed",
                    format!("缓存值序列化失败: {e}"),
                    key = %key_str
                );
                return false;
            }
        };

        let _guard = self.gate.read().await;
        if self.generation() != generation {
            ldebug!(
                "system",
                LogStage::Cache,
                LogComponent::Cache,
                "cache_put_stale",
                "加载期间缓存已被清空，放弃写入",
                key = %key_str
            );
            return false;
        }

        match self.store.set(&key_str, raw, self.ttl.for_key(key)).await {
            Ok(()) => true,
            Err(e) => {
                lwarn!(
                    "system",
                    LogStage::Cache,
                    LogComponent::Cache,
                    "cache_set_failed",
                    format!("写入缓存失败: {e}"),
                    key = %key_str
                );
                false
            }
        }
    }

    /// 读穿透：命中直接返回，否则调用 `loader` 并回填
    pub async fn get_or_load<T, F, Fut>(&self, key: &CacheKey, loader: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        let generation = self.generation();
        let value = loader().await?;
        self.put_if_current(key, &value, generation).await;
        Ok(value)
    }

    /// 删除单个键
    pub async fn invalidate(&self, key: &CacheKey) -> Result<()> {
        self.store.delete(&key.build()).await
    }

    /// 价格数据变更后清空目录缓存和倍率缓存
    pub async fn invalidate_catalog(&self) -> Result<()> {
        let _guard = self.gate.write().await;
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;

        self.store.clear().await?;
        for scope in RateScope::ALL {
            self.store.delete(&scope.cache_key().build()).await?;
        }

        ldebug!(
            "system",
            LogStage::Cache,
            LogComponent::Cache,
            "invalidate_catalog",
            "价格数据已变更，目录缓存已清空",
            generation = generation
        );
        Ok(())
    }

    /// 写入成功后的失效，失败只记录日志
    pub async fn invalidate_after_write(&self, request_id: &str) {
        if let Err(e) = self.invalidate_catalog().await {
            lwarn!(
                request_id,
                LogStage::Cache,
                LogComponent::Cache,
                "invalidate_failed",
                format!("缓存失效失败: {e}")
            );
        }
    }

    pub async fn stats(&self) -> Result<CacheStats> {
        let stats = self.store.stats().await?;
        linfo!(
            "system",
            LogStage::Cache,
            LogComponent::Cache,
            "cache_stats",
            "缓存统计",
            entries = stats.entries,
            hit_rate = stats.hit_rate()
        );
        Ok(stats)
    }

    #[must_use]
    pub const fn ttl(&self) -> &CacheTtl {
        &self.ttl
    }
}
