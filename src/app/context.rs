//! 应用上下文（DI 容器）
//!
//! 统一持有跨模块共享的服务实例，便于在测试中注入替身实现。

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::approval::ApprovalWorkflow;
use crate::audit::{LogNotificationSink, NotificationSink, PendingAuditService};
use crate::auth::Actor;
use crate::cache::{CacheCoordinator, CacheStore, CacheTtl, CacheWarmer, MokaCacheStore};
use crate::catalog::CatalogService;
use crate::config::AppConfig;
use crate::error::Result;
use crate::ingestion::IngestionCycle;
use crate::normalizer::Normalizer;
use crate::rates::RateDerivationEngine;
use crate::reconcile::ReconciliationEngine;
use crate::sources::build_adapters;

#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub db: Arc<DatabaseConnection>,
    pub cache: Arc<CacheCoordinator>,
    pub reconciler: Arc<ReconciliationEngine>,
    pub approval: Arc<ApprovalWorkflow>,
    pub catalog: Arc<CatalogService>,
    pub rates: Arc<RateDerivationEngine>,
    pub warmer: Arc<CacheWarmer>,
    pub ingestion: Arc<IngestionCycle>,
    pub audit: Arc<PendingAuditService>,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("ingestion", &self.ingestion)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// 使用默认的内存缓存与日志通知端组装
    pub fn build(config: AppConfig, db: Arc<DatabaseConnection>) -> Result<Self> {
        let store: Arc<dyn CacheStore> =
            Arc::new(MokaCacheStore::new(config.cache.memory_max_entries));
        Self::with_parts(config, db, store, Arc::new(LogNotificationSink))
    }

    /// 注入缓存存储与通知端
    pub fn with_parts(
        config: AppConfig,
        db: Arc<DatabaseConnection>,
        store: Arc<dyn CacheStore>,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<Self> {
        let cache = Arc::new(CacheCoordinator::new(
            store,
            CacheTtl::from_config(&config.cache),
        ));

        let reconciler = Arc::new(ReconciliationEngine::new(db.clone(), cache.clone()));
        let approval = Arc::new(ApprovalWorkflow::new(db.clone(), cache.clone()));
        let catalog = Arc::new(CatalogService::new(db.clone(), cache.clone()));
        let rates = Arc::new(RateDerivationEngine::new(
            db.clone(),
            cache.clone(),
            config.rates.official_channel_threshold,
        ));
        let warmer = Arc::new(CacheWarmer::new(catalog.clone(), rates.clone()));

        let normalizer = Arc::new(Normalizer::new()?);
        let adapters = build_adapters(&config.sources, &config.ingestion, normalizer)?;
        let ingestion = Arc::new(IngestionCycle::new(
            adapters,
            reconciler.clone(),
            Actor::system(config.ingestion.actor.clone()),
            config.ingestion.inter_adapter_delay(),
        ));
        let audit = Arc::new(PendingAuditService::new(db.clone(), sink, &config.audit));

        Ok(Self {
            config: Arc::new(config),
            db,
            cache,
            reconciler,
            approval,
            catalog,
            rates,
            warmer,
            ingestion,
            audit,
        })
    }
}
