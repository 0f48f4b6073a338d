//! # 价格采集
//!
//! 一轮采集按顺序执行所有数据源，数据源之间固定间隔。单个数据源失败只记录日志，
//! 不影响后续数据源；每条观测交给对账引擎处理。

pub mod status;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::Actor;
use crate::error::{HubError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::reconcile::{ReconcileAction, ReconciliationEngine};
use crate::sources::{SourceAdapter, SourceBatch};
use crate::{ldebug, lerror, linfo, lwarn};

pub use status::{SourceRunStatus, SourceStatusRegistry};

/// 各对账动作的计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActionCounts {
    pub created: usize,
    pub submitted: usize,
    pub updated: usize,
    pub proposed: usize,
    pub unchanged: usize,
    pub duplicate_in_flight: usize,
}

impl ActionCounts {
    pub fn add(&mut self, action: ReconcileAction) {
        let slot = match action {
            ReconcileAction::Created => &mut self.created,
            ReconcileAction::Submitted => &mut self.submitted,
            ReconcileAction::Updated => &mut self.updated,
            ReconcileAction::Proposed => &mut self.proposed,
            ReconcileAction::Unchanged => &mut self.unchanged,
            ReconcileAction::DuplicateInFlight => &mut self.duplicate_in_flight,
        };
        *slot += 1;
    }

    /// 产生写入的条数
    #[must_use]
    pub const fn written(&self) -> usize {
        self.created + self.submitted + self.updated + self.proposed
    }
}

/// 单个数据源的运行结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdapterReport {
    pub source: String,
    /// 整个数据源失败时的错误信息
    pub error: Option<String>,
    pub observed: usize,
    /// 数据源内部跳过的条目
    pub skipped: usize,
    /// 未通过校验的候选价格
    pub invalid: usize,
    /// 写库失败的条目
    pub failed: usize,
    pub actions: ActionCounts,
}

impl AdapterReport {
    fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// 一轮采集的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub cycle_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub adapters: Vec<AdapterReport>,
}

impl CycleReport {
    #[must_use]
    pub fn total_written(&self) -> usize {
        self.adapters.iter().map(|a| a.actions.written()).sum()
    }

    #[must_use]
    pub fn failed_sources(&self) -> Vec<&str> {
        self.adapters
            .iter()
            .filter(|a| !a.succeeded())
            .map(|a| a.source.as_str())
            .collect()
    }
}

/// 采集编排器
pub struct IngestionCycle {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    engine: Arc<ReconciliationEngine>,
    status: Arc<SourceStatusRegistry>,
    actor: Actor,
    inter_adapter_delay: Duration,
}

impl std::fmt::Debug for IngestionCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.adapters.iter().map(|a| a.name()).collect();
        f.debug_struct("IngestionCycle")
            .field("adapters", &names)
            .field("actor", &self.actor.identity)
            .field("inter_adapter_delay", &self.inter_adapter_delay)
            .finish()
    }
}

impl IngestionCycle {
    #[must_use]
    pub fn new(
        adapters: Vec<Arc<dyn SourceAdapter>>,
        engine: Arc<ReconciliationEngine>,
        actor: Actor,
        inter_adapter_delay: Duration,
    ) -> Self {
        Self {
            adapters,
            engine,
            status: Arc::new(SourceStatusRegistry::new()),
            actor,
            inter_adapter_delay,
        }
    }

    #[must_use]
    pub fn status(&self) -> Arc<SourceStatusRegistry> {
        Arc::clone(&self.status)
    }

    /// 执行一轮采集
    pub async fn run_ingestion_cycle(&self) -> Result<CycleReport> {
        let cycle_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();
        linfo!(
            &cycle_id,
            LogStage::Ingestion,
            LogComponent::Scheduler,
            "cycle_start",
            "开始价格采集",
            adapters = self.adapters.len()
        );

        let mut adapters = Vec::with_capacity(self.adapters.len());
        for (index, adapter) in self.adapters.iter().enumerate() {
            if index > 0 && !self.inter_adapter_delay.is_zero() {
                tokio::time::sleep(self.inter_adapter_delay).await;
            }
            adapters.push(self.run_adapter(adapter.as_ref(), &cycle_id).await?);
        }

        let report = CycleReport {
            cycle_id,
            started_at,
            finished_at: Utc::now(),
            adapters,
        };
        linfo!(
            &report.cycle_id,
            LogStage::Ingestion,
            LogComponent::Scheduler,
            "cycle_complete",
            "价格采集完成",
            written = report.total_written(),
            failed_sources = ?report.failed_sources(),
            elapsed_ms = (report.finished_at - report.started_at).num_milliseconds()
        );
        Ok(report)
    }

    async fn run_adapter(&self, adapter: &dyn SourceAdapter, cycle_id: &str) -> Result<AdapterReport> {
        let mut report = AdapterReport::new(adapter.name());

        let batch = match adapter.fetch().await {
            Ok(batch) => batch,
            Err(e) => {
                lerror!(
                    cycle_id,
                    LogStage::Ingestion,
                    LogComponent::SourceAdapter,
                    "adapter_failed",
                    format!("数据源本轮失败: {e}"),
                    source_name = adapter.name()
                );
                self.status.record_failure(adapter.name(), e.to_string());
                report.error = Some(e.to_string());
                return Ok(report);
            }
        };

        self.apply_batch(adapter, batch, cycle_id, &mut report).await?;
        self.status
            .record_success(adapter.name(), report.observed, report.actions.written());

        linfo!(
            cycle_id,
            LogStage::Ingestion,
            LogComponent::SourceAdapter,
            "adapter_complete",
            "数据源处理完成",
            source_name = adapter.name(),
            observed = report.observed,
            skipped = report.skipped,
            invalid = report.invalid,
            failed = report.failed,
            written = report.actions.written(),
            unchanged = report.actions.unchanged
        );
        Ok(report)
    }

    async fn apply_batch(
        &self,
        adapter: &dyn SourceAdapter,
        batch: SourceBatch,
        cycle_id: &str,
        report: &mut AdapterReport,
    ) -> Result<()> {
        for item in &batch.skipped {
            ldebug!(
                cycle_id,
                LogStage::Normalization,
                LogComponent::SourceAdapter,
                "item_skipped",
                format!("跳过: {}", item.reason),
                source_name = adapter.name(),
                raw_id = %item.raw_id
            );
        }
        report.skipped = batch.skipped.len();
        report.observed = batch.observations.len();

        let trust = adapter.trust_level();
        for observation in &batch.observations {
            match self
                .engine
                .reconcile_traced(&observation.candidate, trust, &self.actor, cycle_id)
                .await
            {
                Ok(outcome) => report.actions.add(outcome.action),
                Err(HubError::Validation { message, .. }) => {
                    report.invalid += 1;
                    lwarn!(
                        cycle_id,
                        LogStage::Reconciliation,
                        LogComponent::Reconciler,
                        "candidate_invalid",
                        format!("候选价格未通过校验: {message}"),
                        source_name = adapter.name(),
                        raw_id = %observation.raw_id
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    lerror!(
                        cycle_id,
                        LogStage::Reconciliation,
                        LogComponent::Reconciler,
                        "reconcile_failed",
                        format!("写入失败: {e}"),
                        source_name = adapter.name(),
                        raw_id = %observation.raw_id
                    );
                }
            }
        }
        Ok(())
    }
}
