//! # 待审核巡检
//!
//! 定期统计待审核队列，非空且超过冷却时间时把汇总交给通知端，发送不阻塞巡检

pub mod notification;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use entity::{PriceRecords, price_records};

use crate::config::AuditConfig;
use crate::error::Result;
use crate::logging::{LogComponent, LogStage};
use crate::types::RecordStatus;
use crate::{ldebug, lwarn};

pub use notification::{LogNotificationSink, NotificationSink, PendingItem, PendingSummary};

/// 一次巡检的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditOutcome {
    /// 没有待审核记录
    Empty,
    /// 有待审核记录，但仍在冷却期内
    CoolingDown { total: u64 },
    /// 已发出通知
    Notified(PendingSummary),
}

/// 待审核巡检服务
pub struct PendingAuditService {
    db: Arc<DatabaseConnection>,
    sink: Arc<dyn NotificationSink>,
    cooldown: Duration,
    max_listed: usize,
    last_notified: Mutex<Option<Instant>>,
}

impl std::fmt::Debug for PendingAuditService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingAuditService")
            .field("cooldown", &self.cooldown)
            .field("max_listed", &self.max_listed)
            .finish_non_exhaustive()
    }
}

impl PendingAuditService {
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        sink: Arc<dyn NotificationSink>,
        config: &AuditConfig,
    ) -> Self {
        Self {
            db,
            sink,
            cooldown: Duration::from_secs(config.notify_cooldown_secs),
            max_listed: config.max_listed,
            last_notified: Mutex::new(None),
        }
    }

    /// 巡检待审核队列
    pub async fn check_pending(&self) -> Result<AuditOutcome> {
        let pending = PriceRecords::find()
            .filter(price_records::Column::Status.eq(RecordStatus::Pending.as_str()))
            .order_by_desc(price_records::Column::UpdatedAt)
            .order_by_desc(price_records::Column::Id)
            .all(self.db.as_ref())
            .await?;

        if pending.is_empty() {
            return Ok(AuditOutcome::Empty);
        }
        let total = pending.len() as u64;

        let mut last_notified = self.last_notified.lock().await;
        if let Some(at) = *last_notified {
            if at.elapsed() < self.cooldown {
                ldebug!(
                    "audit",
                    LogStage::Audit,
                    LogComponent::Audit,
                    "notify_cooling_down",
                    "待审核通知处于冷却期",
                    total = total
                );
                return Ok(AuditOutcome::CoolingDown { total });
            }
        }

        let summary = summarize(&pending, self.max_listed);
        *last_notified = Some(Instant::now());
        drop(last_notified);

        let sink = Arc::clone(&self.sink);
        let payload = summary.clone();
        tokio::spawn(async move {
            if let Err(e) = sink.notify(&payload).await {
                lwarn!(
                    "audit",
                    LogStage::Audit,
                    LogComponent::Audit,
                    "notify_failed",
                    format!("待审核通知发送失败: {e}")
                );
            }
        });

        Ok(AuditOutcome::Notified(summary))
    }
}

/// 根据按更新时间倒序的待审核记录生成汇总
fn summarize(pending: &[price_records::Model], max_listed: usize) -> PendingSummary {
    let mut by_vendor: BTreeMap<_, u64> = BTreeMap::new();
    for record in pending {
        let channel = record.temp_channel_type.unwrap_or(record.channel_type);
        *by_vendor.entry(channel).or_default() += 1;
    }

    let recent = pending
        .iter()
        .take(max_listed)
        .map(|record| PendingItem {
            id: record.id,
            model: record
                .temp_model
                .clone()
                .unwrap_or_else(|| record.model.clone()),
            channel_type: record.temp_channel_type.unwrap_or(record.channel_type),
            created_by: record.created_by.clone(),
            updated_at: record.updated_at,
        })
        .collect();

    PendingSummary {
        total: pending.len() as u64,
        by_vendor,
        recent,
    }
}
