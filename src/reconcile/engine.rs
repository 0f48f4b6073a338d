//! # 对账执行器
//!
//! 查询已有记录与写入在同一事务中完成，目标键唯一索引兜底并发重复提交

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    SqlErr, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;

use entity::{PriceRecords, price_records};

use super::plan::{Plan, plan};
use crate::auth::Actor;
use crate::cache::CacheCoordinator;
use crate::error::{HubError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::pricing::{Overlay, PriceCandidate, validate_candidate, write_confirmed, write_empty_confirmed};
use crate::types::{RecordStatus, TrustLevel};
use crate::{ldebug, linfo};

/// 对账动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileAction {
    /// 新建已通过记录
    Created,
    /// 新建待审核记录
    Submitted,
    /// 直接更新正式值
    Updated,
    /// 提交待审核差异
    Proposed,
    /// 无需写入
    Unchanged,
    /// 同一目标已有待审核的新提交
    DuplicateInFlight,
}

impl ReconcileAction {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Submitted => "submitted",
            Self::Updated => "updated",
            Self::Proposed => "proposed",
            Self::Unchanged => "unchanged",
            Self::DuplicateInFlight => "duplicate_in_flight",
        }
    }

    /// 是否产生了写入
    #[must_use]
    pub const fn is_write(&self) -> bool {
        matches!(
            self,
            Self::Created | Self::Submitted | Self::Updated | Self::Proposed
        )
    }
}

impl std::fmt::Display for ReconcileAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 对账结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcileOutcome {
    pub action: ReconcileAction,
    /// 写入后的记录；未写入时为已有记录
    pub record: Option<price_records::Model>,
}

impl ReconcileOutcome {
    #[must_use]
    pub const fn applied(&self) -> bool {
        self.action.is_write()
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// 对账引擎
#[derive(Debug, Clone)]
pub struct ReconciliationEngine {
    db: Arc<DatabaseConnection>,
    cache: Arc<CacheCoordinator>,
}

impl ReconciliationEngine {
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>, cache: Arc<CacheCoordinator>) -> Self {
        Self { db, cache }
    }

    /// 对账一条候选价格
    pub async fn reconcile(
        &self,
        candidate: &PriceCandidate,
        trust: TrustLevel,
        actor: &Actor,
    ) -> Result<ReconcileOutcome> {
        self.reconcile_traced(candidate, trust, actor, &actor.identity)
            .await
    }

    /// 同 [`Self::reconcile`]，日志使用给定的请求 ID
    pub async fn reconcile_traced(
        &self,
        candidate: &PriceCandidate,
        trust: TrustLevel,
        actor: &Actor,
        request_id: &str,
    ) -> Result<ReconcileOutcome> {
        validate_candidate(candidate)?;

        let trusted = trust.is_trusted() || actor.may_write_live();
        let key = candidate.target_key();
        let now = Utc::now().naive_utc();

        let txn = self.db.begin().await?;
        let existing = PriceRecords::find()
            .filter(price_records::Column::TargetKey.eq(&key))
            .one(&txn)
            .await?;

        let decision = plan(candidate, existing.as_ref(), trusted);
        let outcome = match (decision, existing) {
            (Plan::CreateApproved | Plan::CreatePending, None) => {
                let mut active = price_records::ActiveModel {
                    target_key: Set(key.clone()),
                    created_by: Set(actor.identity.clone()),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                let action = if trusted {
                    write_confirmed(&mut active, candidate);
                    Overlay::clear(&mut active);
                    active.status = Set(RecordStatus::Approved.as_str().to_string());
                    active.updated_by = Set(Some(actor.identity.clone()));
                    ReconcileAction::Created
                } else {
                    write_empty_confirmed(&mut active);
                    Overlay::full(candidate).write_to(&mut active);
                    active.status = Set(RecordStatus::Pending.as_str().to_string());
                    active.updated_by = Set(None);
                    active.proposed_by = Set(Some(actor.identity.clone()));
                    ReconcileAction::Submitted
                };

                match active.insert(&txn).await {
                    Ok(record) => ReconcileOutcome {
                        action,
                        record: Some(record),
                    },
                    Err(e) if is_unique_violation(&e) => {
                        txn.rollback().await?;
                        ldebug!(
                            request_id,
                            LogStage::Reconciliation,
                            LogComponent::Reconciler,
                            "duplicate_in_flight",
                            "目标键已被并发写入，跳过",
                            target = %key
                        );
                        return Ok(ReconcileOutcome {
                            action: ReconcileAction::DuplicateInFlight,
                            record: None,
                        });
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            (Plan::DuplicateInFlight, record) => ReconcileOutcome {
                action: ReconcileAction::DuplicateInFlight,
                record,
            },
            (Plan::Unchanged, record) => ReconcileOutcome {
                action: ReconcileAction::Unchanged,
                record,
            },
            (Plan::OverwriteConfirmed, Some(record)) => {
                let mut active: price_records::ActiveModel = record.into();
                write_confirmed(&mut active, candidate);
                Overlay::clear(&mut active);
                active.target_key = Set(key.clone());
                active.status = Set(RecordStatus::Approved.as_str().to_string());
                active.updated_by = Set(Some(actor.identity.clone()));
                active.updated_at = Set(now);
                ReconcileOutcome {
                    action: ReconcileAction::Updated,
                    record: Some(active.update(&txn).await?),
                }
            }
            (Plan::ProposeOverlay(delta), Some(record)) => {
                let mut active: price_records::ActiveModel = record.into();
                delta.write_to(&mut active);
                active.status = Set(RecordStatus::Pending.as_str().to_string());
                active.proposed_by = Set(Some(actor.identity.clone()));
                active.updated_at = Set(now);
                ReconcileOutcome {
                    action: ReconcileAction::Proposed,
                    record: Some(active.update(&txn).await?),
                }
            }
            (decision, _) => {
                return Err(HubError::internal(format!(
                    "对账决策与记录状态不一致: {decision:?} ({key})"
                )));
            }
        };

        txn.commit().await?;

        if outcome.applied() {
            self.cache.invalidate_after_write(request_id).await;
            linfo!(
                request_id,
                LogStage::Reconciliation,
                LogComponent::Reconciler,
                "reconcile_write",
                format!("价格记录已写入: {key}"),
                action = %outcome.action,
                actor = %actor.identity,
                trusted = trusted
            );
        } else {
            ldebug!(
                request_id,
                LogStage::Reconciliation,
                LogComponent::Reconciler,
                "reconcile_skip",
                format!("价格记录无需写入: {key}"),
                action = %outcome.action
            );
        }

        Ok(outcome)
    }
}
