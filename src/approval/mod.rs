//! # 审核流程
//!
//! 通过：把覆盖值合并进正式值。拒绝：从未通过的新提交直接删除，
//! 否则丢弃覆盖值并回到已通过状态。批量操作在同一事务中完成，任一失败整体回滚。

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;

use entity::{PriceRecords, price_records};

use crate::cache::CacheCoordinator;
use crate::error::{HubError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::pricing::Overlay;
use crate::types::{PriceRecordId, RecordStatus, target_key};
use crate::{ensure, linfo};

/// 拒绝结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RejectOutcome {
    /// 从未通过的新提交，已删除
    Deleted,
    /// 覆盖值已丢弃，保留原正式值
    Reverted(price_records::Model),
}

/// 审核流程
#[derive(Debug, Clone)]
pub struct ApprovalWorkflow {
    db: Arc<DatabaseConnection>,
    cache: Arc<CacheCoordinator>,
}

async fn find_pending<C: ConnectionTrait>(
    conn: &C,
    id: PriceRecordId,
) -> Result<price_records::Model> {
    let record = PriceRecords::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| HubError::not_found("price_record", id.to_string()))?;
    ensure!(
        record.status == RecordStatus::Pending.as_str(),
        "价格记录 {} 当前状态为 {}，不能审核",
        id,
        record.status
    );
    Ok(record)
}

async fn approve_in<C: ConnectionTrait>(
    conn: &C,
    id: PriceRecordId,
) -> Result<price_records::Model> {
    let record = find_pending(conn, id).await?;
    let overlay = Overlay::of(&record);

    let model = overlay.model.clone().unwrap_or_else(|| record.model.clone());
    let channel = overlay.channel_type.unwrap_or(record.channel_type);
    let key = target_key(channel, &model);
    let editor = record.proposed_by.clone().or_else(|| record.updated_by.clone());

    let mut active: price_records::ActiveModel = record.into();
    overlay.merge_into(&mut active);
    Overlay::clear(&mut active);
    active.target_key = Set(key.clone());
    active.status = Set(RecordStatus::Approved.as_str().to_string());
    active.updated_by = Set(editor);
    active.updated_at = Set(Utc::now().naive_utc());

    active.update(conn).await.map_err(|e| {
        if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
            HubError::conflict_with_source("price_record", key, e)
        } else {
            e.into()
        }
    })
}

async fn reject_in<C: ConnectionTrait>(conn: &C, id: PriceRecordId) -> Result<RejectOutcome> {
    let record = find_pending(conn, id).await?;

    if record.model.is_empty() || record.temp_model.as_deref() == Some(record.model.as_str()) {
        record.delete(conn).await?;
        return Ok(RejectOutcome::Deleted);
    }

    let mut active: price_records::ActiveModel = record.into();
    Overlay::clear(&mut active);
    active.status = Set(RecordStatus::Approved.as_str().to_string());
    active.updated_at = Set(Utc::now().naive_utc());
    Ok(RejectOutcome::Reverted(active.update(conn).await?))
}

async fn pending_ids<C: ConnectionTrait>(conn: &C) -> Result<Vec<PriceRecordId>> {
    Ok(PriceRecords::find()
        .filter(price_records::Column::Status.eq(RecordStatus::Pending.as_str()))
        .order_by_asc(price_records::Column::Id)
        .all(conn)
        .await?
        .into_iter()
        .map(|record| record.id)
        .collect())
}

impl ApprovalWorkflow {
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>, cache: Arc<CacheCoordinator>) -> Self {
        Self { db, cache }
    }

    /// 通过单条待审核记录
    pub async fn approve_one(&self, id: PriceRecordId) -> Result<price_records::Model> {
        let txn = self.db.begin().await?;
        let record = approve_in(&txn, id).await?;
        txn.commit().await?;

        self.cache.invalidate_after_write("approval").await;
        linfo!(
            "approval",
            LogStage::Approval,
            LogComponent::Approval,
            "approve_one",
            format!("价格记录已通过: {}", record.target_key),
            id = id
        );
        Ok(record)
    }

    /// 拒绝单条待审核记录
    pub async fn reject_one(&self, id: PriceRecordId) -> Result<RejectOutcome> {
        let txn = self.db.begin().await?;
        let outcome = reject_in(&txn, id).await?;
        txn.commit().await?;

        self.cache.invalidate_after_write("approval").await;
        linfo!(
            "approval",
            LogStage::Approval,
            LogComponent::Approval,
            "reject_one",
            "价格记录已拒绝",
            id = id,
            deleted = matches!(outcome, RejectOutcome::Deleted)
        );
        Ok(outcome)
    }

    /// 通过全部待审核记录
    pub async fn approve_all(&self) -> Result<Vec<price_records::Model>> {
        let txn = self.db.begin().await?;
        let mut approved = Vec::new();
        for id in pending_ids(&txn).await? {
            approved.push(approve_in(&txn, id).await?);
        }
        txn.commit().await?;

        if !approved.is_empty() {
            self.cache.invalidate_after_write("approval").await;
        }
        linfo!(
            "approval",
            LogStage::Approval,
            LogComponent::Approval,
            "approve_all",
            "批量通过完成",
            count = approved.len()
        );
        Ok(approved)
    }

    /// 拒绝全部待审核记录
    pub async fn reject_all(&self) -> Result<Vec<RejectOutcome>> {
        let txn = self.db.begin().await?;
        let mut outcomes = Vec::new();
        for id in pending_ids(&txn).await? {
            outcomes.push(reject_in(&txn, id).await?);
        }
        txn.commit().await?;

        if !outcomes.is_empty() {
            self.cache.invalidate_after_write("approval").await;
        }
        linfo!(
            "approval",
            LogStage::Approval,
            LogComponent::Approval,
            "reject_all",
            "批量拒绝完成",
            count = outcomes.len()
        );
        Ok(outcomes)
    }
}
