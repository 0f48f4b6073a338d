//! # 对账决策
//!
//! 根据候选价格、已有记录与可信度决定要做的写入，不访问数据库

use entity::price_records;

use crate::pricing::{Overlay, PriceCandidate, matches_confirmed};
use crate::types::RecordStatus;

/// 对账决策
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    /// 新建已通过记录，正式值即候选值
    CreateApproved,
    /// 新建待审核记录，正式值为空，覆盖值为完整候选值
    CreatePending,
    /// 同一目标已有从未通过的待审核记录
    DuplicateInFlight,
    /// 无需写入
    Unchanged,
    /// 直接覆盖正式值并清空覆盖值
    OverwriteConfirmed,
    /// 用差异替换覆盖值，状态置为待审核
    ProposeOverlay(Overlay),
}

/// 记录是否为从未通过审核的新提交
#[must_use]
pub fn is_brand_new_pending(record: &price_records::Model) -> bool {
    record.status == RecordStatus::Pending.as_str() && record.model.is_empty()
}

/// 计算对账决策
#[must_use]
pub fn plan(
    candidate: &PriceCandidate,
    existing: Option<&price_records::Model>,
    trusted: bool,
) -> Plan {
    let Some(record) = existing else {
        return if trusted {
            Plan::CreateApproved
        } else {
            Plan::CreatePending
        };
    };

    if is_brand_new_pending(record) {
        return Plan::DuplicateInFlight;
    }

    if trusted {
        // 正式值一致但仍挂着过期覆盖值时也要清理
        let has_overlay = !Overlay::of(record).is_empty() || record.proposed_by.is_some();
        if matches_confirmed(candidate, record) && !has_overlay {
            return Plan::Unchanged;
        }
        return Plan::OverwriteConfirmed;
    }

    let delta = Overlay::delta(candidate, record);
    if delta.is_empty() || delta.equivalent(&Overlay::of(record)) {
        return Plan::Unchanged;
    }
    Plan::ProposeOverlay(delta)
}
