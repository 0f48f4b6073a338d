//! 待审核汇总通知

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::error::Result;
use crate::linfo;
use crate::logging::{LogComponent, LogStage};
use crate::types::{ChannelId, PriceRecordId};

/// 汇总中列出的一条待审核记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingItem {
    pub id: PriceRecordId,
    pub model: String,
    pub channel_type: ChannelId,
    pub created_by: String,
    pub updated_at: NaiveDateTime,
}

/// 待审核队列汇总
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingSummary {
    pub total: u64,
    /// 按厂商渠道统计，优先使用提议的渠道
    pub by_vendor: BTreeMap<ChannelId, u64>,
    /// 最近更新的若干条
    pub recent: Vec<PendingItem>,
}

impl PendingSummary {
    /// 渲染为纯文本消息
    #[must_use]
    pub fn render(&self) -> String {
        let mut text = format!("当前有 {} 条价格待审核\n", self.total);
        for (channel, count) in &self.by_vendor {
            let _ = writeln!(text, "  渠道 {channel}: {count} 条");
        }
        if !self.recent.is_empty() {
            text.push_str("最近提交:\n");
            for item in &self.recent {
                let _ = writeln!(
                    text,
                    "  #{} {} (渠道 {}) 由 {} 创建, 更新于 {}",
                    item.id,
                    item.model,
                    item.channel_type,
                    item.created_by,
                    item.updated_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        text
    }
}

/// 通知发送端
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, summary: &PendingSummary) -> Result<()>;
}

/// 只写日志的通知端
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn notify(&self, summary: &PendingSummary) -> Result<()> {
        linfo!(
            "audit",
            LogStage::Audit,
            LogComponent::Audit,
            "pending_summary",
            summary.render(),
            total = summary.total
        );
        Ok(())
    }
}
