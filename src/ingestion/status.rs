//! 各数据源最近一次运行状态

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

/// 单个数据源的运行状态
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceRunStatus {
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    /// 最近一次成功运行的观测条数
    pub last_observed: usize,
    /// 最近一次成功运行产生写入的条数
    pub last_written: usize,
    pub consecutive_failures: u32,
}

/// 数据源状态表
#[derive(Debug, Default)]
pub struct SourceStatusRegistry {
    entries: DashMap<String, SourceRunStatus>,
}

impl SourceStatusRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, source: &str, observed: usize, written: usize) {
        let now = Utc::now();
        let mut entry = self.entries.entry(source.to_string()).or_default();
        entry.last_run_at = Some(now);
        entry.last_success_at = Some(now);
        entry.last_error = None;
        entry.last_observed = observed;
        entry.last_written = written;
        entry.consecutive_failures = 0;
    }

    pub fn record_failure(&self, source: &str, error: impl Into<String>) {
        let mut entry = self.entries.entry(source.to_string()).or_default();
        entry.last_run_at = Some(Utc::now());
        entry.last_error = Some(error.into());
        entry.consecutive_failures = entry.consecutive_failures.saturating_add(1);
    }

    #[must_use]
    pub fn get(&self, source: &str) -> Option<SourceRunStatus> {
        self.entries.get(source).map(|entry| entry.value().clone())
    }

    /// 按数据源名称排序的快照
    #[must_use]
    pub fn snapshot(&self) -> Vec<(String, SourceRunStatus)> {
        let mut all: Vec<_> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }
}
