//! # 日志配置模块
//!
//! 初始化 tracing 订阅器，并提供带阶段/组件上下文的结构化日志宏

use std::env;
use std::fmt;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// 日志所处的处理阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogStage {
    Startup,
    Shutdown,
    BackgroundTask,
    Ingestion,
    Normalization,
    Reconciliation,
    Approval,
    RateDerivation,
    Cache,
    Audit,
}

impl LogStage {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Shutdown => "shutdown",
            Self::BackgroundTask => "background_task",
            Self::Ingestion => "ingestion",
            Self::Normalization => "normalization",
            Self::Reconciliation => "reconciliation",
            Self::Approval => "approval",
            Self::RateDerivation => "rate_derivation",
            Self::Cache => "cache",
            Self::Audit => "audit",
        }
    }
}

impl fmt::Display for LogStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 产生日志的组件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogComponent {
    Main,
    Config,
    Database,
    Scheduler,
    Normalizer,
    SourceAdapter,
    Reconciler,
    Approval,
    Rates,
    Cache,
    Catalog,
    Audit,
}

impl LogComponent {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Config => "config",
            Self::Database => "database",
            Self::Scheduler => "scheduler",
            Self::Normalizer => "normalizer",
            Self::SourceAdapter => "source_adapter",
            Self::Reconciler => "reconciler",
            Self::Approval => "approval",
            Self::Rates => "rates",
            Self::Cache => "cache",
            Self::Catalog => "catalog",
            Self::Audit => "audit",
        }
    }
}

impl fmt::Display for LogComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 结构化 info 日志
///
/// `linfo!(request_id, LogStage, LogComponent, operation, message, field = %value, ...)`
#[macro_export]
macro_rules! linfo {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(,)?) => {
        ::tracing::info!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = %$operation,
            "{}",
            $message
        )
    };
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr, $($fields:tt)+) => {
        ::tracing::info!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = %$operation,
            $($fields)+,
            "{}",
            $message
        )
    };
}

/// 结构化 warn 日志
#[macro_export]
macro_rules! lwarn {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(,)?) => {
        ::tracing::warn!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = %$operation,
            "{}",
            $message
        )
    };
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr, $($fields:tt)+) => {
        ::tracing::warn!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = %$operation,
            $($fields)+,
            "{}",
            $message
        )
    };
}

/// 结构化 error 日志
#[macro_export]
macro_rules! lerror {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(,)?) => {
        ::tracing::error!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = %$operation,
            "{}",
            $message
        )
    };
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr, $($fields:tt)+) => {
        ::tracing::error!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = %$operation,
            $($fields)+,
            "{}",
            $message
        )
    };
}

/// 结构化 debug 日志
#[macro_export]
macro_rules! ldebug {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(,)?) => {
        ::tracing::debug!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = %$operation,
            "{}",
            $message
        )
    };
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr, $($fields:tt)+) => {
        ::tracing::debug!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = %$operation,
            $($fields)+,
            "{}",
            $message
        )
    };
}

/// 默认日志过滤规则
#[must_use]
pub fn default_filter(level: &str) -> String {
    format!("{level},price_hub=debug,sqlx::query=off,sea_orm::query=warn,sqlx=warn")
}

/// 初始化日志系统
pub fn init_optimized_logging(log_level: Option<&String>) {
    let level = log_level.map_or("info", String::as_str);

    // 默认配置：完全禁止数据库查询的详细日志
    let log_filter = env::var("RUST_LOG").unwrap_or_else(|_| default_filter(level));

    let result = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| log_filter.into()))
        .with(
            tracing_fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();

    if result.is_err() {
        // 订阅器已被设置（例如测试中重复初始化）
        return;
    }

    if env::var("RUST_LOG").is_ok_and(|v| v.contains("sqlx::query=info") || v.contains("sqlx::query=debug")) {
        tracing::info!("🔍 SQLx database query logging enabled");
    } else {
        tracing::info!("📋 SQLx database query logging disabled for production performance");
    }
}

/// 环境变量设置指南
pub fn print_logging_help() {
    println!("📋 日志配置指南:");
    println!("  RUST_LOG=info                      # 标准日志级别");
    println!("  RUST_LOG=debug                     # 调试级别");
    println!("  RUST_LOG=info,sqlx::query=off      # 生产环境：禁止数据库查询日志");
    println!("  RUST_LOG=info,sqlx::query=info     # 开发环境：启用数据库查询日志");
    println!("  RUST_LOG=price_hub=trace           # 应用详细追踪");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_silences_sql() {
        let filter = default_filter("warn");
        assert!(filter.starts_with("warn,"));
        assert!(filter.contains("sqlx::query=off"));
        assert!(filter.contains("price_hub=debug"));
    }

    #[test]
    fn test_stage_and_component_display() {
        assert_eq!(LogStage::Reconciliation.to_string(), "reconciliation");
        assert_eq!(LogComponent::SourceAdapter.to_string(), "source_adapter");
    }

    #[test]
    fn test_macros_expand() {
        let request_id = "test";
        crate::linfo!(request_id, LogStage::Startup, LogComponent::Main, "op", "消息");
        crate::lwarn!(
            request_id,
            LogStage::Cache,
            LogComponent::Cache,
            "op",
            &format!("带格式的消息 {}", 1),
            key = %"value",
            count = 3
        );
    }
}
