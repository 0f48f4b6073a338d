//! # 价格数据源
//!
//! 每个外部数据源一个适配器：拉取原始数据、规范化，产出候选价格。
//! 单条数据的问题记录为跳过项；整个数据源不可用（网络、超时、非 200、
//! 响应结构异常）时返回 `HubError::Source`，本轮放弃该数据源。

pub mod openai_page;
pub mod openrouter;
pub mod siliconflow;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{IngestionConfig, SourcesConfig};
use crate::error::{HubError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::lwarn;
use crate::normalizer::{Normalizer, Rejection};
use crate::pricing::PriceCandidate;
use crate::types::TrustLevel;

pub use openai_page::OpenAiPricingPageAdapter;
pub use openrouter::{OpenRouterAdapter, OpenRouterChannelAdapter};
pub use siliconflow::SiliconFlowAdapter;

/// 一条候选价格观测
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    /// 数据源中的原始标识，用于日志
    pub raw_id: String,
    pub candidate: PriceCandidate,
}

/// 跳过原因
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// 规范化被拒绝
    Rejected(String),
    /// 未公布价格
    MissingPrice,
    /// 价格无法解析
    InvalidPrice(String),
    /// 同批次内重复
    Duplicate,
}

impl From<Rejection> for SkipReason {
    fn from(rejection: Rejection) -> Self {
        Self::Rejected(rejection.to_string())
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected(detail) => write!(f, "{detail}"),
            Self::MissingPrice => f.write_str("未公布价格"),
            Self::InvalidPrice(detail) => write!(f, "价格解析失败: {detail}"),
            Self::Duplicate => f.write_str("同批次重复"),
        }
    }
}

/// 被跳过的条目
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedItem {
    pub raw_id: String,
    pub reason: SkipReason,
}

/// 一次拉取的结果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourceBatch {
    pub observations: Vec<Observation>,
    pub skipped: Vec<SkippedItem>,
}

impl SourceBatch {
    pub fn skip(&mut self, raw_id: impl Into<String>, reason: impl Into<SkipReason>) {
        self.skipped.push(SkippedItem {
            raw_id: raw_id.into(),
            reason: reason.into(),
        });
    }

    pub fn observe(&mut self, raw_id: impl Into<String>, candidate: PriceCandidate) {
        self.observations.push(Observation {
            raw_id: raw_id.into(),
            candidate,
        });
    }
}

/// 价格数据源适配器
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// 数据源名称
    fn name(&self) -> &str;

    /// 是否可以直接写入正式值
    fn trust_level(&self) -> TrustLevel;

    /// 拉取并规范化
    async fn fetch(&self) -> Result<SourceBatch>;
}

/// 构建带超时的 HTTP 客户端
pub fn build_http_client(timeout: Duration, user_agent: Option<&str>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)));
    if let Some(user_agent) = user_agent {
        builder = builder.user_agent(user_agent);
    }
    builder
        .build()
        .map_err(|e| HubError::network_with_source("构建HTTP客户端失败", e))
}

/// 把非 200 响应转换为数据源错误
pub(crate) fn ensure_success(source_name: &str, response: &reqwest::Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(HubError::source_failure(
            source_name,
            format!("返回状态码 {status}"),
        ))
    }
}

/// 按配置构建启用的数据源，顺序即执行顺序
pub fn build_adapters(
    sources: &SourcesConfig,
    ingestion: &IngestionConfig,
    normalizer: Arc<Normalizer>,
) -> Result<Vec<Arc<dyn SourceAdapter>>> {
    let timeout = ingestion.request_timeout();
    let mut adapters: Vec<Arc<dyn SourceAdapter>> = Vec::new();

    if sources.openrouter_models.enabled {
        adapters.push(Arc::new(OpenRouterChannelAdapter::new(
            &sources.openrouter_models,
            timeout,
            normalizer.clone(),
        )?));
    }
    if sources.openrouter.enabled {
        adapters.push(Arc::new(OpenRouterAdapter::new(
            &sources.openrouter,
            timeout,
            normalizer.clone(),
        )?));
    }
    if sources.openai.enabled {
        adapters.push(Arc::new(OpenAiPricingPageAdapter::new(
            &sources.openai,
            timeout,
            normalizer.clone(),
        )?));
    }
    if sources.siliconflow.enabled {
        match &sources.siliconflow.api_key {
            Some(api_key) if !api_key.is_empty() => {
                adapters.push(Arc::new(SiliconFlowAdapter::new(
                    &sources.siliconflow.url,
                    api_key,
                    timeout,
                    normalizer,
                )?));
            }
            _ => {
                lwarn!(
                    "system",
                    LogStage::Ingestion,
                    LogComponent::SourceAdapter,
                    "source_disabled",
                    "未配置 SiliconFlow API Key，跳过该数据源",
                    source_name = "siliconflow"
                );
            }
        }
    }

    Ok(adapters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_build_adapters_order_and_trust() {
        let mut config = AppConfig::default();
        config.sources.siliconflow.api_key = Some("sk-test".to_string());
        let normalizer = Arc::new(Normalizer::new().unwrap());

        let adapters = build_adapters(&config.sources, &config.ingestion, normalizer).unwrap();
        let names: Vec<_> = adapters.iter().map(|a| a.name().to_string()).collect();
        assert_eq!(
            names,
            vec!["openrouter_models", "openrouter", "openai", "siliconflow"]
        );
        assert_eq!(adapters[0].trust_level(), TrustLevel::Trusted);
        assert_eq!(adapters[1].trust_level(), TrustLevel::Untrusted);
        assert_eq!(adapters[2].trust_level(), TrustLevel::Trusted);
        assert_eq!(adapters[3].trust_level(), TrustLevel::Untrusted);
    }

    #[test]
    fn test_siliconflow_skipped_without_key() {
        let config = AppConfig::default();
        let normalizer = Arc::new(Normalizer::new().unwrap());
        let adapters = build_adapters(&config.sources, &config.ingestion, normalizer).unwrap();
        assert_eq!(adapters.len(), 3);
    }
}
