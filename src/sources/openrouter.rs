//! # OpenRouter 聚合平台数据源
//!
//! 同一份模型列表执行两遍：先按原始标识写入 OpenRouter 自身渠道，
//! 再按厂商改写后写入各厂商渠道。价格为每 token 的小数字符串，
//! 换算为每百万 tokens 并保留 6 位小数

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::{SkipReason, SourceAdapter, SourceBatch, build_http_client, ensure_success};
use crate::config::{AggregatorSourceConfig, ChannelListingSourceConfig};
use crate::error::{HubError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::normalizer::tables::OPENROUTER_CHANNEL;
use crate::normalizer::{NormalizedModel, Normalizer, select_priced_variants};
use crate::pricing::{ExtendedPrices, PriceCandidate, round_to};
use crate::types::{BillingType, CURRENCY_USD, TrustLevel};
use crate::{ldebug, linfo};

const SOURCE_NAME: &str = "openrouter";
const CHANNEL_SOURCE_NAME: &str = "openrouter_models";
/// 免费变体后缀
const FREE_SUFFIX: &str = ":free";
/// 写入记录的价格来源
pub const PRICE_SOURCE: &str = "三方API";

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    slug: String,
    #[serde(default)]
    modality: String,
    #[serde(default)]
    pricing: Pricing,
    #[serde(default)]
    endpoint: Option<Endpoint>,
}

#[derive(Debug, Default, Deserialize)]
struct Endpoint {
    #[serde(default)]
    pricing: Pricing,
}

#[derive(Debug, Default, Deserialize)]
struct Pricing {
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    completion: Option<String>,
}

impl ModelEntry {
    /// endpoint 中的价格优先，缺失时回退到顶层价格
    fn price_strings(&self) -> (Option<&str>, Option<&str>) {
        let endpoint = self.endpoint.as_ref().map(|e| &e.pricing);
        (
            pick_price(endpoint.and_then(|p| p.prompt.as_deref()), self.pricing.prompt.as_deref()),
            pick_price(
                endpoint.and_then(|p| p.completion.as_deref()),
                self.pricing.completion.as_deref(),
            ),
        )
    }

    /// 每百万 tokens 的 (输入, 输出) 价格，免费变体按 0 处理
    fn prices(&self, is_free: bool) -> std::result::Result<(f64, f64), SkipReason> {
        let (Some(prompt), Some(completion)) = self.price_strings() else {
            return Err(SkipReason::MissingPrice);
        };
        if is_free {
            return Ok((0.0, 0.0));
        }
        Ok((parse_per_token_price(prompt)?, parse_per_token_price(completion)?))
    }
}

fn parse_models(source_name: &str, body: &str) -> Result<ModelsResponse> {
    serde_json::from_str(body)
        .map_err(|e| HubError::source_failure_with_cause(source_name, "响应结构无法解析", e))
}

async fn fetch_models(client: &reqwest::Client, url: &str, source_name: &str) -> Result<String> {
    let response = client.get(url).send().await.map_err(|e| {
        HubError::source_failure_with_cause(source_name, "请求失败", e)
    })?;
    ensure_success(source_name, &response)?;
    response
        .text()
        .await
        .map_err(|e| HubError::source_failure_with_cause(source_name, "读取响应失败", e))
}

fn pick_price<'a>(preferred: Option<&'a str>, fallback: Option<&'a str>) -> Option<&'a str> {
    preferred
        .filter(|s| !s.trim().is_empty())
        .or_else(|| fallback.filter(|s| !s.trim().is_empty()))
}

/// 每 token 价格字符串 -> 每百万 tokens 价格
pub fn parse_per_token_price(value: &str) -> std::result::Result<f64, SkipReason> {
    let price: f64 = value
        .trim()
        .parse()
        .map_err(|_| SkipReason::InvalidPrice(value.to_string()))?;
    if !price.is_finite() || price < 0.0 {
        return Err(SkipReason::InvalidPrice(value.to_string()));
    }
    Ok(round_to(price * 1_000_000.0, 6))
}

/// OpenRouter 数据源
pub struct OpenRouterAdapter {
    client: reqwest::Client,
    url: String,
    trust: TrustLevel,
    normalizer: Arc<Normalizer>,
}

impl OpenRouterAdapter {
    pub fn new(
        config: &AggregatorSourceConfig,
        timeout: Duration,
        normalizer: Arc<Normalizer>,
    ) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout, None)?,
            url: config.url.clone(),
            trust: TrustLevel::from_flag(config.trusted),
            normalizer,
        })
    }

    /// 解析响应体（与网络无关，便于测试）
    pub fn parse_response(&self, body: &str) -> Result<SourceBatch> {
        let response = parse_models(SOURCE_NAME, body)?;

        let mut batch = SourceBatch::default();
        let mut priced: Vec<(NormalizedModel, String, PriceCandidate)> = Vec::new();

        for entry in response.data {
            let normalized = match self.normalizer.normalize(&entry.slug, &entry.modality) {
                Ok(normalized) => normalized,
                Err(rejection) => {
                    ldebug!(
                        "system",
                        LogStage::Normalization,
                        LogComponent::SourceAdapter,
                        "skip_model",
                        format!("跳过模型 {}: {rejection}", entry.slug)
                    );
                    batch.skip(&entry.slug, rejection);
                    continue;
                }
            };

            let (input_price, output_price) = match entry.prices(normalized.is_free) {
                Ok(prices) => prices,
                Err(reason) => {
                    batch.skip(&entry.slug, reason);
                    continue;
                }
            };

            let candidate = PriceCandidate {
                model: normalized.canonical_model.clone(),
                model_type: normalized.model_type,
                billing_type: BillingType::Tokens,
                channel_type: normalized.channel_id,
                currency: CURRENCY_USD.to_string(),
                input_price,
                output_price,
                price_source: PRICE_SOURCE.to_string(),
                extended: ExtendedPrices::new(),
            };
            priced.push((normalized, entry.slug, candidate));
        }

        let before = priced.len();
        let selected = select_priced_variants(priced, |(normalized, _, _)| normalized);
        if selected.len() < before {
            ldebug!(
                "system",
                LogStage::Normalization,
                LogComponent::SourceAdapter,
                "drop_variants",
                format!("同一模型存在多个变体，忽略 {} 个", before - selected.len())
            );
        }

        for (_, slug, candidate) in selected {
            batch.observe(slug, candidate);
        }
        Ok(batch)
    }
}

#[async_trait]
impl SourceAdapter for OpenRouterAdapter {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn trust_level(&self) -> TrustLevel {
        self.trust
    }

    async fn fetch(&self) -> Result<SourceBatch> {
        let body = fetch_models(&self.client, &self.url, SOURCE_NAME).await?;
        let batch = self.parse_response(&body)?;
        linfo!(
            "system",
            LogStage::Ingestion,
            LogComponent::SourceAdapter,
            "fetch_complete",
            "OpenRouter 价格拉取完成",
            observations = batch.observations.len(),
            skipped = batch.skipped.len()
        );
        Ok(batch)
    }
}

/// OpenRouter 渠道数据源：完整标识作为模型名写入渠道 20，不做厂商改写
pub struct OpenRouterChannelAdapter {
    client: reqwest::Client,
    url: String,
    trust: TrustLevel,
    price_source: String,
    normalizer: Arc<Normalizer>,
}

impl OpenRouterChannelAdapter {
    pub fn new(
        config: &ChannelListingSourceConfig,
        timeout: Duration,
        normalizer: Arc<Normalizer>,
    ) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout, None)?,
            url: config.url.clone(),
            trust: TrustLevel::from_flag(config.trusted),
            price_source: config.price_source.clone(),
            normalizer,
        })
    }

    pub fn parse_response(&self, body: &str) -> Result<SourceBatch> {
        let response = parse_models(CHANNEL_SOURCE_NAME, body)?;
        let mut batch = SourceBatch::default();

        for entry in response.data {
            let normalized =
                match self
                    .normalizer
                    .normalize_listing(&entry.slug, OPENROUTER_CHANNEL, &entry.modality)
                {
                    Ok(normalized) => normalized,
                    Err(rejection) => {
                        batch.skip(&entry.slug, rejection);
                        continue;
                    }
                };

            let is_free = normalized.canonical_model.ends_with(FREE_SUFFIX);
            let (input_price, output_price) = match entry.prices(is_free) {
                Ok(prices) => prices,
                Err(reason) => {
                    batch.skip(&entry.slug, reason);
                    continue;
                }
            };

            let candidate = PriceCandidate {
                model: normalized.canonical_model,
                model_type: normalized.model_type,
                billing_type: BillingType::Tokens,
                channel_type: OPENROUTER_CHANNEL,
                currency: CURRENCY_USD.to_string(),
                input_price,
                output_price,
                price_source: self.price_source.clone(),
                extended: ExtendedPrices::new(),
            };
            batch.observe(entry.slug, candidate);
        }
        Ok(batch)
    }
}

#[async_trait]
impl SourceAdapter for OpenRouterChannelAdapter {
    fn name(&self) -> &str {
        CHANNEL_SOURCE_NAME
    }

    fn trust_level(&self) -> TrustLevel {
        self.trust
    }

    async fn fetch(&self) -> Result<SourceBatch> {
        let body = fetch_models(&self.client, &self.url, CHANNEL_SOURCE_NAME).await?;
        let batch = self.parse_response(&body)?;
        linfo!(
            "system",
            LogStage::Ingestion,
            LogComponent::SourceAdapter,
            "fetch_complete",
            "OpenRouter 渠道价格拉取完成",
            observations = batch.observations.len(),
            skipped = batch.skipped.len()
        );
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AggregatorSourceConfig;
    use crate::types::ModelType;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn adapter() -> OpenRouterAdapter {
        OpenRouterAdapter::new(
            &AggregatorSourceConfig::default(),
            Duration::from_secs(5),
            Arc::new(Normalizer::new().unwrap()),
        )
        .unwrap()
    }

    #[test]
    fn test_parse_per_token_price() {
        assert_eq!(parse_per_token_price("0.0000025"), Ok(2.5));
        assert_eq!(parse_per_token_price("0.00000015"), Ok(0.15));
        assert!(parse_per_token_price("-1").is_err());
        assert!(parse_per_token_price("abc").is_err());
    }

    #[test]
    fn test_parse_response() {
        let body = json!({
            "data": [
                {
                    "slug": "anthropic/claude-3.5-sonnet",
                    "modality": "text+image->text",
                    "pricing": {"prompt": "0.000001", "completion": "0.000002"},
                    "endpoint": {"pricing": {"prompt": "0.000003", "completion": "0.000015"}}
                },
                {
                    "slug": "openai/gpt-oss-20b:free",
                    "modality": "text->text",
                    "pricing": {"prompt": "0", "completion": "0"}
                },
                {
                    "slug": "openai/gpt-oss-20b",
                    "modality": "text->text",
                    "pricing": {"prompt": "0.00000003", "completion": "0.00000015"}
                },
                {
                    "slug": "qwen/qwen3-8b:free",
                    "modality": "text->text",
                    "pricing": {"prompt": "0", "completion": "0"}
                },
                {"slug": "openai/o3-mini-high", "modality": "text->text",
                 "pricing": {"prompt": "0.0000011", "completion": "0.0000044"}},
                {"slug": "mistralai/mistral-large", "modality": "text->text",
                 "pricing": {"prompt": "0.000002", "completion": "0.000006"}},
                {"slug": "google/gemini-flash-1.5", "modality": "text->text",
                 "pricing": {"prompt": "0.000000075"}}
            ]
        })
        .to_string();

        let batch = adapter().parse_response(&body).unwrap();

        let observed: Vec<_> = batch
            .observations
            .iter()
            .map(|o| {
                (
                    o.candidate.channel_type,
                    o.candidate.model.as_str(),
                    o.candidate.input_price,
                    o.candidate.output_price,
                )
            })
            .collect();
        assert_eq!(
            observed,
            vec![
                (14, "claude-3-5-sonnet", 3.0, 15.0),
                (1, "gpt-oss-20b", 0.03, 0.15),
                (17, "qwen3-8b", 0.0, 0.0),
            ]
        );
        assert_eq!(batch.observations[0].candidate.model_type, ModelType::Multimodal);
        assert_eq!(batch.observations[0].candidate.price_source, PRICE_SOURCE);

        let skipped: Vec<_> = batch.skipped.iter().map(|s| s.raw_id.as_str()).collect();
        assert_eq!(
            skipped,
            vec!["openai/o3-mini-high", "mistralai/mistral-large", "google/gemini-flash-1.5"]
        );
        assert_eq!(batch.skipped[2].reason, SkipReason::MissingPrice);
    }

    #[test]
    fn test_channel_listing_keeps_full_slug() {
        let listing = OpenRouterChannelAdapter::new(
            &ChannelListingSourceConfig::default(),
            Duration::from_secs(5),
            Arc::new(Normalizer::new().unwrap()),
        )
        .unwrap();
        let body = json!({
            "data": [
                {
                    "slug": "anthropic/claude-3.5-sonnet",
                    "modality": "text+image->text",
                    "pricing": {"prompt": "0.000001", "completion": "0.000002"},
                    "endpoint": {"pricing": {"prompt": "0.000003", "completion": "0.000015"}}
                },
                {
                    "slug": "meta-llama/llama-3.3-70b-instruct:free",
                    "modality": "text->text",
                    "pricing": {"prompt": "0", "completion": "0"}
                },
                {"slug": "some-lab/image-gen", "modality": "text->image", "pricing": {}}
            ]
        })
        .to_string();

        let batch = listing.parse_response(&body).unwrap();
        let observed: Vec<_> = batch
            .observations
            .iter()
            .map(|o| (o.candidate.channel_type, o.candidate.model.as_str(), o.candidate.output_price))
            .collect();
        assert_eq!(
            observed,
            vec![
                (20, "anthropic/claude-3.5-sonnet", 15.0),
                (20, "meta-llama/llama-3.3-70b-instruct:free", 0.0),
            ]
        );
        assert_eq!(batch.observations[0].candidate.price_source, "https://openrouter.ai/models");
        assert_eq!(batch.observations[0].candidate.model_type, ModelType::Multimodal);
        assert_eq!(batch.skipped[0].reason, SkipReason::MissingPrice);
        assert_eq!(listing.trust_level(), TrustLevel::Trusted);
    }

    #[test]
    fn test_malformed_body_is_source_failure() {
        let err = adapter().parse_response("<html>").unwrap_err();
        assert!(matches!(err, HubError::Source { .. }));
    }
}
