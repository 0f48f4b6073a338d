//! # SiliconFlow 二级聚合平台数据源

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use super::{SkipReason, SourceAdapter, SourceBatch, build_http_client, ensure_success};
use crate::error::{HubError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::normalizer::Normalizer;
use crate::pricing::{ExtendedPrices, PriceCandidate, round_to};
use crate::types::{BillingType, CURRENCY_CNY, ChannelId, ModelType, TrustLevel};
use crate::{ldebug, linfo};

const SOURCE_NAME: &str = "siliconflow";
const SILICONFLOW_CHANNEL: ChannelId = 45;
const PRICE_SOURCE: &str = "SiliconFlow API";
const SUCCESS_CODE: i64 = 20000;

/// 计费单位关键字表
const BILLING_UNITS: &[(&str, BillingType)] = &[
    ("/ M Tokens", BillingType::Tokens),
    ("/ M UTF-8 bytes", BillingType::Tokens),
    ("/ M px / Steps", BillingType::Tokens),
    ("/ Video", BillingType::Times),
    ("/ Image", BillingType::Times),
];

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: bool,
    #[serde(default)]
    data: Option<EnvelopeData>,
}

#[derive(Debug, Default, Deserialize)]
struct EnvelopeData {
    #[serde(default)]
    models: Vec<PlaygroundModel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaygroundModel {
    model_name: String,
    #[serde(default)]
    price: String,
    #[serde(default)]
    price_unit: String,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    sub_type: String,
}

impl PlaygroundModel {
    /// 平台类型 -> 分类标签
    fn category(&self) -> &str {
        if self.kind == "video" && self.sub_type == "image-to-video" {
            "image-to-video"
        } else {
            &self.kind
        }
    }
}

/// 按计费单位判断计费方式，无法识别时图像/视频类按次，其余按量
#[must_use]
pub fn classify_billing(price_unit: &str, model_type: ModelType) -> BillingType {
    BILLING_UNITS
        .iter()
        .find(|(unit, _)| price_unit.contains(unit))
        .map_or_else(
            || {
                if model_type.is_visual() {
                    BillingType::Times
                } else {
                    BillingType::Tokens
                }
            },
            |(_, billing)| *billing,
        )
}

/// SiliconFlow 数据源
pub struct SiliconFlowAdapter {
    client: reqwest::Client,
    url: String,
    api_key: String,
    normalizer: Arc<Normalizer>,
}

impl SiliconFlowAdapter {
    pub fn new(
        url: &str,
        api_key: &str,
        timeout: Duration,
        normalizer: Arc<Normalizer>,
    ) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout, None)?,
            url: url.to_string(),
            api_key: api_key.to_string(),
            normalizer,
        })
    }

    /// 解析响应体（与网络无关，便于测试）
    pub fn parse_response(&self, body: &str) -> Result<SourceBatch> {
        let envelope: Envelope = serde_json::from_str(body).map_err(|e| {
            HubError::source_failure_with_cause(SOURCE_NAME, "响应结构无法解析", e)
        })?;
        if !envelope.status || envelope.code != SUCCESS_CODE {
            return Err(HubError::source_failure(
                SOURCE_NAME,
                format!("接口返回错误 (code={}): {}", envelope.code, envelope.message),
            ));
        }

        let mut batch = SourceBatch::default();
        let mut seen = HashSet::new();

        for model in envelope.data.unwrap_or_default().models {
            if !seen.insert(model.model_name.clone()) {
                batch.skip(&model.model_name, SkipReason::Duplicate);
                continue;
            }

            let normalized = match self.normalizer.normalize_listing(
                &model.model_name,
                SILICONFLOW_CHANNEL,
                model.category(),
            ) {
                Ok(normalized) => normalized,
                Err(rejection) => {
                    batch.skip(&model.model_name, rejection);
                    continue;
                }
            };

            let price = match model.price.trim().parse::<f64>() {
                Ok(price) if price.is_finite() && price >= 0.0 => round_to(price, 6),
                _ => {
                    batch.skip(&model.model_name, SkipReason::InvalidPrice(model.price.clone()));
                    continue;
                }
            };

            let billing_type = classify_billing(&model.price_unit, normalized.model_type);
            if !BILLING_UNITS.iter().any(|(unit, _)| model.price_unit.contains(unit)) {
                ldebug!(
                    "system",
                    LogStage::Normalization,
                    LogComponent::SourceAdapter,
                    "unknown_price_unit",
                    format!(
                        "未识别的价格单位 '{}'，{} 按 {} 计费",
                        model.price_unit, model.model_name, billing_type
                    )
                );
            }

            let candidate = PriceCandidate {
                model: normalized.canonical_model,
                model_type: normalized.model_type,
                billing_type,
                channel_type: normalized.channel_id,
                currency: CURRENCY_CNY.to_string(),
                input_price: price,
                output_price: price,
                price_source: PRICE_SOURCE.to_string(),
                extended: ExtendedPrices::new(),
            };
            batch.observe(model.model_name, candidate);
        }

        Ok(batch)
    }
}

#[async_trait]
impl SourceAdapter for SiliconFlowAdapter {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn trust_level(&self) -> TrustLevel {
        TrustLevel::Untrusted
    }

    async fn fetch(&self) -> Result<SourceBatch> {
        let response = self
            .client
            .get(&self.url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| HubError::source_failure_with_cause(SOURCE_NAME, "请求失败", e))?;
        ensure_success(SOURCE_NAME, &response)?;
        let body = response.text().await.map_err(|e| {
            HubError::source_failure_with_cause(SOURCE_NAME, "读取响应失败", e)
        })?;

        let batch = self.parse_response(&body)?;
        linfo!(
            "system",
            LogStage::Ingestion,
            LogComponent::SourceAdapter,
            "fetch_complete",
            "SiliconFlow 价格拉取完成",
            observations = batch.observations.len(),
            skipped = batch.skipped.len()
        );
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn adapter() -> SiliconFlowAdapter {
        SiliconFlowAdapter::new(
            "http://localhost/api",
            "sk-test",
            Duration::from_secs(5),
            Arc::new(Normalizer::new().unwrap()),
        )
        .unwrap()
    }

    #[rstest]
    #[case("￥2 / M Tokens", ModelType::Text2Text, BillingType::Tokens)]
    #[case("/ M UTF-8 bytes", ModelType::Text2Speech, BillingType::Tokens)]
    #[case("/ M px / Steps", ModelType::Text2Image, BillingType::Tokens)]
    #[case("/ Image", ModelType::Text2Image, BillingType::Times)]
    #[case("/ Video", ModelType::Text2Video, BillingType::Times)]
    #[case("", ModelType::Image2Video, BillingType::Times)]
    #[case("per call", ModelType::Text2Text, BillingType::Tokens)]
    fn test_classify_billing(
        #[case] unit: &str,
        #[case] model_type: ModelType,
        #[case] expected: BillingType,
    ) {
        assert_eq!(classify_billing(unit, model_type), expected);
    }

    #[test]
    fn test_parse_response() {
        let body = json!({
            "code": 20000,
            "message": "ok",
            "status": true,
            "data": {"models": [
                {"modelName": "deepseek-ai/DeepSeek-V3", "price": "2.0000001", "priceUnit": "/ M Tokens",
                 "type": "text", "subType": "chat"},
                {"modelName": "deepseek-ai/DeepSeek-V3", "price": "8", "priceUnit": "/ M Tokens",
                 "type": "text", "subType": "chat"},
                {"modelName": "Wan-AI/Wan2.1-I2V-14B-720P", "price": "2", "priceUnit": "",
                 "type": "video", "subType": "image-to-video"},
                {"modelName": "black-forest-labs/FLUX.1-dev", "price": "0.14", "priceUnit": "/ Image",
                 "type": "image", "subType": "text-to-image"},
                {"modelName": "BAAI/bge-m3", "price": "free", "priceUnit": "/ M Tokens",
                 "type": "embedding", "subType": "embedding"}
            ]}
        })
        .to_string();

        let batch = adapter().parse_response(&body).unwrap();
        let observed: Vec<_> = batch
            .observations
            .iter()
            .map(|o| {
                (
                    o.candidate.model.as_str(),
                    o.candidate.model_type,
                    o.candidate.billing_type,
                    o.candidate.input_price,
                )
            })
            .collect();
        assert_eq!(
            observed,
            vec![
                ("deepseek-ai/DeepSeek-V3", ModelType::Text2Text, BillingType::Tokens, 2.0),
                ("Wan-AI/Wan2.1-I2V-14B-720P", ModelType::Image2Video, BillingType::Times, 2.0),
                ("black-forest-labs/FLUX.1-dev", ModelType::Text2Image, BillingType::Times, 0.14),
            ]
        );
        assert!(batch.observations.iter().all(|o| {
            o.candidate.currency == "CNY"
                && o.candidate.channel_type == 45
                && o.candidate.input_price == o.candidate.output_price
        }));

        let skipped: Vec<_> = batch.skipped.iter().map(|s| &s.reason).collect();
        assert_eq!(
            skipped,
            vec![&SkipReason::Duplicate, &SkipReason::InvalidPrice("free".to_string())]
        );
    }

    #[test]
    fn test_envelope_error_is_source_failure() {
        let body = json!({"code": 30001, "message": "invalid token", "status": false, "data": null});
        let err = adapter().parse_response(&body.to_string()).unwrap_err();
        assert!(matches!(err, HubError::Source { .. }));
        assert!(err.to_string().contains("invalid token"));
    }
}
