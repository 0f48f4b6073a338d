//! # 模型名称规范化
//!
//! 把各数据源五花八门的模型标识映射为 (渠道, 规范模型名, 模型类型)。
//! 纯函数，不访问网络和数据库。

pub mod tables;

use regex::Regex;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::error::{HubError, Result};
use crate::types::{ChannelId, ModelType};

pub use tables::{is_blacklisted, model_type_for_tag};

/// 免费变体后缀
const FREE_VARIANT: &str = "free";

/// 规范化结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedModel {
    pub vendor_key: String,
    pub channel_id: ChannelId,
    pub canonical_model: String,
    /// `:variant` 后缀（不含冒号）
    pub variant: Option<String>,
    /// `:free` 变体，价格按 0 处理
    pub is_free: bool,
    pub model_type: ModelType,
}

/// 被拒绝的原因
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("无效的模型标识: {input}")]
    Malformed { input: String },
    #[error("黑名单模型: {model}")]
    Blacklisted { model: String },
    #[error("不支持的厂商: {vendor}")]
    UnsupportedVendor { vendor: String },
}

impl Rejection {
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::Malformed { .. } => "malformed",
            Self::Blacklisted { .. } => "blacklisted",
            Self::UnsupportedVendor { .. } => "unsupported_vendor",
        }
    }
}

struct CompiledRule {
    vendor: &'static str,
    regex: Regex,
    replacement: &'static str,
}

/// 规范化器，持有编译好的改名规则
pub struct Normalizer {
    rename_rules: Vec<CompiledRule>,
}

impl std::fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Normalizer")
            .field("rename_rules", &self.rename_rules.len())
            .finish()
    }
}

impl Normalizer {
    /// 使用内置数据表创建
    pub fn new() -> Result<Self> {
        let rename_rules = tables::RENAME_RULES
            .iter()
            .map(|rule| {
                Regex::new(rule.pattern)
                    .map(|regex| CompiledRule {
                        vendor: rule.vendor,
                        regex,
                        replacement: rule.replacement,
                    })
                    .map_err(|e| {
                        HubError::internal_with_source(
                            format!("改名规则编译失败: {}", rule.pattern),
                            e,
                        )
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rename_rules })
    }

    /// 规范化 `vendor/model[:variant]` 形式的标识
    pub fn normalize(
        &self,
        raw_slug: &str,
        category: &str,
    ) -> std::result::Result<NormalizedModel, Rejection> {
        let malformed = || Rejection::Malformed {
            input: raw_slug.to_string(),
        };

        let (vendor, rest) = raw_slug.trim().split_once('/').ok_or_else(malformed)?;
        let (model, variant) = match rest.split_once(':') {
            Some((model, variant)) => (model, Some(variant)),
            None => (rest, None),
        };
        if vendor.is_empty() || model.is_empty() {
            return Err(malformed());
        }

        if is_blacklisted(model) {
            return Err(Rejection::Blacklisted {
                model: model.to_string(),
            });
        }

        let channel_id =
            tables::channel_for_vendor(vendor).ok_or_else(|| Rejection::UnsupportedVendor {
                vendor: vendor.to_string(),
            })?;

        Ok(NormalizedModel {
            vendor_key: vendor.to_string(),
            channel_id,
            canonical_model: self.rename(vendor, model),
            variant: variant.filter(|v| !v.is_empty()).map(str::to_string),
            is_free: variant == Some(FREE_VARIANT),
            model_type: model_type_for_tag(category),
        })
    }

    /// 规范化渠道固定的数据源中的模型名（不拆分厂商，不改名）
    pub fn normalize_listing(
        &self,
        raw_name: &str,
        channel_id: ChannelId,
        category: &str,
    ) -> std::result::Result<NormalizedModel, Rejection> {
        let name = raw_name.trim();
        if name.is_empty() {
            return Err(Rejection::Malformed {
                input: raw_name.to_string(),
            });
        }
        if is_blacklisted(name) {
            return Err(Rejection::Blacklisted {
                model: name.to_string(),
            });
        }

        Ok(NormalizedModel {
            vendor_key: String::new(),
            channel_id,
            canonical_model: name.to_string(),
            variant: None,
            is_free: false,
            model_type: model_type_for_tag(category),
        })
    }

    fn rename(&self, vendor: &str, model: &str) -> String {
        self.rename_rules
            .iter()
            .filter(|rule| rule.vendor == vendor)
            .fold(model.to_string(), |name, rule| {
                rule.regex.replace_all(&name, rule.replacement).into_owned()
            })
    }
}

/// 同一批次内每个 (渠道, 规范模型名) 只保留一条：优先第一个付费变体，
/// 全部是免费变体时保留第一个，结果保持原有顺序
pub fn select_priced_variants<T>(
    batch: Vec<T>,
    normalized: impl Fn(&T) -> &NormalizedModel,
) -> Vec<T> {
    let mut chosen: HashMap<(ChannelId, String), usize> = HashMap::new();
    for (index, item) in batch.iter().enumerate() {
        let n = normalized(item);
        let key = (n.channel_id, n.canonical_model.clone());
        let keep_current = chosen
            .get(&key)
            .is_some_and(|&current| n.is_free || !normalized(&batch[current]).is_free);
        if !keep_current {
            chosen.insert(key, index);
        }
    }

    let kept: HashSet<usize> = chosen.into_values().collect();
    batch
        .into_iter()
        .enumerate()
        .filter(|(index, _)| kept.contains(index))
        .map(|(_, item)| item)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn normalizer() -> Normalizer {
        Normalizer::new().unwrap()
    }

    #[rstest]
    #[case("anthropic/claude-3.5-sonnet", 14, "claude-3-5-sonnet")]
    #[case("anthropic/claude-3.7-sonnet:beta", 14, "claude-3-7-sonnet")]
    #[case("anthropic/claude-sonnet-4.5", 14, "claude-sonnet-4-5")]
    #[case("google/gemini-flash-1.5", 25, "gemini-1.5-flash")]
    #[case("google/gemini-flash-1.5-8b", 25, "gemini-1.5-flash-8b")]
    #[case("openai/gpt-4o", 1, "gpt-4o")]
    #[case("x-ai/grok-4", 1001, "grok-4")]
    fn test_canonical_names(#[case] slug: &str, #[case] channel: ChannelId, #[case] expected: &str) {
        let normalized = normalizer().normalize(slug, "text->text").unwrap();
        assert_eq!(normalized.channel_id, channel);
        assert_eq!(normalized.canonical_model, expected);
    }

    #[rstest]
    #[case("openai/o3-mini-high", "blacklisted")]
    #[case("openai/O3-Mini-High:free", "blacklisted")]
    #[case("google/palm-2-chat-bison", "blacklisted")]
    #[case("meta-llama/llama-3-70b", "unsupported_vendor")]
    #[case("gpt-4o", "malformed")]
    #[case("/gpt-4o", "malformed")]
    #[case("openai/", "malformed")]
    fn test_rejections(#[case] slug: &str, #[case] reason: &str) {
        let rejection = normalizer().normalize(slug, "text->text").unwrap_err();
        assert_eq!(rejection.reason(), reason);
    }

    #[test]
    fn test_free_variant_is_kept_as_signal() {
        let normalized = normalizer()
            .normalize("qwen/qwen3-coder:free", "text->text")
            .unwrap();
        assert!(normalized.is_free);
        assert_eq!(normalized.variant.as_deref(), Some("free"));
        assert_eq!(normalized.canonical_model, "qwen3-coder");
    }

    #[rstest]
    #[case("text->text", ModelType::Text2Text)]
    #[case("text+image->text", ModelType::Multimodal)]
    #[case("image", ModelType::Text2Image)]
    #[case("embedding", ModelType::Embedding)]
    #[case("text2video", ModelType::Text2Video)]
    #[case("text+image->text+image", ModelType::Other)]
    #[case("", ModelType::Other)]
    fn test_model_type_aliases(#[case] tag: &str, #[case] expected: ModelType) {
        assert_eq!(model_type_for_tag(tag), expected);
    }

    #[test]
    fn test_priced_variant_wins() {
        let n = normalizer();
        let batch = vec![
            n.normalize("openai/gpt-oss-20b:free", "text->text").unwrap(),
            n.normalize("openai/gpt-oss-20b", "text->text").unwrap(),
            n.normalize("qwen/qwen3-8b:free", "text->text").unwrap(),
        ];

        let selected = select_priced_variants(batch, |item| item);
        let names: Vec<_> = selected
            .iter()
            .map(|m| (m.canonical_model.as_str(), m.is_free))
            .collect();
        assert_eq!(names, vec![("gpt-oss-20b", false), ("qwen3-8b", true)]);
    }

    #[test]
    fn test_first_priced_variant_wins() {
        let n = normalizer();
        let batch = vec![
            n.normalize("anthropic/claude-3.5-sonnet:free", "text->text").unwrap(),
            n.normalize("anthropic/claude-3.5-sonnet", "text->text").unwrap(),
            n.normalize("anthropic/claude-3.5-sonnet:beta", "text->text").unwrap(),
            n.normalize("qwen/qwen3-8b:free", "text->text").unwrap(),
            n.normalize("qwen/qwen3-8b:free", "text->text").unwrap(),
        ];

        let selected = select_priced_variants(batch, |item| item);
        let kept: Vec<_> = selected
            .iter()
            .map(|m| (m.canonical_model.as_str(), m.variant.as_deref()))
            .collect();
        assert_eq!(
            kept,
            vec![("claude-3-5-sonnet", None), ("qwen3-8b", Some("free"))]
        );
    }

    #[test]
    fn test_normalize_listing() {
        let n = normalizer();
        let listing = n
            .normalize_listing(" deepseek-ai/DeepSeek-V3 ", 45, "text")
            .unwrap();
        assert_eq!(listing.canonical_model, "deepseek-ai/DeepSeek-V3");
        assert_eq!(listing.channel_id, 45);
        assert!(n.normalize_listing("", 45, "text").is_err());
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let n = normalizer();
        let first = n.normalize("anthropic/claude-3.5-sonnet", "text->text");
        let second = n.normalize("anthropic/claude-3.5-sonnet", "text->text");
        assert_eq!(first, second);
    }
}
