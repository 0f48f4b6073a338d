//! # 规范化数据表
//!
//! 厂商差异全部以数据形式描述，新增规则不需要改动控制流

use crate::types::{ChannelId, ModelType};

/// OpenRouter 自身的渠道
pub const OPENROUTER_CHANNEL: ChannelId = 20;

/// 厂商标识 -> 渠道ID 白名单
pub const VENDOR_CHANNELS: &[(&str, ChannelId)] = &[
    ("openai", 1),
    ("anthropic", 14),
    ("qwen", 17),
    ("google", 25),
    ("x-ai", 1001),
];

/// 黑名单（忽略大小写的子串匹配）：下线、重复或不支持的模型
pub const BLACKLIST: &[&str] = &["shap-e", "palm-2", "o3-mini-high"];

/// 按厂商生效的改名规则
#[derive(Debug, Clone, Copy)]
pub struct RenameRule {
    pub vendor: &'static str,
    pub pattern: &'static str,
    pub replacement: &'static str,
}

pub const RENAME_RULES: &[RenameRule] = &[
    // claude-3.5-sonnet -> claude-3-5-sonnet
    RenameRule {
        vendor: "anthropic",
        pattern: r"(\d)\.(\d)",
        replacement: "${1}-${2}",
    },
    // gemini-flash-1.5-8b -> gemini-1.5-flash-8b
    RenameRule {
        vendor: "google",
        pattern: r"^gemini-flash-1\.5",
        replacement: "gemini-1.5-flash",
    },
];

/// 数据源上报的模态/分类标签 -> 模型类型
pub const MODEL_TYPE_ALIASES: &[(&str, ModelType)] = &[
    ("text->text", ModelType::Text2Text),
    ("text+image->text", ModelType::Multimodal),
    ("text", ModelType::Text2Text),
    ("chat", ModelType::Text2Text),
    ("image", ModelType::Text2Image),
    ("video", ModelType::Text2Video),
    ("image-to-video", ModelType::Image2Video),
    ("audio", ModelType::Text2Speech),
    ("embedding", ModelType::Embedding),
];

/// 查找厂商对应的渠道
#[must_use]
pub fn channel_for_vendor(vendor: &str) -> Option<ChannelId> {
    VENDOR_CHANNELS
        .iter()
        .find(|(key, _)| *key == vendor)
        .map(|(_, channel)| *channel)
}

/// 分类标签解析为模型类型，无法识别时归为 `other`
#[must_use]
pub fn model_type_for_tag(tag: &str) -> ModelType {
    let tag = tag.trim().to_ascii_lowercase();
    MODEL_TYPE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == tag)
        .map(|(_, model_type)| *model_type)
        .or_else(|| ModelType::parse(&tag))
        .unwrap_or(ModelType::Other)
}

/// 是否命中黑名单
#[must_use]
pub fn is_blacklisted(model: &str) -> bool {
    let lower = model.to_lowercase();
    BLACKLIST.iter().any(|pattern| lower.contains(pattern))
}
