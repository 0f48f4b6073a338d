use serde::{Deserialize, Serialize};
use std::fmt;

/// 厂商渠道ID
pub type ChannelId = i32;
pub type PriceRecordId = i32;

pub type PriceValue = f64;

/// 美元币种标识
pub const CURRENCY_USD: &str = "USD";
/// 人民币币种标识
pub const CURRENCY_CNY: &str = "CNY";

/// 计费方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingType {
    /// 按 token 计费（每百万 tokens）
    Tokens,
    /// 按次计费
    Times,
}

impl BillingType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tokens => "tokens",
            Self::Times => "times",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "tokens" => Some(Self::Tokens),
            "times" => Some(Self::Times),
            _ => None,
        }
    }
}

impl fmt::Display for BillingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 价格记录状态
///
/// 拒绝不会落库：拒绝要么删除记录，要么回退到已通过状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Pending,
    Approved,
}

impl RecordStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            _ => None,
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 模型类型枚举，与 `model_types` 表的 `type_key` 一一对应
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    Text2Text,
    Multimodal,
    Text2Image,
    Text2Video,
    Image2Video,
    Text2Speech,
    Embedding,
    Other,
}

impl ModelType {
    pub const ALL: [Self; 8] = [
        Self::Text2Text,
        Self::Multimodal,
        Self::Text2Image,
        Self::Text2Video,
        Self::Image2Video,
        Self::Text2Speech,
        Self::Embedding,
        Self::Other,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Text2Text => "text2text",
            Self::Multimodal => "multimodal",
            Self::Text2Image => "text2image",
            Self::Text2Video => "text2video",
            Self::Image2Video => "image2video",
            Self::Text2Speech => "text2speech",
            Self::Embedding => "embedding",
            Self::Other => "other",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// 图像、视频类模型
    #[must_use]
    pub const fn is_visual(&self) -> bool {
        matches!(
            self,
            Self::Text2Image | Self::Text2Video | Self::Image2Video
        )
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 数据源信任级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustLevel {
    /// 直接写入正式值
    Trusted,
    /// 写入待审核覆盖值
    Untrusted,
}

impl TrustLevel {
    #[must_use]
    pub const fn from_flag(trusted: bool) -> Self {
        if trusted { Self::Trusted } else { Self::Untrusted }
    }

    #[must_use]
    pub const fn is_trusted(&self) -> bool {
        matches!(self, Self::Trusted)
    }
}

/// 价格记录的唯一目标键
#[must_use]
pub fn target_key(channel: ChannelId, model: &str) -> String {
    format!("{channel}:{model}")
}
