//! # 价格字段模型
//!
//! 十个可选扩展维度以及采集得到的候选价格

use sea_orm::{ActiveModelTrait, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use entity::price_records;

use crate::types::{BillingType, ChannelId, ModelType, target_key};

/// 扩展计价维度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceDimension {
    InputAudio,
    OutputAudio,
    Cached,
    CachedRead,
    CachedWrite,
    Reasoning,
    InputText,
    OutputText,
    InputImage,
    OutputImage,
}

impl PriceDimension {
    pub const ALL: [Self; 10] = [
        Self::InputAudio,
        Self::OutputAudio,
        Self::Cached,
        Self::CachedRead,
        Self::CachedWrite,
        Self::Reasoning,
        Self::InputText,
        Self::OutputText,
        Self::InputImage,
        Self::OutputImage,
    ];

    /// 列名，同时也是倍率输出中 `extra_ratios` 的键
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InputAudio => "input_audio_tokens",
            Self::OutputAudio => "output_audio_tokens",
            Self::Cached => "cached_tokens",
            Self::CachedRead => "cached_read_tokens",
            Self::CachedWrite => "cached_write_tokens",
            Self::Reasoning => "reasoning_tokens",
            Self::InputText => "input_text_tokens",
            Self::OutputText => "output_text_tokens",
            Self::InputImage => "input_image_tokens",
            Self::OutputImage => "output_image_tokens",
        }
    }

    /// 按列名解析
    #[must_use]
    pub fn parse(column: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == column)
    }

    /// 倍率以输入价为基准（否则以输出价为基准）
    #[must_use]
    pub const fn is_relative_to_input(&self) -> bool {
        matches!(
            self,
            Self::Cached
                | Self::CachedRead
                | Self::CachedWrite
                | Self::InputAudio
                | Self::InputText
                | Self::InputImage
        )
    }

    #[must_use]
    pub const fn confirmed_column(&self) -> price_records::Column {
        use price_records::Column;
        match self {
            Self::InputAudio => Column::InputAudioTokens,
            Self::OutputAudio => Column::OutputAudioTokens,
            Self::Cached => Column::CachedTokens,
            Self::CachedRead => Column::CachedReadTokens,
            Self::CachedWrite => Column::CachedWriteTokens,
            Self::Reasoning => Column::ReasoningTokens,
            Self::InputText => Column::InputTextTokens,
            Self::OutputText => Column::OutputTextTokens,
            Self::InputImage => Column::InputImageTokens,
            Self::OutputImage => Column::OutputImageTokens,
        }
    }

    #[must_use]
    pub const fn proposed_column(&self) -> price_records::Column {
        use price_records::Column;
        match self {
            Self::InputAudio => Column::TempInputAudioTokens,
            Self::OutputAudio => Column::TempOutputAudioTokens,
            Self::Cached => Column::TempCachedTokens,
            Self::CachedRead => Column::TempCachedReadTokens,
            Self::CachedWrite => Column::TempCachedWriteTokens,
            Self::Reasoning => Column::TempReasoningTokens,
            Self::InputText => Column::TempInputTextTokens,
            Self::OutputText => Column::TempOutputTextTokens,
            Self::InputImage => Column::TempInputImageTokens,
            Self::OutputImage => Column::TempOutputImageTokens,
        }
    }

    /// 读取记录上的正式值
    #[must_use]
    pub const fn confirmed(&self, record: &price_records::Model) -> Option<f64> {
        match self {
            Self::InputAudio => record.input_audio_tokens,
            Self::OutputAudio => record.output_audio_tokens,
            Self::Cached => record.cached_tokens,
            Self::CachedRead => record.cached_read_tokens,
            Self::CachedWrite => record.cached_write_tokens,
            Self::Reasoning => record.reasoning_tokens,
            Self::InputText => record.input_text_tokens,
            Self::OutputText => record.output_text_tokens,
            Self::InputImage => record.input_image_tokens,
            Self::OutputImage => record.output_image_tokens,
        }
    }

    /// 读取记录上的待审核值
    #[must_use]
    pub const fn proposed(&self, record: &price_records::Model) -> Option<f64> {
        match self {
            Self::InputAudio => record.temp_input_audio_tokens,
            Self::OutputAudio => record.temp_output_audio_tokens,
            Self::Cached => record.temp_cached_tokens,
            Self::CachedRead => record.temp_cached_read_tokens,
            Self::CachedWrite => record.temp_cached_write_tokens,
            Self::Reasoning => record.temp_reasoning_tokens,
            Self::InputText => record.temp_input_text_tokens,
            Self::OutputText => record.temp_output_text_tokens,
            Self::InputImage => record.temp_input_image_tokens,
            Self::OutputImage => record.temp_output_image_tokens,
        }
    }

    pub fn set_confirmed(&self, active: &mut price_records::ActiveModel, value: Option<f64>) {
        active.set(self.confirmed_column(), Value::Double(value));
    }

    pub fn set_proposed(&self, active: &mut price_records::ActiveModel, value: Option<f64>) {
        active.set(self.proposed_column(), Value::Double(value));
    }
}

impl fmt::Display for PriceDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 扩展维度价格，未出现的维度表示“未定价”，不同于 0
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtendedPrices(BTreeMap<PriceDimension, f64>);

impl ExtendedPrices {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, dimension: PriceDimension) -> Option<f64> {
        self.0.get(&dimension).copied()
    }

    pub fn set(&mut self, dimension: PriceDimension, value: f64) {
        self.0.insert(dimension, value);
    }

    #[must_use]
    pub fn with(mut self, dimension: PriceDimension, value: f64) -> Self {
        self.set(dimension, value);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PriceDimension, f64)> + '_ {
        self.0.iter().map(|(d, v)| (*d, *v))
    }

    /// 读取记录上的全部正式扩展价格
    #[must_use]
    pub fn confirmed_of(record: &price_records::Model) -> Self {
        Self(
            PriceDimension::ALL
                .into_iter()
                .filter_map(|d| d.confirmed(record).map(|v| (d, v)))
                .collect(),
        )
    }
}

/// 一次采集或提交得到的候选价格，已经过规范化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceCandidate {
    pub model: String,
    pub model_type: ModelType,
    pub billing_type: BillingType,
    pub channel_type: ChannelId,
    pub currency: String,
    pub input_price: f64,
    pub output_price: f64,
    pub price_source: String,
    #[serde(default)]
    pub extended: ExtendedPrices,
}

impl PriceCandidate {
    /// 唯一目标键 `{channel}:{model}`
    #[must_use]
    pub fn target_key(&self) -> String {
        target_key(self.channel_type, &self.model)
    }
}
