//! # 测试数据 Fixtures
//!
//! 提供测试用的数据结构和预设数据

use chrono::Utc;
use sea_orm::{ActiveValue::NotSet, Set};

use entity::price_records;

use crate::pricing::{ExtendedPrices, Overlay, PriceCandidate, write_confirmed, write_empty_confirmed};
use crate::types::{BillingType, CURRENCY_USD, ChannelId, ModelType, RecordStatus, target_key};

/// 文本模型候选价格（USD，按 token 计费）
#[must_use]
pub fn candidate(channel: ChannelId, model: &str, input: f64, output: f64) -> PriceCandidate {
    PriceCandidate {
        model: model.to_string(),
        model_type: ModelType::Text2Text,
        billing_type: BillingType::Tokens,
        channel_type: channel,
        currency: CURRENCY_USD.to_string(),
        input_price: input,
        output_price: output,
        price_source: "官网".to_string(),
        extended: ExtendedPrices::new(),
    }
}

/// 内存中的已通过记录，不落库
#[must_use]
pub fn approved_record(channel: ChannelId, model: &str, input: f64, output: f64) -> price_records::Model {
    let now = Utc::now().naive_utc();
    price_records::Model {
        id: 1,
        target_key: target_key(channel, model),
        model: model.to_string(),
        model_type: ModelType::Text2Text.as_str().to_string(),
        billing_type: BillingType::Tokens.as_str().to_string(),
        channel_type: channel,
        currency: CURRENCY_USD.to_string(),
        input_price: input,
        output_price: output,
        price_source: "官网".to_string(),
        input_audio_tokens: None,
        output_audio_tokens: None,
        cached_tokens: None,
        cached_read_tokens: None,
        cached_write_tokens: None,
        reasoning_tokens: None,
        input_text_tokens: None,
        output_text_tokens: None,
        input_image_tokens: None,
        output_image_tokens: None,
        status: RecordStatus::Approved.as_str().to_string(),
        created_by: "tester".to_string(),
        updated_by: None,
        temp_model: None,
        temp_model_type: None,
        temp_billing_type: None,
        temp_channel_type: None,
        temp_currency: None,
        temp_input_price: None,
        temp_output_price: None,
        temp_price_source: None,
        temp_input_audio_tokens: None,
        temp_output_audio_tokens: None,
        temp_cached_tokens: None,
        temp_cached_read_tokens: None,
        temp_cached_write_tokens: None,
        temp_reasoning_tokens: None,
        temp_input_text_tokens: None,
        temp_output_text_tokens: None,
        temp_input_image_tokens: None,
        temp_output_image_tokens: None,
        temp_cleared_dimensions: None,
        proposed_by: None,
        created_at: now,
        updated_at: now,
    }
}

/// 价格记录测试数据构建器，直接构造落库用的 `ActiveModel`
pub struct PriceRecordFixture {
    confirmed: Option<PriceCandidate>,
    overlay: Overlay,
    proposed_target: Option<PriceCandidate>,
    created_by: String,
    proposed_by: Option<String>,
}

impl PriceRecordFixture {
    /// 已通过的记录
    #[must_use]
    pub fn approved(candidate: PriceCandidate) -> Self {
        Self {
            confirmed: Some(candidate),
            overlay: Overlay::default(),
            proposed_target: None,
            created_by: "tester".to_string(),
            proposed_by: None,
        }
    }

    /// 从未通过的全新待审核记录（正式值为空）
    #[must_use]
    pub fn brand_new_pending(candidate: PriceCandidate) -> Self {
        Self {
            confirmed: None,
            overlay: Overlay::full(&candidate),
            proposed_target: Some(candidate),
            created_by: "submitter".to_string(),
            proposed_by: Some("submitter".to_string()),
        }
    }

    /// 在已通过记录上附加待审核覆盖值
    #[must_use]
    pub fn with_overlay(mut self, overlay: Overlay, proposer: &str) -> Self {
        self.overlay = overlay;
        self.proposed_by = Some(proposer.to_string());
        self
    }

    #[must_use]
    pub fn created_by(mut self, creator: &str) -> Self {
        self.created_by = creator.to_string();
        self
    }

    /// 构建 `ActiveModel`
    #[must_use]
    pub fn build(self) -> price_records::ActiveModel {
        let now = Utc::now().naive_utc();
        let pending = self.confirmed.is_none() || !self.overlay.is_empty();

        let mut active = price_records::ActiveModel {
            id: NotSet,
            status: Set(if pending {
                RecordStatus::Pending
            } else {
                RecordStatus::Approved
            }
            .as_str()
            .to_string()),
            created_by: Set(self.created_by),
            updated_by: Set(None),
            proposed_by: Set(self.proposed_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        if let Some(confirmed) = &self.confirmed {
            active.target_key = Set(confirmed.target_key());
            write_confirmed(&mut active, confirmed);
        } else {
            let target = self.proposed_target.as_ref().map(PriceCandidate::target_key);
            active.target_key = Set(target.unwrap_or_default());
            write_empty_confirmed(&mut active);
        }
        self.overlay.write_to(&mut active);

        active
    }
}
