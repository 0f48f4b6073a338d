//! # 价格记录实体定义
//!
//! 价格记录表的 Sea-ORM 实体模型。每条记录同时保存“正式值”与“待审核覆盖值”(`temp_*` 字段)，
//! 审核通过时覆盖值合并进正式值，拒绝时丢弃覆盖值。

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 价格记录实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "price_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// 唯一目标键 `{channel}:{model}`，由唯一索引保证同一渠道同一模型只有一条记录
    #[sea_orm(unique)]
    pub target_key: String,

    // ---- 正式值 ----
    pub model: String,
    pub model_type: String,
    /// 计费方式：tokens（按量）/ times（按次）
    pub billing_type: String,
    /// 厂商渠道ID
    pub channel_type: i32,
    pub currency: String,
    /// 输入价格（每百万 tokens 或每次）
    pub input_price: f64,
    /// 输出价格（每百万 tokens 或每次）
    pub output_price: f64,
    pub price_source: String,
    pub input_audio_tokens: Option<f64>,
    pub output_audio_tokens: Option<f64>,
    pub cached_tokens: Option<f64>,
    pub cached_read_tokens: Option<f64>,
    pub cached_write_tokens: Option<f64>,
    pub reasoning_tokens: Option<f64>,
    pub input_text_tokens: Option<f64>,
    pub output_text_tokens: Option<f64>,
    pub input_image_tokens: Option<f64>,
    pub output_image_tokens: Option<f64>,

    /// 状态：pending / approved
    pub status: String,
    pub created_by: String,
    /// 正式值最后一次被直接写入时的操作人
    pub updated_by: Option<String>,

    // ---- 待审核覆盖值 ----
    pub temp_model: Option<String>,
    pub temp_model_type: Option<String>,
    pub temp_billing_type: Option<String>,
    pub temp_channel_type: Option<i32>,
    pub temp_currency: Option<String>,
    pub temp_input_price: Option<f64>,
    pub temp_output_price: Option<f64>,
    pub temp_price_source: Option<String>,
    pub temp_input_audio_tokens: Option<f64>,
    pub temp_output_audio_tokens: Option<f64>,
    pub temp_cached_tokens: Option<f64>,
    pub temp_cached_read_tokens: Option<f64>,
    pub temp_cached_write_tokens: Option<f64>,
    pub temp_reasoning_tokens: Option<f64>,
    pub temp_input_text_tokens: Option<f64>,
    pub temp_output_text_tokens: Option<f64>,
    pub temp_input_image_tokens: Option<f64>,
    pub temp_output_image_tokens: Option<f64>,
    /// 提交中要删除的扩展维度（逗号分隔的列名）
    pub temp_cleared_dimensions: Option<String>,
    /// 覆盖值的提交人
    pub proposed_by: Option<String>,

    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
