//! # 厂商渠道实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 厂商渠道实体，`id` 即价格记录中的 `channel_type`
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vendor_channels")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub name: String,
    pub icon: Option<String>,
    pub created_by: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
