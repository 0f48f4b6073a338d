//! # 模型类型实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 模型类型标签
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "model_types")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub type_key: String,
    pub type_label: String,
    /// 排序权重，越小越靠前
    pub sort_order: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
