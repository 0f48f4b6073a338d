//! # 价格目录
//!
//! 分页价格列表与厂商、模型类型等参考数据查询，全部经过读穿透缓存

pub mod pagination;

use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use entity::{ModelTypes, PriceRecords, VendorChannels, model_types, price_records, vendor_channels};

use crate::cache::{CacheCoordinator, CacheKey};
use crate::error::{HubError, Result};
use crate::types::{ChannelId, ModelType, PriceRecordId, RecordStatus};
use crate::validation_error;

pub use pagination::{PaginationInfo, PaginationParams, build_page};

/// 价格列表查询条件
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceListQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    /// 厂商渠道（正式值或待审核值匹配即可）
    pub channel_type: Option<ChannelId>,
    pub model_type: Option<String>,
    pub status: Option<String>,
}

impl PriceListQuery {
    fn validate(&self) -> Result<()> {
        if let Some(status) = &self.status {
            if RecordStatus::parse(status).is_none() {
                return Err(validation_error!("status", "无效的状态筛选: {}", status));
            }
        }
        if let Some(model_type) = &self.model_type {
            if ModelType::parse(model_type).is_none() {
                return Err(validation_error!(
                    "model_type",
                    "无效的模型类型筛选: {}",
                    model_type
                ));
            }
        }
        Ok(())
    }

    fn cache_key(&self, params: PaginationParams) -> CacheKey {
        CacheKey::PriceList {
            page: params.page,
            page_size: params.page_size,
            channel_type: self.channel_type,
            model_type: self.model_type.clone(),
            status: self.status.clone(),
        }
    }
}

/// 一页价格记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePage {
    pub items: Vec<price_records::Model>,
    pub pagination: PaginationInfo,
}

/// 目录查询服务
#[derive(Debug, Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
    cache: Arc<CacheCoordinator>,
}

impl CatalogService {
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>, cache: Arc<CacheCoordinator>) -> Self {
        Self { db, cache }
    }

    /// 分页查询价格记录，按创建时间倒序
    pub async fn list_prices(&self, query: &PriceListQuery) -> Result<PricePage> {
        query.validate()?;
        let params = PaginationParams::new(query.page, query.page_size);
        self.cache
            .get_or_load(&query.cache_key(params), || self.load_prices(query, params))
            .await
    }

    async fn load_prices(&self, query: &PriceListQuery, params: PaginationParams) -> Result<PricePage> {
        let mut condition = Condition::all();
        if let Some(channel) = query.channel_type {
            condition = condition.add(
                Condition::any()
                    .add(price_records::Column::ChannelType.eq(channel))
                    .add(price_records::Column::TempChannelType.eq(channel)),
            );
        }
        if let Some(model_type) = &query.model_type {
            condition = condition.add(
                Condition::any()
                    .add(price_records::Column::ModelType.eq(model_type.as_str()))
                    .add(price_records::Column::TempModelType.eq(model_type.as_str())),
            );
        }
        if let Some(status) = &query.status {
            condition = condition.add(price_records::Column::Status.eq(status.as_str()));
        }

        let total = PriceRecords::find()
            .filter(condition.clone())
            .count(self.db.as_ref())
            .await?;
        let items = PriceRecords::find()
            .filter(condition)
            .order_by_desc(price_records::Column::CreatedAt)
            .order_by_desc(price_records::Column::Id)
            .offset(params.offset())
            .limit(params.page_size)
            .all(self.db.as_ref())
            .await?;

        Ok(PricePage {
            items,
            pagination: build_page(total, params),
        })
    }

    /// 厂商渠道列表，按 ID 排序
    pub async fn list_vendors(&self) -> Result<Vec<vendor_channels::Model>> {
        self.cache
            .get_or_load(&CacheKey::Vendors, || async {
                Ok(VendorChannels::find()
                    .order_by_asc(vendor_channels::Column::Id)
                    .all(self.db.as_ref())
                    .await?)
            })
            .await
    }

    /// 模型类型列表，按排序权重
    pub async fn list_model_types(&self) -> Result<Vec<model_types::Model>> {
        self.cache
            .get_or_load(&CacheKey::ModelTypes, || async {
                Ok(ModelTypes::find()
                    .order_by_asc(model_types::Column::SortOrder)
                    .all(self.db.as_ref())
                    .await?)
            })
            .await
    }

    /// 按 ID 查询单条价格记录
    pub async fn find_price(&self, id: PriceRecordId) -> Result<price_records::Model> {
        self.cache
            .get_or_load(&CacheKey::PriceRecord { id }, || async {
                PriceRecords::find_by_id(id)
                    .one(self.db.as_ref())
                    .await?
                    .ok_or_else(|| HubError::not_found("price_record", id.to_string()))
            })
            .await
    }
}
