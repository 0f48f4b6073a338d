//! # 待审核覆盖值
//!
//! 覆盖值只保存与正式值不同的字段。为空的字段表示“不修改”，
//! 要删除的扩展维度单独记在 `cleared` 中。

use sea_orm::Set;
use std::collections::BTreeSet;

use entity::price_records;

use super::{ExtendedPrices, PriceCandidate, PriceDimension, optional_price_eq, price_eq};

/// 记录上的一组待审核字段（不含提交人）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    pub model: Option<String>,
    pub model_type: Option<String>,
    pub billing_type: Option<String>,
    pub channel_type: Option<i32>,
    pub currency: Option<String>,
    pub input_price: Option<f64>,
    pub output_price: Option<f64>,
    pub price_source: Option<String>,
    pub extended: ExtendedPrices,
    /// 审核通过后要删除的扩展维度
    pub cleared: BTreeSet<PriceDimension>,
}

impl Overlay {
    /// 读取记录当前的覆盖值
    #[must_use]
    pub fn of(record: &price_records::Model) -> Self {
        let mut extended = ExtendedPrices::new();
        for dimension in PriceDimension::ALL {
            if let Some(value) = dimension.proposed(record) {
                extended.set(dimension, value);
            }
        }

        Self {
            model: record.temp_model.clone(),
            model_type: record.temp_model_type.clone(),
            billing_type: record.temp_billing_type.clone(),
            channel_type: record.temp_channel_type,
            currency: record.temp_currency.clone(),
            input_price: record.temp_input_price,
            output_price: record.temp_output_price,
            price_source: record.temp_price_source.clone(),
            extended,
            cleared: parse_cleared(record.temp_cleared_dimensions.as_deref()),
        }
    }

    /// 全新提交：所有字段都进入覆盖值
    #[must_use]
    pub fn full(candidate: &PriceCandidate) -> Self {
        Self {
            model: Some(candidate.model.clone()),
            model_type: Some(candidate.model_type.as_str().to_string()),
            billing_type: Some(candidate.billing_type.as_str().to_string()),
            channel_type: Some(candidate.channel_type),
            currency: Some(candidate.currency.clone()),
            input_price: Some(candidate.input_price),
            output_price: Some(candidate.output_price),
            price_source: Some(candidate.price_source.clone()),
            extended: candidate.extended.clone(),
            cleared: BTreeSet::new(),
        }
    }

    /// 候选价格相对正式值的差异
    ///
    /// 渠道与模型名构成目标键，不进入差异
    #[must_use]
    pub fn delta(candidate: &PriceCandidate, record: &price_records::Model) -> Self {
        let differs = |proposed: &str, confirmed: &str| -> Option<String> {
            (proposed != confirmed).then(|| proposed.to_string())
        };
        let price_differs =
            |proposed: f64, confirmed: f64| (!price_eq(proposed, confirmed)).then_some(proposed);

        let mut extended = ExtendedPrices::new();
        let mut cleared = BTreeSet::new();
        for dimension in PriceDimension::ALL {
            match (candidate.extended.get(dimension), dimension.confirmed(record)) {
                (Some(value), confirmed) if !optional_price_eq(Some(value), confirmed) => {
                    extended.set(dimension, value);
                }
                (None, Some(_)) => {
                    cleared.insert(dimension);
                }
                _ => {}
            }
        }

        Self {
            model: None,
            model_type: differs(candidate.model_type.as_str(), &record.model_type),
            billing_type: differs(candidate.billing_type.as_str(), &record.billing_type),
            channel_type: None,
            currency: differs(&candidate.currency, &record.currency),
            input_price: price_differs(candidate.input_price, record.input_price),
            output_price: price_differs(candidate.output_price, record.output_price),
            price_source: differs(&candidate.price_source, &record.price_source),
            extended,
            cleared,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.model.is_none()
            && self.model_type.is_none()
            && self.billing_type.is_none()
            && self.channel_type.is_none()
            && self.currency.is_none()
            && self.input_price.is_none()
            && self.output_price.is_none()
            && self.price_source.is_none()
            && self.extended.is_empty()
            && self.cleared.is_empty()
    }

    /// 容差意义上的相等
    #[must_use]
    pub fn equivalent(&self, other: &Self) -> bool {
        self.model == other.model
            && self.model_type == other.model_type
            && self.billing_type == other.billing_type
            && self.channel_type == other.channel_type
            && self.currency == other.currency
            && self.price_source == other.price_source
            && optional_price_eq(self.input_price, other.input_price)
            && optional_price_eq(self.output_price, other.output_price)
            && self.cleared == other.cleared
            && PriceDimension::ALL.into_iter().all(|dimension| {
                optional_price_eq(self.extended.get(dimension), other.extended.get(dimension))
            })
    }

    /// 整体替换记录上的覆盖值（未出现的字段写为 NULL）
    pub fn write_to(&self, active: &mut price_records::ActiveModel) {
        active.temp_model = Set(self.model.clone());
        active.temp_model_type = Set(self.model_type.clone());
        active.temp_billing_type = Set(self.billing_type.clone());
        active.temp_channel_type = Set(self.channel_type);
        active.temp_currency = Set(self.currency.clone());
        active.temp_input_price = Set(self.input_price);
        active.temp_output_price = Set(self.output_price);
        active.temp_price_source = Set(self.price_source.clone());
        for dimension in PriceDimension::ALL {
            dimension.set_proposed(active, self.extended.get(dimension));
        }
        active.temp_cleared_dimensions = Set(format_cleared(&self.cleared));
    }

    /// 清空覆盖值与提交人
    pub fn clear(active: &mut price_records::ActiveModel) {
        Self::default().write_to(active);
        active.proposed_by = Set(None);
    }

    /// 把非空覆盖字段合并到正式值，空字段保持正式值不变
    pub fn merge_into(&self, active: &mut price_records::ActiveModel) {
        if let Some(model) = &self.model {
            active.model = Set(model.clone());
        }
        if let Some(model_type) = &self.model_type {
            active.model_type = Set(model_type.clone());
        }
        if let Some(billing_type) = &self.billing_type {
            active.billing_type = Set(billing_type.clone());
        }
        if let Some(channel_type) = self.channel_type {
            active.channel_type = Set(channel_type);
        }
        if let Some(currency) = &self.currency {
            active.currency = Set(currency.clone());
        }
        if let Some(input_price) = self.input_price {
            active.input_price = Set(input_price);
        }
        if let Some(output_price) = self.output_price {
            active.output_price = Set(output_price);
        }
        if let Some(price_source) = &self.price_source {
            active.price_source = Set(price_source.clone());
        }
        for (dimension, value) in self.extended.iter() {
            dimension.set_confirmed(active, Some(value));
        }
        for dimension in &self.cleared {
            dimension.set_confirmed(active, None);
        }
    }
}

fn parse_cleared(value: Option<&str>) -> BTreeSet<PriceDimension> {
    value
        .unwrap_or_default()
        .split(',')
        .filter_map(|column| PriceDimension::parse(column.trim()))
        .collect()
}

fn format_cleared(cleared: &BTreeSet<PriceDimension>) -> Option<String> {
    if cleared.is_empty() {
        return None;
    }
    let columns: Vec<_> = cleared.iter().map(PriceDimension::as_str).collect();
    Some(columns.join(","))
}

/// 用候选价格整体覆盖正式值，候选中缺失的扩展维度写为 NULL
pub fn write_confirmed(active: &mut price_records::ActiveModel, candidate: &PriceCandidate) {
    active.model = Set(candidate.model.clone());
    active.model_type = Set(candidate.model_type.as_str().to_string());
    active.billing_type = Set(candidate.billing_type.as_str().to_string());
    active.channel_type = Set(candidate.channel_type);
    active.currency = Set(candidate.currency.clone());
    active.input_price = Set(candidate.input_price);
    active.output_price = Set(candidate.output_price);
    active.price_source = Set(candidate.price_source.clone());
    for dimension in PriceDimension::ALL {
        dimension.set_confirmed(active, candidate.extended.get(dimension));
    }
}

/// 全新待审核记录的正式值占位：模型名为空、渠道为 0、价格为 0
pub fn write_empty_confirmed(active: &mut price_records::ActiveModel) {
    active.model = Set(String::new());
    active.model_type = Set(String::new());
    active.billing_type = Set(String::new());
    active.channel_type = Set(0);
    active.currency = Set(String::new());
    active.input_price = Set(0.0);
    active.output_price = Set(0.0);
    active.price_source = Set(String::new());
    for dimension in PriceDimension::ALL {
        dimension.set_confirmed(active, None);
    }
}
