//! # 候选价格校验
//!
//! 新建与更新使用同一套校验，失败时不做任何持久化

use super::PriceCandidate;
use crate::error::Result;
use crate::validation_error;

/// 校验候选价格
pub fn validate_candidate(candidate: &PriceCandidate) -> Result<()> {
    if candidate.model.trim().is_empty() {
        return Err(validation_error!("model", "模型名称不能为空"));
    }
    if candidate.currency.trim().is_empty() {
        return Err(validation_error!("currency", "币种不能为空"));
    }
    if candidate.channel_type <= 0 {
        return Err(validation_error!(
            "channel_type",
            "无效的厂商渠道: {}",
            candidate.channel_type
        ));
    }

    check_price("input_price", candidate.input_price)?;
    check_price("output_price", candidate.output_price)?;

    for (dimension, value) in candidate.extended.iter() {
        check_price(dimension.as_str(), value)?;
    }

    Ok(())
}

fn check_price(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(validation_error!(field, "{} 不是有效数值", field));
    }
    if value < 0.0 {
        return Err(validation_error!(field, "{} 不能为负数: {}", field, value));
    }
    Ok(())
}
