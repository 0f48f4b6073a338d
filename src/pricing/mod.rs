//! # 价格模型
//!
//! 候选价格、扩展维度、待审核覆盖值以及容差比较
#![allow(clippy::float_cmp)]

pub mod fields;
pub mod overlay;
pub mod validation;

pub use fields::{ExtendedPrices, PriceCandidate, PriceDimension};
pub use overlay::{Overlay, write_confirmed, write_empty_confirmed};
pub use validation::validate_candidate;

use entity::price_records;

/// 数值比较容差
pub const PRICE_EPSILON: f64 = 1e-5;

/// 两个价格在容差内相等
#[must_use]
pub fn price_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < PRICE_EPSILON
}

/// 可选价格相等：都缺失，或都存在且在容差内相等
#[must_use]
pub fn optional_price_eq(a: Option<f64>, b: Option<f64>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => price_eq(a, b),
        _ => false,
    }
}

/// 四舍五入到指定小数位
#[must_use]
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// 候选价格与记录正式值完全一致（字符串精确比较，数值容差比较）
#[must_use]
pub fn matches_confirmed(candidate: &PriceCandidate, record: &price_records::Model) -> bool {
    candidate.model == record.model
        && candidate.channel_type == record.channel_type
        && candidate.model_type.as_str() == record.model_type
        && candidate.billing_type.as_str() == record.billing_type
        && candidate.currency == record.currency
        && candidate.price_source == record.price_source
        && price_eq(candidate.input_price, record.input_price)
        && price_eq(candidate.output_price, record.output_price)
        && PriceDimension::ALL.into_iter().all(|dimension| {
            optional_price_eq(candidate.extended.get(dimension), dimension.confirmed(record))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.234_567_89, 6), 1.234_568);
        assert_eq!(round_to(0.000_002_5 * 1e6, 6), 2.5);
        assert_eq!(round_to(0.333_33, 4), 0.3333);
    }

    #[test]
    fn test_optional_price_eq() {
        assert!(optional_price_eq(None, None));
        assert!(!optional_price_eq(Some(0.0), None));
        assert!(!optional_price_eq(None, Some(0.0)));
        assert!(optional_price_eq(Some(1.0), Some(1.000_000_1)));
    }

    proptest! {
        #[test]
        fn prop_tiny_difference_is_equal(base in 0.0f64..10_000.0) {
            prop_assert!(price_eq(base, base + 1e-7));
            prop_assert!(price_eq(base + 1e-7, base));
        }

        #[test]
        fn prop_visible_difference_is_not_equal(base in 0.0f64..10_000.0) {
            prop_assert!(!price_eq(base, base + 1e-4));
            prop_assert!(!optional_price_eq(Some(base), Some(base - 1e-4)));
        }
    }
}
