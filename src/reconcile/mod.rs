//! # 价格对账
//!
//! 可信来源直接写正式值，不可信来源写待审核覆盖值

pub mod engine;
pub mod plan;

pub use engine::{ReconcileAction, ReconcileOutcome, ReconciliationEngine};
pub use plan::{Plan, is_brand_new_pending, plan};
