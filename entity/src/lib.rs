//! # Entity 模块
//!
//! 包含所有 Sea-ORM 实体定义

pub mod model_types;
pub mod price_records;
pub mod vendor_channels;

pub use model_types::Entity as ModelTypes;
pub use price_records::Entity as PriceRecords;
pub use vendor_channels::Entity as VendorChannels;
