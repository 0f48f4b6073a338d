//! # 权限模块

pub mod permissions;

pub use permissions::{Actor, PermissionLevel};
