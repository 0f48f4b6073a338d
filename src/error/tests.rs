//! # 错误处理测试

use crate::error::{Context, ErrorCategory, HubError, Result};
use std::error::Error;

#[test]
fn test_config_error_creation() {
    let err = HubError::config("测试配置错误");
    assert!(matches!(err, HubError::Config { .. }));
    assert_eq!(err.to_string(), "配置错误: 测试配置错误");
}

#[test]
fn test_config_error_with_source() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "文件不存在");
    let err = HubError::config_with_source("配置文件加载失败", io_err);

    assert!(err.to_string().contains("配置错误: 配置文件加载失败"));
    assert!(err.source().is_some());
}

#[test]
fn test_source_failure_carries_name() {
    let err = HubError::source_failure("openrouter", "返回状态码 503");
    assert_eq!(err.to_string(), "数据源错误 [openrouter]: 返回状态码 503");
    assert_eq!(err.code(), "SOURCE_ERROR");
    assert_eq!(err.category(), ErrorCategory::Server);
}

#[test]
fn test_validation_error_is_client_error() {
    let err = crate::validation_error!("cached_tokens", "缓存价格不能为负数");
    match &err {
        HubError::Validation { field, .. } => assert_eq!(field.as_deref(), Some("cached_tokens")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.category(), ErrorCategory::Client);
}

#[test]
fn test_context_wraps_and_preserves_root() {
    let result: std::result::Result<(), HubError> = Err(HubError::not_found("价格记录", "42"));
    let err = result.context("审核价格失败").unwrap_err();

    assert_eq!(err.to_string(), "审核价格失败");
    assert!(matches!(err.root(), HubError::NotFound { .. }));
    assert_eq!(err.code(), "RESOURCE_NOT_FOUND");
    assert_eq!(err.category(), ErrorCategory::Client);
}

#[test]
fn test_auto_conversion_from_toml_error() {
    let invalid_toml = "invalid = toml = syntax";
    let toml_err = toml::from_str::<toml::Value>(invalid_toml).unwrap_err();
    let err: HubError = toml_err.into();

    assert!(matches!(err, HubError::Config { .. }));
    assert!(err.to_string().contains("配置错误: TOML解析失败"));
}

#[test]
fn test_auto_conversion_from_db_error() {
    let db_err = sea_orm::DbErr::Custom("连接断开".to_string());
    let err: HubError = db_err.into();
    assert!(matches!(err, HubError::Database { .. }));
    assert_eq!(err.category(), ErrorCategory::Server);
}

#[test]
fn test_ensure_macro() {
    fn check(value: i32) -> Result<i32> {
        crate::ensure!(value >= 0, "数值不能为负数: {}", value);
        Ok(value)
    }

    assert_eq!(check(3).unwrap(), 3);
    let err = check(-1).unwrap_err();
    assert_eq!(err.to_string(), "业务错误: 数值不能为负数: -1");
}

#[test]
fn test_context_over_db_error() {
    let result: std::result::Result<(), sea_orm::DbErr> =
        Err(sea_orm::DbErr::Custom("无法打开数据库文件".to_string()));
    let err = result.context("连接数据库失败").unwrap_err();

    assert_eq!(err.to_string(), "连接数据库失败");
    assert!(matches!(err.root(), HubError::Database { .. }));
    assert_eq!(err.code(), "DATABASE_ERROR");
    assert!(err.source().is_some());
}

#[test]
fn test_ensure_config_macro() {
    fn check(ttl: u64) -> Result<u64> {
        crate::ensure_config!(ttl > 0, "缓存过期时间必须大于 0");
        Ok(ttl)
    }

    assert_eq!(check(60).unwrap(), 60);
    assert!(matches!(check(0).unwrap_err(), HubError::Config { .. }));
}
