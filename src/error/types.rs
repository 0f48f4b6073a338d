//! # 错误类型定义

use thiserror::Error;

use super::ErrorCategory;

/// 应用主要错误类型
#[derive(Debug, Error)]
pub enum HubError {
    /// 配置相关错误
    #[error("配置错误: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 数据库相关错误（持久化失败，所在事务整体回滚）
    #[error("数据库错误: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 网络通信错误
    #[error("网络错误: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 外部价格源整体失败（网络、超时、非 200、响应结构异常），本轮放弃该数据源
    #[error("数据源错误 [{source_name}]: {message}")]
    Source {
        source_name: String,
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 文档解析错误
    #[error("解析错误: {message}")]
    Parse {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 输入校验失败，不做任何持久化
    #[error("校验错误: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// 资源未找到
    #[error("资源未找到: {resource_type} {identifier}")]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    /// 资源冲突（违反唯一约束等）
    #[error("资源冲突: {resource_type} {identifier}")]
    Conflict {
        resource_type: String,
        identifier: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 业务逻辑错误
    #[error("业务错误: {message}")]
    Business { message: String },

    /// 序列化/反序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    /// IO相关错误
    #[error("IO错误: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// 系统内部错误
    #[error("内部错误: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 带上下文的错误
    #[error("{context}")]
    Context {
        context: String,
        #[source]
        source: Box<HubError>,
    },
}

impl HubError {
    /// 错误代码
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "CONFIG_ERROR",
            Self::Database { .. } => "DATABASE_ERROR",
            Self::Network { .. } => "NETWORK_ERROR",
            Self::Source { .. } => "SOURCE_ERROR",
            Self::Parse { .. } => "PARSE_ERROR",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::NotFound { .. } => "RESOURCE_NOT_FOUND",
            Self::Conflict { .. } => "RESOURCE_CONFLICT",
            Self::Business { .. } => "BUSINESS_ERROR",
            Self::Serialization { .. } => "SERIALIZATION_ERROR",
            Self::Io { .. } => "IO_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
            Self::Context { source, .. } => source.code(),
        }
    }

    /// 错误归类：调用方问题还是服务端问题
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. }
            | Self::NotFound { .. }
            | Self::Conflict { .. }
            | Self::Business { .. } => ErrorCategory::Client,
            Self::Context { source, .. } => source.category(),
            _ => ErrorCategory::Server,
        }
    }

    /// 去掉上下文包装后的根错误
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// 创建配置错误
    pub fn config<T: Into<String>>(message: T) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的配置错误
    pub fn config_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建数据库错误
    pub fn database<T: Into<String>>(message: T) -> Self {
        Self::Database {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的数据库错误
    pub fn database_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Database {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建网络错误
    pub fn network<T: Into<String>>(message: T) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的网络错误
    pub fn network_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Network {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建数据源错误
    pub fn source_failure<S: Into<String>, T: Into<String>>(source_name: S, message: T) -> Self {
        Self::Source {
            source_name: source_name.into(),
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的数据源错误
    pub fn source_failure_with_cause<S: Into<String>, T: Into<String>, E: Into<anyhow::Error>>(
        source_name: S,
        message: T,
        cause: E,
    ) -> Self {
        Self::Source {
            source_name: source_name.into(),
            message: message.into(),
            source: Some(cause.into()),
        }
    }

    /// 创建解析错误
    pub fn parse<T: Into<String>>(message: T) -> Self {
        Self::Parse {
            message: message.into(),
            source: None,
        }
    }

    /// 创建校验错误
    pub fn validation<T: Into<String>>(message: T, field: Option<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field,
        }
    }

    /// 创建资源未找到错误
    pub fn not_found<T: Into<String>, I: Into<String>>(resource_type: T, identifier: I) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            identifier: identifier.into(),
        }
    }

    /// 创建资源冲突错误
    pub fn conflict<T: Into<String>, I: Into<String>>(resource_type: T, identifier: I) -> Self {
        Self::Conflict {
            resource_type: resource_type.into(),
            identifier: identifier.into(),
            source: None,
        }
    }

    /// 创建带来源的资源冲突错误
    pub fn conflict_with_source<T: Into<String>, I: Into<String>, E: Into<anyhow::Error>>(
        resource_type: T,
        identifier: I,
        source: E,
    ) -> Self {
        Self::Conflict {
            resource_type: resource_type.into(),
            identifier: identifier.into(),
            source: Some(source.into()),
        }
    }

    /// 创建业务错误
    pub fn business<T: Into<String>>(message: T) -> Self {
        Self::Business {
            message: message.into(),
        }
    }

    /// 创建内部错误
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的内部错误
    pub fn internal_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

// 自动转换常见错误类型
impl From<std::io::Error> for HubError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: "文件操作失败".to_string(),
            source: err,
        }
    }
}

impl From<toml::de::Error> for HubError {
    fn from(err: toml::de::Error) -> Self {
        Self::config_with_source("TOML解析失败", err)
    }
}

impl From<serde_json::Error> for HubError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: "JSON处理失败".to_string(),
            source: err.into(),
        }
    }
}

impl From<sea_orm::error::DbErr> for HubError {
    fn from(err: sea_orm::error::DbErr) -> Self {
        Self::database_with_source("数据库操作失败", err)
    }
}

// Reqwest错误转换
impl From<reqwest::Error> for HubError {
    fn from(err: reqwest::Error) -> Self {
        Self::network_with_source("HTTP请求失败", err)
    }
}
