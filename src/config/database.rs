//! # 数据库配置

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// 数据库URL
    pub url: String,
    /// 最大连接数
    pub max_connections: u32,
    /// 连接超时时间（秒）
    pub connect_timeout: u64,
    /// 查询超时时间（秒）
    pub query_timeout: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./data/price_hub.db".to_string(),
            max_connections: 10,
            connect_timeout: 30,
            query_timeout: 60,
        }
    }
}

impl DatabaseConfig {
    /// 检查是否为内存数据库
    #[must_use]
    pub fn is_memory_database(&self) -> bool {
        self.url.contains(":memory:")
    }

    /// 检查是否为SQLite数据库
    #[must_use]
    pub fn is_sqlite(&self) -> bool {
        self.url.starts_with("sqlite:")
    }

    /// 连接超时
    #[must_use]
    pub const fn connect_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    /// 获取 SQLite 文件路径（内存数据库返回 None）
    #[must_use]
    pub fn sqlite_file_path(&self) -> Option<&str> {
        if !self.is_sqlite() || self.is_memory_database() {
            return None;
        }
        let path = self
            .url
            .strip_prefix("sqlite://")
            .or_else(|| self.url.strip_prefix("sqlite:"))?;
        // 去掉 ?mode=rwc 之类的查询参数
        Some(path.split('?').next().unwrap_or(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_file_path() {
        let config = DatabaseConfig::default();
        assert_eq!(config.sqlite_file_path(), Some("./data/price_hub.db"));

        let config = DatabaseConfig {
            url: "sqlite:data/test.db?mode=rwc".to_string(),
            ..DatabaseConfig::default()
        };
        assert_eq!(config.sqlite_file_path(), Some("data/test.db"));

        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            ..DatabaseConfig::default()
        };
        assert!(config.is_memory_database());
        assert_eq!(config.sqlite_file_path(), None);
    }
}
