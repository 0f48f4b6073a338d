//! # 配置管理器
//!
//! 统一的配置加载接口，支持配置文件和环境变量覆盖

use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::AppConfig;
use crate::ensure_config;
use crate::error::{HubError, Result};

/// 环境变量覆盖前缀
const ENV_PREFIX: &str = "PRICE_HUB_";
/// 指定配置文件路径的环境变量
const CONFIG_PATH_ENV: &str = "PRICE_HUB_CONFIG_PATH";

/// 配置管理器
pub struct ConfigManager {
    /// 当前配置
    config: Arc<RwLock<AppConfig>>,
    /// 生效的环境变量覆盖数量
    override_count: usize,
}

impl ConfigManager {
    /// 创建配置管理器
    ///
    /// 显式指定的配置文件必须存在；按环境推导的默认路径缺失时使用内置默认值
    pub async fn new() -> Result<Self> {
        if let Ok(path) = env::var(CONFIG_PATH_ENV) {
            return Self::from_file(&path).await;
        }

        let env = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        let config_file = format!("config/config.{env}.toml");
        if Path::new(&config_file).exists() {
            Self::from_file(&config_file).await
        } else {
            warn!("配置文件 {} 不存在，使用默认配置", config_file);
            Self::from_config(AppConfig::default())
        }
    }

    /// 从指定文件创建配置管理器
    pub async fn from_file(config_path: impl AsRef<Path>) -> Result<Self> {
        let config = Self::load_config_file(config_path.as_ref())?;
        Self::from_config(config)
    }

    /// 从已有配置创建，并应用环境变量覆盖
    pub fn from_config(mut config: AppConfig) -> Result<Self> {
        let env_overrides = Self::build_env_overrides(env::vars());
        Self::apply_env_overrides(&mut config, &env_overrides)?;

        config.validate().map_err(HubError::config)?;

        info!("配置管理器初始化完成");
        info!("- 环境变量覆盖: {} 个", env_overrides.len());

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            override_count: env_overrides.len(),
        })
    }

    /// 获取当前配置
    pub async fn get_config(&self) -> AppConfig {
        (*self.config.read().await).clone()
    }

    #[must_use]
    pub const fn override_count(&self) -> usize {
        self.override_count
    }

    /// 加载配置文件
    fn load_config_file(path: &Path) -> Result<AppConfig> {
        ensure_config!(path.exists(), "配置文件不存在: {}", path.display());

        let config_content = std::fs::read_to_string(path).map_err(|e| {
            HubError::config_with_source(format!("读取配置文件失败: {}", path.display()), e)
        })?;

        let config: AppConfig = toml::from_str(&config_content).map_err(|e| {
            HubError::config_with_source(
                format!("TOML解析失败 - 配置文件: {}, 详细错误: {e}", path.display()),
                e,
            )
        })?;

        Ok(config)
    }

    /// 构建环境变量覆盖映射
    ///
    /// 例如: `PRICE_HUB_DATABASE_URL` -> `database.url`，
    /// 另外兼容未加前缀的 `SILICONFLOW_API_KEY`
    fn build_env_overrides(
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> HashMap<String, String> {
        let mut overrides = HashMap::new();

        for (key, value) in vars {
            if key == CONFIG_PATH_ENV {
                continue;
            }
            if let Some(config_key) = key.strip_prefix(ENV_PREFIX) {
                let config_path = config_key.to_lowercase().replace('_', ".");
                overrides.insert(config_path, value);
            } else if key == "SILICONFLOW_API_KEY" {
                overrides
                    .entry("sources.siliconflow.api.key".to_string())
                    .or_insert(value);
            }
        }

        debug!("发现 {} 个环境变量覆盖", overrides.len());
        overrides
    }

    /// 应用环境变量覆盖
    fn apply_env_overrides(
        config: &mut AppConfig,
        overrides: &HashMap<String, String>,
    ) -> Result<()> {
        for (path, value) in overrides {
            debug!(
                "应用环境变量覆盖: {} = {}",
                path,
                if path.contains("key") || path.contains("secret") {
                    "***"
                } else {
                    value
                }
            );

            Self::apply_override_to_config(config, path, value)?;
        }
        Ok(())
    }

    /// 将环境变量覆盖应用到配置对象
    fn apply_override_to_config(config: &mut AppConfig, path: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = path.split('.').collect();

        match parts.as_slice() {
            ["database", "url"] => config.database.url = value.to_string(),
            ["database", "max", "connections"] => {
                config.database.max_connections = parse_value(value, "数据库最大连接数")?;
            }
            ["cache", "memory", "max", "entries"] => {
                config.cache.memory_max_entries = parse_value(value, "缓存最大条目数")?;
            }
            ["ingestion", "enabled"] => {
                config.ingestion.enabled = parse_value(value, "采集开关")?;
            }
            ["ingestion", "interval", "secs"] => {
                config.ingestion.interval_secs = parse_value(value, "采集周期")?;
            }
            ["ingestion", "request", "timeout", "secs"] => {
                config.ingestion.request_timeout_secs = parse_value(value, "请求超时")?;
            }
            ["sources", "openrouter", "trusted"] => {
                config.sources.openrouter.trusted = parse_value(value, "OpenRouter 信任级别")?;
            }
            ["sources", "openrouter", "url"] => config.sources.openrouter.url = value.to_string(),
            ["sources", "openrouter", "models", "enabled"] => {
                config.sources.openrouter_models.enabled = parse_value(value, "OpenRouter 渠道开关")?;
            }
            ["sources", "openrouter", "models", "url"] => {
                config.sources.openrouter_models.url = value.to_string();
            }
            ["sources", "openai", "url"] => config.sources.openai.url = value.to_string(),
            ["sources", "siliconflow", "url"] => {
                config.sources.siliconflow.url = value.to_string();
            }
            ["sources", "siliconflow", "api", "key"] => {
                config.sources.siliconflow.api_key = Some(value.to_string());
            }
            ["rates", "official", "channel", "threshold"] => {
                config.rates.official_channel_threshold = parse_value(value, "官方渠道阈值")?;
            }
            ["audit", "enabled"] => config.audit.enabled = parse_value(value, "巡检开关")?,
            _ => {
                warn!("未知的配置路径，忽略环境变量覆盖: {}", path);
            }
        }

        Ok(())
    }
}

fn parse_value<T>(value: &str, what: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse()
        .map_err(|e| HubError::config_with_source(format!("无效的{what}: {value}"), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_env_overrides_mapping() {
        let overrides = ConfigManager::build_env_overrides(vars(&[
            ("PRICE_HUB_DATABASE_URL", "sqlite::memory:"),
            ("PRICE_HUB_CONFIG_PATH", "/tmp/ignored.toml"),
            ("SILICONFLOW_API_KEY", "sk-test"),
            ("HOME", "/root"),
        ]));

        assert_eq!(overrides.len(), 2);
        assert_eq!(overrides["database.url"], "sqlite::memory:");
        assert_eq!(overrides["sources.siliconflow.api.key"], "sk-test");
    }

    #[test]
    fn test_prefixed_api_key_wins_over_plain() {
        let overrides = ConfigManager::build_env_overrides(vars(&[
            ("PRICE_HUB_SOURCES_SILICONFLOW_API_KEY", "sk-prefixed"),
            ("SILICONFLOW_API_KEY", "sk-plain"),
        ]));
        assert_eq!(overrides["sources.siliconflow.api.key"], "sk-prefixed");
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = AppConfig::default();
        let overrides = ConfigManager::build_env_overrides(vars(&[
            ("PRICE_HUB_INGESTION_INTERVAL_SECS", "60"),
            ("PRICE_HUB_SOURCES_OPENROUTER_TRUSTED", "true"),
            ("SILICONFLOW_API_KEY", "sk-test"),
        ]));
        ConfigManager::apply_env_overrides(&mut config, &overrides).unwrap();

        assert_eq!(config.ingestion.interval_secs, 60);
        assert!(config.sources.openrouter.trusted);
        assert_eq!(config.sources.siliconflow.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_invalid_override_value() {
        let mut config = AppConfig::default();
        let result =
            ConfigManager::apply_override_to_config(&mut config, "ingestion.interval.secs", "abc");
        assert!(matches!(result, Err(HubError::Config { .. })));
    }

    #[tokio::test]
    #[serial]
    async fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [database]
            url = "sqlite::memory:"

            [rates]
            official_channel_threshold = 500
            "#
        )
        .unwrap();

        let manager = ConfigManager::from_file(file.path()).await.unwrap();
        let config = manager.get_config().await;
        assert_eq!(config.rates.official_channel_threshold, 500);
        assert_eq!(config.cache.listing_ttl, 300);
    }

    #[tokio::test]
    #[serial]
    async fn test_missing_explicit_file_is_error() {
        let result = ConfigManager::from_file("/nonexistent/price_hub.toml").await;
        assert!(matches!(result, Err(HubError::Config { .. })));
    }
}
