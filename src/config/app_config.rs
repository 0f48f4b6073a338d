//! # 应用配置结构定义

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 应用主配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 数据库配置
    pub database: super::DatabaseConfig,
    /// 缓存配置
    pub cache: CacheConfig,
    /// 采集调度配置
    pub ingestion: IngestionConfig,
    /// 各价格源配置
    pub sources: SourcesConfig,
    /// 倍率计算配置
    pub rates: RatesConfig,
    /// 待审核巡检配置
    pub audit: AuditConfig,
}

/// 缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// 内存缓存最大条目数
    pub memory_max_entries: u64,
    /// 列表查询缓存时间（秒）
    pub listing_ttl: u64,
    /// 厂商、模型类型等参考数据缓存时间（秒）
    pub reference_ttl: u64,
    /// 倍率结果缓存时间（秒）
    pub rates_ttl: u64,
    /// 热点键预热间隔（秒）
    pub warm_interval: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            memory_max_entries: 10_000,
            listing_ttl: 300,
            reference_ttl: 1800,
            rates_ttl: 86_400,
            warm_interval: 600,
        }
    }
}

/// 采集调度配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// 是否启用定时采集
    pub enabled: bool,
    /// 采集周期（秒）
    pub interval_secs: u64,
    /// 启动后首次采集的延迟（秒）
    pub initial_delay_secs: u64,
    /// 相邻两个数据源之间的间隔（秒）
    pub inter_adapter_delay_secs: u64,
    /// 单次 HTTP 请求超时（秒）
    pub request_timeout_secs: u64,
    /// 采集写入时记录的操作人
    pub actor: String,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 4 * 3600,
            initial_delay_secs: 5,
            inter_adapter_delay_secs: 3,
            request_timeout_secs: 30,
            actor: "cron自动任务".to_string(),
        }
    }
}

impl IngestionConfig {
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    #[must_use]
    pub const fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }

    #[must_use]
    pub const fn inter_adapter_delay(&self) -> Duration {
        Duration::from_secs(self.inter_adapter_delay_secs)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// 各价格源配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// OpenRouter 自身渠道，在厂商改写之前执行
    pub openrouter_models: ChannelListingSourceConfig,
    pub openrouter: AggregatorSourceConfig,
    pub openai: OfficialPageSourceConfig,
    pub siliconflow: SecondarySourceConfig,
}

/// 聚合平台 JSON 源（OpenRouter）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorSourceConfig {
    pub enabled: bool,
    pub url: String,
    /// 为 true 时直接写入正式值，否则进入待审核
    pub trusted: bool,
}

impl Default for AggregatorSourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "https://openrouter.ai/api/frontend/models".to_string(),
            trusted: false,
        }
    }
}

/// 按原始标识写入聚合平台自身渠道的源
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelListingSourceConfig {
    pub enabled: bool,
    pub url: String,
    pub trusted: bool,
    /// 写入记录的价格来源
    pub price_source: String,
}

impl Default for ChannelListingSourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "https://openrouter.ai/api/frontend/models".to_string(),
            trusted: true,
            price_source: "https://openrouter.ai/models".to_string(),
        }
    }
}

/// 官网定价页源（OpenAI）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OfficialPageSourceConfig {
    pub enabled: bool,
    pub url: String,
    pub user_agent: String,
}

impl Default for OfficialPageSourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "https://developers.openai.com/api/docs/pricing".to_string(),
            user_agent: "Mozilla/5.0 (compatible; PriceBot/1.0)".to_string(),
        }
    }
}

/// 二级聚合平台源（SiliconFlow）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecondarySourceConfig {
    pub enabled: bool,
    pub url: String,
    /// Bearer token，未配置时该数据源会被跳过
    pub api_key: Option<String>,
}

impl Default for SecondarySourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "https://busy-bear.siliconflow.cn/api/v1/playground/comprehensive/all"
                .to_string(),
            api_key: None,
        }
    }
}

/// 倍率计算配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RatesConfig {
    /// 渠道ID小于该值的视为官方厂商
    pub official_channel_threshold: i32,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            official_channel_threshold: 1000,
        }
    }
}

/// 待审核巡检配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub enabled: bool,
    /// 巡检间隔（秒）
    pub check_interval_secs: u64,
    /// 两次通知之间的最短间隔（秒）
    pub notify_cooldown_secs: u64,
    /// 通知中列出的最近待审核条目数
    pub max_listed: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval_secs: 3600,
            notify_cooldown_secs: 86_400,
            max_listed: 5,
        }
    }
}

impl AppConfig {
    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), String> {
        if self.database.url.is_empty() {
            return Err("Database URL cannot be empty".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }

        if self.cache.memory_max_entries == 0 {
            return Err("cache.memory_max_entries 必须大于 0".to_string());
        }
        if self.cache.listing_ttl == 0 || self.cache.reference_ttl == 0 || self.cache.rates_ttl == 0 {
            return Err("缓存 TTL 必须大于 0".to_string());
        }

        if self.ingestion.interval_secs == 0 {
            return Err("ingestion.interval_secs 必须大于 0".to_string());
        }
        if self.ingestion.request_timeout_secs == 0 {
            return Err("ingestion.request_timeout_secs 必须大于 0，外部请求必须有超时".to_string());
        }

        let urls = [
            ("sources.openrouter_models.url", &self.sources.openrouter_models.url),
            ("sources.openrouter.url", &self.sources.openrouter.url),
            ("sources.openai.url", &self.sources.openai.url),
            ("sources.siliconflow.url", &self.sources.siliconflow.url),
        ];
        for (name, value) in urls {
            url::Url::parse(value).map_err(|e| format!("{name} 不是合法的 URL: {e}"))?;
        }

        if self.rates.official_channel_threshold <= 0 {
            return Err("rates.official_channel_threshold 必须大于 0".to_string());
        }

        if self.audit.check_interval_secs == 0 {
            return Err("audit.check_interval_secs 必须大于 0".to_string());
        }

        Ok(())
    }
}
