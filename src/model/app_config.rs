use std::path::{Path, PathBuf};
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::common::error::ApiError;

/// 默认配置文件（不带扩展名，由 `config` 按扩展名识别格式）
pub const DEFAULT_CONFIG_PATH: &str = "input/config";

static APP_CONFIG: OnceCell<AppConfig> = OnceCell::new();

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// 是否启用代理，兼容 `"true"` / `"false"` 字符串写法
    pub proxy: bool,
    /// 并发数；缺省时在启动时交互询问
    pub workers: Option<usize>,
    pub fetch: FetchConfig,
    pub paths: PathsConfig,
    pub log: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    pub endpoint: String,
    pub max_attempts: u32,
    /// 单位：秒
    pub rate_limit_delay: f64,
    /// 单次请求超时，单位：秒
    pub timeout: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://discord.com/api/v9/users/@me/guilds".to_string(),
            max_attempts: 5,
            rate_limit_delay: 1.0,
            timeout: 10,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// 负数按 0 处理，非法或超出范围时回退为 1 秒
    pub fn rate_limit_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.rate_limit_delay.max(0.0)).unwrap_or(Duration::from_secs(1))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    pub tokens: PathBuf,
    pub proxies: PathBuf,
    pub output: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            tokens: PathBuf::from("input/tokens.txt"),
            proxies: PathBuf::from("input/proxy.txt"),
            output: PathBuf::from("guilds.txt"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub console_levels: Vec<String>,
    pub dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            console_levels: vec!["ERROR".to_string()],
            dir: PathBuf::from("logs"),
        }
    }
}

impl AppConfig {
    /// 读取配置文件并叠加 `GUILDHYDRA__` 前缀的环境变量。
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix("GUILDHYDRA").separator("__"))
            .build()?;
        let config = config.try_deserialize()?;
        Ok(config)
    }
}

/// 程序启动时调用一次，返回进程内共享的配置
pub fn init(path: impl AsRef<Path>) -> Result<&'static AppConfig, ApiError> {
    let config = AppConfig::load(path)?;
    Ok(APP_CONFIG.get_or_init(|| config))
}
