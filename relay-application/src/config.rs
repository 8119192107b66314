//! 应用配置
//!
//! 从进程环境变量读取（先加载 `.env`），测试中可传入任意键查找函数。
//! 开发与测试环境为引擎地址和事件密钥提供本地默认值；其余环境缺失时一次性报告全部缺失键。

use relay_domain::transport::durable::EngineClientConfig;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const DEV_ENGINE_BASE_URL: &str = "http://localhost:8288";
const DEV_ENGINE_EVENT_KEY: &str = "local";
const DEFAULT_APP_ID: &str = "relay-app";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_LOG_FILTER: &str = "info";

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing env keys: {}", .keys.join(", "))]
    MissingKeys { keys: Vec<String> },

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
    Staging,
    Test,
}

impl Environment {
    /// 开发与测试（含 CI）环境
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development | Environment::Test)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Test => "test",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "production" => Ok(Environment::Production),
            "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "test" | "ci" => Ok(Environment::Test),
            other => Err(ConfigError::InvalidValue {
                key: "APP_ENV".into(),
                reason: format!("unknown environment '{other}'"),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::InvalidValue {
                key: "LOG_FORMAT".into(),
                reason: format!("expected 'text' or 'json', got '{other}'"),
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineSettings {
    pub base_url: String,
    pub event_key: String,
    pub app_id: String,
    pub timeout: Duration,
}

impl EngineSettings {
    pub fn client_config(&self) -> EngineClientConfig {
        EngineClientConfig::builder()
            .base_url(self.base_url.as_str())
            .event_key(self.event_key.as_str())
            .timeout(self.timeout)
            .build()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogSettings {
    /// `RUST_LOG` 未设置时使用的过滤规则
    pub filter: String,
    pub format: LogFormat,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub env: Environment,
    pub engine: EngineSettings,
    pub log: LogSettings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 以任意键查找函数构建配置；空字符串视为未设置
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let env = match get("APP_ENV") {
            Some(raw) => raw.parse::<Environment>()?,
            None => Environment::Development,
        };

        let mut missing = Vec::new();
        let mut required = |key: &str, dev_default: &str| match get(key) {
            Some(value) => value,
            None if env.is_development() => dev_default.to_string(),
            None => {
                missing.push(key.to_string());
                String::new()
            }
        };
        let base_url = required("ENGINE_BASE_URL", DEV_ENGINE_BASE_URL);
        let event_key = required("ENGINE_EVENT_KEY", DEV_ENGINE_EVENT_KEY);
        if !missing.is_empty() {
            return Err(ConfigError::MissingKeys { keys: missing });
        }

        let timeout_secs = match get("ENGINE_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidValue {
                    key: "ENGINE_TIMEOUT_SECS".into(),
                    reason: e.to_string(),
                })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let format = match get("LOG_FORMAT") {
            Some(raw) => raw.parse::<LogFormat>()?,
            None => LogFormat::default(),
        };

        Ok(Self {
            env,
            engine: EngineSettings {
                base_url,
                event_key,
                app_id: get("ENGINE_APP_ID").unwrap_or_else(|| DEFAULT_APP_ID.to_string()),
                timeout: Duration::from_secs(timeout_secs),
            },
            log: LogSettings {
                filter: get("LOG_FILTER").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
                format,
            },
        })
    }
}
