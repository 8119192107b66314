//! 日志初始化
use crate::config::{LogFormat, LogSettings};
use crate::error::{AppError, AppResult};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// 初始化全局 tracing subscriber
///
/// 过滤规则优先取 `RUST_LOG`，否则使用配置中的 `LOG_FILTER`。重复初始化返回 `Infra` 错误。
pub fn init_tracing(settings: &LogSettings) -> AppResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .map_err(|e| AppError::Infra(format!("invalid log filter: {e}")))?;

    let (text, json) = match settings.format {
        LogFormat::Text => (Some(fmt::layer()), None),
        LogFormat::Json => (None, Some(fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(text)
        .with(json)
        .try_init()
        .map_err(|e| AppError::Infra(e.to_string()))
}
