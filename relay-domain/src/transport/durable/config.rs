//! 持久化传输的配置与发送选项
//!
//! - `DurableEventConfig`：每个事件一份，决定持久化函数的重试/节流/防抖/定时触发与幂等 ID；
//! - `DurableSendOptions`：单次发送时的延迟（`delay`）或定时开始（`startTime`）。
//!
use crate::error::{DispatchError, DispatchResult};
use bon::Builder;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// 节流策略：`period` 内最多启动 `limit` 次
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Throttle {
    pub limit: u32,
    pub period: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burst: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// 防抖策略：`period` 内的重复事件只执行最后一次
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Debounce {
    pub period: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

/// 由载荷推导幂等 ID 的函数
#[derive(Clone)]
pub struct IdFn(Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>);

impl IdFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Option<String> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// 取载荷中某个字符串字段作为幂等 ID
    pub fn field(name: &'static str) -> Self {
        Self::new(move |payload| payload.get(name)?.as_str().map(str::to_string))
    }

    pub fn apply(&self, payload: &Value) -> Option<String> {
        (self.0)(payload)
    }
}

impl fmt::Debug for IdFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IdFn(..)")
    }
}

/// 事件在持久化传输上的配置
#[derive(Builder, Clone, Debug, Default)]
pub struct DurableEventConfig {
    /// 失败重试次数，缺省不重试
    retries: Option<u32>,
    throttle: Option<Throttle>,
    debounce: Option<Debounce>,
    /// 额外的 cron 触发表达式
    #[builder(into)]
    cron: Option<String>,
    /// 幂等 ID 推导函数
    id: Option<IdFn>,
}

impl DurableEventConfig {
    pub fn retries(&self) -> u32 {
        self.retries.unwrap_or(0)
    }

    pub fn throttle(&self) -> Option<&Throttle> {
        self.throttle.as_ref()
    }

    pub fn debounce(&self) -> Option<&Debounce> {
        self.debounce.as_ref()
    }

    pub fn cron(&self) -> Option<&str> {
        self.cron.as_deref()
    }

    /// 按配置的 `id` 函数计算幂等 ID；未配置时为 `None`
    pub fn event_id(&self, payload: &Value) -> Option<String> {
        self.id.as_ref().and_then(|f| f.apply(payload))
    }
}

/// 延迟时长：毫秒数或可读时长（如 `"10s"`、`"1h 30m"`）；不带单位的数字字符串按毫秒处理
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Delay {
    Millis(u64),
    Expr(String),
}

impl Delay {
    pub fn to_duration(&self) -> DispatchResult<Duration> {
        match self {
            Delay::Millis(ms) => Ok(Duration::from_millis(*ms)),
            Delay::Expr(expr) => {
                let expr = expr.trim();
                if expr.is_empty() {
                    return Err(DispatchError::InvalidDelay {
                        reason: "empty duration".into(),
                    });
                }
                if let Ok(ms) = expr.parse::<u64>() {
                    return Ok(Duration::from_millis(ms));
                }
                Ok(humantime::parse_duration(expr)?)
            }
        }
    }
}

impl From<u64> for Delay {
    fn from(ms: u64) -> Self {
        Delay::Millis(ms)
    }
}

impl From<&str> for Delay {
    fn from(expr: &str) -> Self {
        Delay::Expr(expr.to_string())
    }
}

impl From<String> for Delay {
    fn from(expr: String) -> Self {
        Delay::Expr(expr)
    }
}

impl From<Duration> for Delay {
    fn from(d: Duration) -> Self {
        Delay::Millis(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

/// 定时开始的时刻
///
/// 按原样保存，执行时才解析：接受 RFC 3339、不带时区的 `YYYY-MM-DDTHH:MM:SS`（按 UTC）
/// 以及仅日期的 `YYYY-MM-DD`（当日 00:00 UTC）。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StartTime(String);

impl StartTime {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_datetime(&self) -> DispatchResult<DateTime<Utc>> {
        let raw = self.0.trim();
        if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
            return Ok(at.with_timezone(&Utc));
        }
        if let Ok(at) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
            return Ok(at.and_utc());
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|at| at.and_utc())
            .ok_or_else(|| DispatchError::InvalidDelay {
                reason: format!("invalid startTime '{raw}'"),
            })
    }
}

impl From<DateTime<Utc>> for StartTime {
    fn from(at: DateTime<Utc>) -> Self {
        StartTime(at.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

impl From<&str> for StartTime {
    fn from(raw: &str) -> Self {
        StartTime(raw.to_string())
    }
}

impl From<String> for StartTime {
    fn from(raw: String) -> Self {
        StartTime(raw)
    }
}

/// 单次发送的持久化选项；`delay` 优先于 `start_time`
#[derive(Builder, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DurableSendOptions {
    #[builder(into)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    delay: Option<Delay>,
    #[builder(into)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_time: Option<StartTime>,
}

impl DurableSendOptions {
    pub fn delay(&self) -> Option<&Delay> {
        self.delay.as_ref()
    }

    pub fn start_time(&self) -> Option<&StartTime> {
        self.start_time.as_ref()
    }

    /// 发送前检查选项能否被执行侧解析
    pub fn validate(&self) -> DispatchResult<()> {
        if let Some(delay) = &self.delay {
            delay.to_duration()?;
        }
        if let Some(start_time) = &self.start_time {
            start_time.to_datetime()?;
        }
        Ok(())
    }
}
