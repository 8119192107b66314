//! 持久化函数（DurableFunction）
//!
//! 每个配置了持久化传输的事件对应一个函数，ID 为 `"<eventName>-function"`，
//! 由同名事件触发，另可附加 cron 触发。函数在引擎调用时执行：
//! 1. `options.delay` 存在则以具名步骤 `"delay"` 休眠；否则 `options.startTime`
//!    存在则以具名步骤 `"startTime"` 休眠至该时刻；
//! 2. 查找消费者，无消费者时返回非致命的 `no.registered.consumer` 结果；
//! 3. 并发执行全部消费者并等待，任一失败则本次调用失败，交由引擎按 `retries` 重试。
//!
use super::{Debounce, DurableEventConfig, EngineEvent, Throttle};
use crate::consumer::ConsumerRegistry;
use crate::error::DispatchResult;
use crate::transport::local::run_consumers;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// 无消费者时返回的错误码
pub const NO_REGISTERED_CONSUMER: &str = "no.registered.consumer";

/// 函数触发器
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Trigger {
    Event { event: String },
    Cron { cron: String },
}

/// 供引擎注册使用的函数描述
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionManifest {
    pub id: String,
    pub name: String,
    pub triggers: Vec<Trigger>,
    pub retries: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub throttle: Option<Throttle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debounce: Option<Debounce>,
}

/// 一次调用的结果
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub event_name: String,
    pub consumers: usize,
}

impl DeliveryReport {
    fn delivered(event_name: &str, consumers: usize) -> Self {
        Self {
            success: true,
            error: None,
            event_name: event_name.to_string(),
            consumers,
        }
    }

    fn no_consumer(event_name: &str) -> Self {
        Self {
            success: false,
            error: Some(NO_REGISTERED_CONSUMER.to_string()),
            event_name: event_name.to_string(),
            consumers: 0,
        }
    }
}

/// 可恢复的具名步骤
///
/// 引擎侧实现应以 `step_id` 记录步骤状态，使休眠在进程重启后仍能继续；
/// `InProcessSteps` 仅基于 tokio 计时器，适用于本地开发与测试。
#[async_trait]
pub trait StepRunner: Send + Sync {
    async fn sleep(&self, step_id: &str, duration: Duration) -> DispatchResult<()>;

    async fn sleep_until(&self, step_id: &str, until: DateTime<Utc>) -> DispatchResult<()>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct InProcessSteps;

#[async_trait]
impl StepRunner for InProcessSteps {
    async fn sleep(&self, step_id: &str, duration: Duration) -> DispatchResult<()> {
        debug!(step_id, ?duration, "step sleeping");
        tokio::time::sleep(duration).await;
        Ok(())
    }

    async fn sleep_until(&self, step_id: &str, until: DateTime<Utc>) -> DispatchResult<()> {
        // 已过期的时刻不休眠
        let remaining = (until - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        if remaining.is_zero() {
            return Ok(());
        }
        self.sleep(step_id, remaining).await
    }
}

pub struct DurableFunction {
    id: String,
    event_name: String,
    config: DurableEventConfig,
    consumers: Arc<ConsumerRegistry>,
}

impl DurableFunction {
    pub fn new(
        event_name: impl Into<String>,
        config: DurableEventConfig,
        consumers: Arc<ConsumerRegistry>,
    ) -> Self {
        let event_name = event_name.into();
        Self {
            id: Self::function_id(&event_name),
            event_name,
            config,
            consumers,
        }
    }

    /// 由事件名推导函数 ID
    pub fn function_id(event_name: &str) -> String {
        format!("{event_name}-function")
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    pub fn config(&self) -> &DurableEventConfig {
        &self.config
    }

    pub fn triggers(&self) -> Vec<Trigger> {
        let mut triggers = vec![Trigger::Event {
            event: self.event_name.clone(),
        }];
        if let Some(cron) = self.config.cron() {
            triggers.push(Trigger::Cron {
                cron: cron.to_string(),
            });
        }
        triggers
    }

    pub fn manifest(&self) -> FunctionManifest {
        FunctionManifest {
            id: self.id.clone(),
            name: self.event_name.clone(),
            triggers: self.triggers(),
            retries: self.config.retries(),
            throttle: self.config.throttle().cloned(),
            debounce: self.config.debounce().cloned(),
        }
    }

    /// 执行一次由引擎触发的调用
    pub async fn invoke(
        &self,
        event: &EngineEvent,
        steps: &dyn StepRunner,
    ) -> DispatchResult<DeliveryReport> {
        let options = event.data.options.as_ref();
        if let Some(delay) = options.and_then(|o| o.delay()) {
            steps.sleep("delay", delay.to_duration()?).await?;
        } else if let Some(start_time) = options.and_then(|o| o.start_time()) {
            steps
                .sleep_until("startTime", start_time.to_datetime()?)
                .await?;
        }

        let consumers = self
            .consumers
            .get_event_consumers(&self.event_name)
            .unwrap_or_default();
        if consumers.is_empty() {
            warn!(event_name = %self.event_name, function_id = %self.id, "no consumer for event");
            return Ok(DeliveryReport::no_consumer(&self.event_name));
        }

        run_consumers(&self.event_name, &event.data.payload, &consumers).await?;
        Ok(DeliveryReport::delivered(&self.event_name, consumers.len()))
    }
}
