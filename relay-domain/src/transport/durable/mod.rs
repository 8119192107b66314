//! 持久化传输（DurableTransport）
//!
//! 通过外部工作流引擎投递事件：
//! - 装配时为每个配置了持久化传输的事件生成一个 `DurableFunction`；
//! - `send` 只负责把事件信封提交给引擎，消费者在引擎回调 `invoke` 时执行；
//! - 延迟、定时开始、重试与节流都交由引擎保证。
//!
mod config;
mod engine;
mod function;
mod inmemory;

pub use config::{
    Debounce, Delay, DurableEventConfig, DurableSendOptions, IdFn, StartTime, Throttle,
};
#[cfg(feature = "http-engine")]
pub use engine::{EngineClientConfig, HttpEngineClient};
pub use engine::{EngineEvent, EngineEventData, WorkflowEngine};
pub use function::{
    DeliveryReport, DurableFunction, FunctionManifest, InProcessSteps, NO_REGISTERED_CONSUMER,
    StepRunner, Trigger,
};
pub use inmemory::{InMemoryEngine, InvocationRecord};

use super::{Transport, TransportKind, TransportRegistry};
use crate::consumer::ConsumerRegistry;
use crate::error::{DispatchError, DispatchResult};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// 引擎接收事件后返回的 ID
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DurableReceipt {
    pub ids: Vec<String>,
}

pub struct DurableTransport {
    engine: Arc<dyn WorkflowEngine>,
    functions: Vec<DurableFunction>,
}

impl DurableTransport {
    pub fn new(
        engine: Arc<dyn WorkflowEngine>,
        consumers: Arc<ConsumerRegistry>,
        transports: &TransportRegistry,
    ) -> Self {
        let functions: Vec<DurableFunction> = transports
            .durable_configs()
            .into_iter()
            .map(|(event_name, config)| {
                DurableFunction::new(event_name, config.clone(), consumers.clone())
            })
            .collect();

        debug!(
            functions = ?functions.iter().map(DurableFunction::id).collect::<Vec<_>>(),
            "durable functions built"
        );

        Self { engine, functions }
    }

    pub fn functions(&self) -> &[DurableFunction] {
        &self.functions
    }

    pub fn function(&self, function_id: &str) -> Option<&DurableFunction> {
        self.functions.iter().find(|f| f.id() == function_id)
    }

    /// 全部函数的描述，供引擎注册
    pub fn manifests(&self) -> Vec<FunctionManifest> {
        self.functions.iter().map(DurableFunction::manifest).collect()
    }

    /// 引擎回调入口：按函数 ID 执行一次调用
    pub async fn invoke(
        &self,
        function_id: &str,
        event: &EngineEvent,
        steps: &dyn StepRunner,
    ) -> DispatchResult<DeliveryReport> {
        let function =
            self.function(function_id)
                .ok_or_else(|| DispatchError::FunctionNotFound {
                    function_id: function_id.to_string(),
                })?;
        function.invoke(event, steps).await
    }
}

#[async_trait]
impl Transport for DurableTransport {
    type EventConfig = DurableEventConfig;
    type Options = DurableSendOptions;
    type Receipt = DurableReceipt;

    fn kind(&self) -> TransportKind {
        TransportKind::Durable
    }

    async fn send(
        &self,
        event_name: &str,
        payload: &Value,
        config: &DurableEventConfig,
        options: Option<&DurableSendOptions>,
    ) -> DispatchResult<DurableReceipt> {
        // 执行侧无法解析的选项在发送时即报错，避免引擎反复重试
        if let Some(options) = options {
            options.validate()?;
        }
        let event = EngineEvent::new(event_name, payload.clone(), options.cloned())
            .with_id(config.event_id(payload));
        let ids = self.engine.send(&event).await?;
        debug!(event_name, ?ids, "event handed to workflow engine");
        Ok(DurableReceipt { ids })
    }

    async fn start(&self) -> DispatchResult<()> {
        Ok(())
    }

    async fn stop(&self) -> DispatchResult<()> {
        Ok(())
    }
}
