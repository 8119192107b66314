//! 事件服务（EventService）
//!
//! 每次发送的流程：校验 → 解析传输 → 并发分发 → 全部结束后汇总。
//! - 校验失败或事件未配置任何传输：记录警告并返回空结果，不报错；
//! - 配置了但未装配的传输：记录警告并跳过；
//! - 单个传输失败不影响其他传输，失败作为该传输的结果保留在 `SendEventResult` 中。
//!
use crate::consumer::ConsumerRegistry;
use crate::error::{DispatchError, DispatchResult};
use crate::event::{Event, EventRegistry};
use crate::result::SendEventResult;
use crate::transport::durable::WorkflowEngine;
use crate::transport::{
    DurableTransport, LocalTransport, SendOptions, TransportHandle, TransportKind,
    TransportRegistry,
};
use bon::bon;
use futures_util::future::{join_all, try_join_all};
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct EventService {
    event_registry: EventRegistry,
    transport_registry: TransportRegistry,
    consumers: Arc<ConsumerRegistry>,
    transports: BTreeMap<TransportKind, TransportHandle>,
}

#[bon]
impl EventService {
    /// 装配服务；仅在提供工作流引擎时装配持久化传输
    #[builder]
    pub fn new(
        event_registry: EventRegistry,
        transport_registry: TransportRegistry,
        engine: Option<Arc<dyn WorkflowEngine>>,
    ) -> Self {
        for event_name in transport_registry.event_names() {
            if !event_registry.contains(event_name) {
                warn!(event_name, "transport configured for unregistered event");
            }
        }

        let consumers = Arc::new(ConsumerRegistry::new());
        let mut transports = BTreeMap::new();
        transports.insert(
            TransportKind::Local,
            TransportHandle::Local(Arc::new(LocalTransport::new(consumers.clone()))),
        );
        if let Some(engine) = engine {
            let durable = DurableTransport::new(engine, consumers.clone(), &transport_registry);
            transports.insert(TransportKind::Durable, TransportHandle::Durable(Arc::new(durable)));
        }

        debug!(
            events = event_registry.len(),
            transports = ?transports.keys().collect::<Vec<_>>(),
            "event service assembled"
        );

        Self {
            event_registry,
            transport_registry,
            consumers,
            transports,
        }
    }
}

impl EventService {
    pub fn subscribe<F, Fut>(&self, event_name: impl Into<String>, consumer: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.consumers.subscribe(event_name, consumer);
    }

    /// 以强类型载荷订阅；载荷无法反序列化时该次消费失败
    pub fn subscribe_event<E, F, Fut>(&self, consumer: F)
    where
        E: Event,
        F: Fn(E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let consumer = Arc::new(consumer);
        self.consumers.subscribe(E::NAME, move |payload| {
            let consumer = consumer.clone();
            async move {
                let event: E = serde_json::from_value(payload)?;
                consumer(event).await
            }
        });
    }

    pub async fn send(
        &self,
        event_name: &str,
        payload: Value,
        options: Option<&SendOptions>,
    ) -> SendEventResult {
        if !self.event_registry.validate_event(event_name, &payload) {
            warn!(event_name, "invalid event");
            return SendEventResult::empty();
        }

        let configs = self
            .transport_registry
            .get_transport_configs_by_event(event_name);
        if configs.is_empty() {
            warn!(event_name, "no transport for event");
            return SendEventResult::empty();
        }

        let payload = &payload;
        let dispatches = configs.into_iter().filter_map(|(kind, config)| {
            let Some(handle) = self.transports.get(&kind) else {
                warn!(event_name, transport = %kind, "transport not found");
                return None;
            };
            Some(async move {
                let outcome = handle.send(event_name, payload, config, options).await;
                if let Err(err) = &outcome {
                    warn!(event_name, transport = %kind, error = %err, "transport send failed");
                }
                (kind, outcome)
            })
        });

        SendEventResult::from_outcomes(join_all(dispatches).await)
    }

    /// 发送强类型事件；载荷无法序列化时按校验失败处理
    pub async fn send_event<E: Event>(
        &self,
        event: &E,
        options: Option<&SendOptions>,
    ) -> SendEventResult {
        match serde_json::to_value(event) {
            Ok(payload) => self.send(E::NAME, payload, options).await,
            Err(err) => {
                warn!(event_name = E::NAME, error = %err, "invalid event");
                SendEventResult::empty()
            }
        }
    }

    /// 逐条并发发送，结果与输入一一对应
    pub async fn send_many(&self, event_name: &str, payloads: Vec<Value>) -> Vec<SendEventResult> {
        join_all(
            payloads
                .into_iter()
                .map(|payload| self.send(event_name, payload, None)),
        )
        .await
    }

    pub fn get_event_registry(&self) -> &EventRegistry {
        &self.event_registry
    }

    pub fn transport_registry(&self) -> &TransportRegistry {
        &self.transport_registry
    }

    pub fn consumer_registry(&self) -> &Arc<ConsumerRegistry> {
        &self.consumers
    }

    pub fn get_transport(&self, transport: TransportKind) -> DispatchResult<&TransportHandle> {
        self.transports
            .get(&transport)
            .ok_or_else(|| DispatchError::TransportNotFound {
                transport: transport.to_string(),
            })
    }

    pub fn durable_transport(&self) -> Option<&Arc<DurableTransport>> {
        self.transports
            .get(&TransportKind::Durable)
            .and_then(TransportHandle::as_durable)
    }

    pub async fn start_workers(&self) -> DispatchResult<()> {
        try_join_all(self.transports.values().map(|t| t.start())).await?;
        debug!("transport workers started");
        Ok(())
    }

    pub async fn stop_workers(&self) -> DispatchResult<()> {
        try_join_all(self.transports.values().map(|t| t.stop())).await?;
        debug!("transport workers stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{DurableEventConfig, LocalEventConfig};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn local_service(events: &[&str]) -> EventService {
        let mut event_registry = EventRegistry::new();
        let mut transport_registry = TransportRegistry::new();
        for event in events {
            event_registry = event_registry.register_event(*event, Default::default());
            transport_registry.configure_event_transport(*event, LocalEventConfig);
        }
        EventService::builder()
            .event_registry(event_registry)
            .transport_registry(transport_registry)
            .build()
    }

    #[tokio::test]
    async fn unregistered_event_is_dropped() {
        let service = local_service(&["KNOWN"]);
        let result = service.send("UNKNOWN", json!({}), None).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn event_without_transport_is_dropped() {
        let service = EventService::builder()
            .event_registry(EventRegistry::new().register_event("LONELY", Default::default()))
            .transport_registry(TransportRegistry::new())
            .build();
        assert!(service.send("LONELY", json!({}), None).await.is_empty());
    }

    #[tokio::test]
    async fn durable_config_without_engine_is_skipped() {
        let mut transport_registry = TransportRegistry::new();
        transport_registry
            .configure_event_transport("A", LocalEventConfig)
            .configure_event_transport("A", DurableEventConfig::default());
        let service = EventService::builder()
            .event_registry(EventRegistry::new().register_event("A", Default::default()))
            .transport_registry(transport_registry)
            .build();

        let result = service.send("A", json!({}), None).await;
        assert_eq!(result.transports().collect::<Vec<_>>(), vec![TransportKind::Local]);
        assert!(service.get_transport(TransportKind::Durable).is_err());
        assert!(service.durable_transport().is_none());
    }

    #[tokio::test]
    async fn send_many_delivers_each_payload() {
        let service = local_service(&["COUNT"]);
        let seen = Arc::new(AtomicUsize::new(0));
        {
            let seen = seen.clone();
            service.subscribe("COUNT", move |payload| {
                let seen = seen.clone();
                async move {
                    let n = payload["n"].as_u64().unwrap_or(0) as usize;
                    seen.fetch_add(n, Ordering::SeqCst);
                    Ok(())
                }
            });
        }

        let results = service
            .send_many("COUNT", vec![json!({"n": 1}), json!({"n": 2}), json!({"n": 3})])
            .await;
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(SendEventResult::is_delivered));
        assert_eq!(seen.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn workers_start_and_stop() {
        let service = local_service(&["A"]);
        service.start_workers().await.unwrap();
        service.stop_workers().await.unwrap();
    }
}
