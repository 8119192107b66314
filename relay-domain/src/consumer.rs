//! 消费者注册表（ConsumerRegistry）
//!
//! 事件名到订阅回调列表的映射。订阅是永久的：不去重、不提供退订；
//! 同一事件的所有消费者各自收到同一份载荷（观察者扇出，而非竞争消费）。
//!
use dashmap::DashMap;
use futures_core::future::BoxFuture;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// 事件消费者：接收载荷的异步回调
pub type EventConsumer = Arc<dyn Fn(Value) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

#[derive(Default)]
pub struct ConsumerRegistry {
    consumers: DashMap<String, Vec<EventConsumer>>,
}

impl ConsumerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加订阅；注册顺序被保留，但执行顺序不作保证
    pub fn subscribe<F, Fut>(&self, event_name: impl Into<String>, consumer: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let consumer: EventConsumer =
            Arc::new(move |payload| -> BoxFuture<'static, anyhow::Result<()>> {
                Box::pin(consumer(payload))
            });
        self.subscribe_consumer(event_name, consumer);
    }

    pub fn subscribe_consumer(&self, event_name: impl Into<String>, consumer: EventConsumer) {
        self.consumers
            .entry(event_name.into())
            .or_default()
            .push(consumer);
    }

    /// 返回某事件的消费者快照；从未订阅过的事件返回 `None`
    pub fn get_event_consumers(&self, event_name: &str) -> Option<Vec<EventConsumer>> {
        self.consumers.get(event_name).map(|list| list.clone())
    }

    pub fn consumer_count(&self, event_name: &str) -> usize {
        self.consumers
            .get(event_name)
            .map(|list| list.len())
            .unwrap_or(0)
    }
}
