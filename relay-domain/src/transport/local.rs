//! 本地传输（LocalTransport）
//!
//! 在调用方的 `send` 内直接扇出到全部消费者并等待其全部结束；
//! 没有后台循环，`start`/`stop` 为空操作。
//!
use super::{Transport, TransportKind};
use crate::consumer::ConsumerRegistry;
use crate::error::{DispatchError, DispatchResult};
use async_trait::async_trait;
use futures_util::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

/// 本地传输的事件配置（无可配置项）
#[derive(Clone, Debug, Default)]
pub struct LocalEventConfig;

/// 本地投递结果
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocalDelivery {
    /// 实际调用的消费者数量
    pub consumers: usize,
}

pub struct LocalTransport {
    consumers: Arc<ConsumerRegistry>,
}

impl LocalTransport {
    pub fn new(consumers: Arc<ConsumerRegistry>) -> Self {
        Self { consumers }
    }
}

#[async_trait]
impl Transport for LocalTransport {
    type EventConfig = LocalEventConfig;
    type Options = ();
    type Receipt = LocalDelivery;

    fn kind(&self) -> TransportKind {
        TransportKind::Local
    }

    async fn send(
        &self,
        event_name: &str,
        payload: &Value,
        _config: &LocalEventConfig,
        _options: Option<&()>,
    ) -> DispatchResult<LocalDelivery> {
        let consumers = self
            .consumers
            .get_event_consumers(event_name)
            .unwrap_or_default();
        if consumers.is_empty() {
            trace!(event_name, "no local consumer");
            return Ok(LocalDelivery { consumers: 0 });
        }

        run_consumers(event_name, payload, &consumers).await?;
        Ok(LocalDelivery {
            consumers: consumers.len(),
        })
    }

    async fn start(&self) -> DispatchResult<()> {
        Ok(())
    }

    async fn stop(&self) -> DispatchResult<()> {
        Ok(())
    }
}

/// 并发执行全部消费者并等待全部结束；任一失败则整体失败
pub(crate) async fn run_consumers(
    event_name: &str,
    payload: &Value,
    consumers: &[crate::consumer::EventConsumer],
) -> DispatchResult<()> {
    let outcomes = join_all(consumers.iter().map(|c| c(payload.clone()))).await;

    let total = outcomes.len();
    let mut errors = outcomes.into_iter().filter_map(Result::err);
    let Some(first) = errors.next() else {
        return Ok(());
    };

    Err(DispatchError::ConsumerFailed {
        event_name: event_name.to_string(),
        failed: 1 + errors.count(),
        total,
        reason: format!("{first:#}"),
    })
}
