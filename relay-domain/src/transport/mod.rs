//! 传输（Transport）
//!
//! 统一的投递策略协议（`send` / `start` / `stop`）及其封闭集合：
//! - `LocalTransport`：进程内直接扇出到消费者；
//! - `DurableTransport`：经由外部工作流引擎的持久化投递。
//!
//! 事件服务只与 `TransportHandle` 打交道，新增传输时由穷尽匹配保证所有分派点被覆盖。
//!
pub mod durable;
pub mod local;
mod registry;

pub use durable::{DurableEventConfig, DurableReceipt, DurableSendOptions, DurableTransport};
pub use local::{LocalDelivery, LocalEventConfig, LocalTransport};
pub use registry::TransportRegistry;

use crate::error::{DispatchError, DispatchResult};
use crate::result::TransportReceipt;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// 传输名称（封闭集合）
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Local,
    Durable,
}

impl TransportKind {
    pub const ALL: [TransportKind; 2] = [TransportKind::Local, TransportKind::Durable];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Local => "local",
            TransportKind::Durable => "durable",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransportKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| DispatchError::TransportNotFound {
                transport: s.to_string(),
            })
    }
}

/// 投递策略协议
#[async_trait]
pub trait Transport: Send + Sync {
    /// 每个事件在该传输上的配置（由 `TransportRegistry` 保存）
    type EventConfig: Send + Sync;
    /// 单次发送时的传输专属选项
    type Options: Send + Sync;
    /// 发送成功后的传输专属返回值
    type Receipt: Send;

    fn kind(&self) -> TransportKind;

    async fn send(
        &self,
        event_name: &str,
        payload: &Value,
        config: &Self::EventConfig,
        options: Option<&Self::Options>,
    ) -> DispatchResult<Self::Receipt>;

    async fn start(&self) -> DispatchResult<()>;

    async fn stop(&self) -> DispatchResult<()>;
}

/// 某事件在某传输上的配置
#[derive(Clone, Debug)]
pub enum TransportConfig {
    Local(LocalEventConfig),
    Durable(DurableEventConfig),
}

impl TransportConfig {
    pub fn kind(&self) -> TransportKind {
        match self {
            TransportConfig::Local(_) => TransportKind::Local,
            TransportConfig::Durable(_) => TransportKind::Durable,
        }
    }

    pub fn as_durable(&self) -> Option<&DurableEventConfig> {
        match self {
            TransportConfig::Durable(config) => Some(config),
            TransportConfig::Local(_) => None,
        }
    }
}

impl From<LocalEventConfig> for TransportConfig {
    fn from(config: LocalEventConfig) -> Self {
        TransportConfig::Local(config)
    }
}

impl From<DurableEventConfig> for TransportConfig {
    fn from(config: DurableEventConfig) -> Self {
        TransportConfig::Durable(config)
    }
}

/// 单次发送的选项，按传输区分；本地传输没有可选项
#[derive(Clone, Debug, Default)]
pub struct SendOptions {
    durable: Option<DurableSendOptions>,
}

impl SendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn durable(mut self, options: DurableSendOptions) -> Self {
        self.durable = Some(options);
        self
    }

    pub fn for_durable(&self) -> Option<&DurableSendOptions> {
        self.durable.as_ref()
    }
}

/// 已装配的传输实现
#[derive(Clone)]
pub enum TransportHandle {
    Local(Arc<LocalTransport>),
    Durable(Arc<DurableTransport>),
}

impl TransportHandle {
    pub fn kind(&self) -> TransportKind {
        match self {
            TransportHandle::Local(_) => TransportKind::Local,
            TransportHandle::Durable(_) => TransportKind::Durable,
        }
    }

    pub fn as_local(&self) -> Option<&Arc<LocalTransport>> {
        match self {
            TransportHandle::Local(t) => Some(t),
            TransportHandle::Durable(_) => None,
        }
    }

    pub fn as_durable(&self) -> Option<&Arc<DurableTransport>> {
        match self {
            TransportHandle::Durable(t) => Some(t),
            TransportHandle::Local(_) => None,
        }
    }

    /// 将配置与选项分派给对应的传输实现
    pub async fn send(
        &self,
        event_name: &str,
        payload: &Value,
        config: &TransportConfig,
        options: Option<&SendOptions>,
    ) -> DispatchResult<TransportReceipt> {
        match (self, config) {
            (TransportHandle::Local(t), TransportConfig::Local(c)) => t
                .send(event_name, payload, c, None)
                .await
                .map(TransportReceipt::Local),
            (TransportHandle::Durable(t), TransportConfig::Durable(c)) => t
                .send(
                    event_name,
                    payload,
                    c,
                    options.and_then(SendOptions::for_durable),
                )
                .await
                .map(TransportReceipt::Durable),
            (handle, config) => Err(DispatchError::TransportMismatch {
                transport: handle.kind(),
                config: config.kind(),
            }),
        }
    }

    pub async fn start(&self) -> DispatchResult<()> {
        match self {
            TransportHandle::Local(t) => t.start().await,
            TransportHandle::Durable(t) => t.start().await,
        }
    }

    pub async fn stop(&self) -> DispatchResult<()> {
        match self {
            TransportHandle::Local(t) => t.stop().await,
            TransportHandle::Durable(t) => t.stop().await,
        }
    }
}
