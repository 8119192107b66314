//! 发送结果（SendEventResult）
//!
//! 一次 `send` 在每个被尝试的传输上各有一条结果。空结果表示事件未被投递：
//! 校验失败、事件未配置任何传输，或配置的传输均未装配。
//!
use crate::error::{DispatchError, DispatchResult};
use crate::transport::{DurableReceipt, LocalDelivery, TransportKind};
use std::collections::BTreeMap;

/// 各传输成功发送后的返回值
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportReceipt {
    Local(LocalDelivery),
    Durable(DurableReceipt),
}

#[derive(Debug, Default)]
pub struct SendEventResult {
    results: BTreeMap<TransportKind, DispatchResult<TransportReceipt>>,
}

impl SendEventResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_outcomes(
        outcomes: impl IntoIterator<Item = (TransportKind, DispatchResult<TransportReceipt>)>,
    ) -> Self {
        Self {
            results: outcomes.into_iter().collect(),
        }
    }

    /// 被尝试的传输，按名称排序
    pub fn transports(&self) -> impl Iterator<Item = TransportKind> + '_ {
        self.results.keys().copied()
    }

    pub fn get(&self, transport: TransportKind) -> Option<&DispatchResult<TransportReceipt>> {
        self.results.get(&transport)
    }

    pub fn local(&self) -> Option<&LocalDelivery> {
        match self.results.get(&TransportKind::Local)? {
            Ok(TransportReceipt::Local(delivery)) => Some(delivery),
            _ => None,
        }
    }

    pub fn durable(&self) -> Option<&DurableReceipt> {
        match self.results.get(&TransportKind::Durable)? {
            Ok(TransportReceipt::Durable(receipt)) => Some(receipt),
            _ => None,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = (TransportKind, &DispatchError)> + '_ {
        self.results
            .iter()
            .filter_map(|(kind, result)| result.as_ref().err().map(|err| (*kind, err)))
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// 至少尝试了一个传输且全部成功
    pub fn is_delivered(&self) -> bool {
        !self.results.is_empty() && self.results.values().all(Result::is_ok)
    }
}
