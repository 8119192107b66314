//! 内存版工作流引擎（InMemoryEngine）
//!
//! 满足 `WorkflowEngine` 协议的轻量实现：
//! - `send`：记录事件信封，相同幂等 ID 的重复提交被忽略；
//! - `run_pending`：把已接收的事件交给对应的持久化函数执行，失败时按函数的 `retries` 重试；
//! - 典型用途：测试环境、示例与本地开发。
//!
//! 注意：该实现不具备持久性，进程退出后未执行的事件即丢失。
//! 已接收的事件（`sent`）与幂等 ID 集合在 `run_pending` 之后仍然保留，只增不减，
//! 长时间运行的进程会持续占用内存，因此只适合测试与本地开发。

use super::{DeliveryReport, DurableFunction, DurableTransport, EngineEvent, StepRunner, WorkflowEngine};
use crate::error::{DispatchError, DispatchResult};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

/// 一次函数执行的记录
#[derive(Debug)]
pub struct InvocationRecord {
    pub function_id: String,
    pub event: EngineEvent,
    /// 实际执行次数（首次 + 重试）
    pub attempts: u32,
    pub outcome: DispatchResult<DeliveryReport>,
}

#[derive(Default)]
struct EngineState {
    accepted: Vec<EngineEvent>,
    pending: Vec<EngineEvent>,
    seen_ids: HashSet<String>,
}

#[derive(Default)]
pub struct InMemoryEngine {
    state: Mutex<EngineState>,
    seq: AtomicUsize,
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已接收的全部事件（含已执行的）
    pub fn sent(&self) -> Vec<EngineEvent> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .accepted
            .clone()
    }

    pub fn pending_len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pending
            .len()
    }

    /// 执行全部待处理事件，返回每次函数执行的记录
    pub async fn run_pending(
        &self,
        transport: &DurableTransport,
        steps: &dyn StepRunner,
    ) -> Vec<InvocationRecord> {
        let pending = std::mem::take(
            &mut self
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pending,
        );

        let mut records = Vec::with_capacity(pending.len());
        for event in pending {
            let function_id = DurableFunction::function_id(&event.name);
            let Some(function) = transport.function(&function_id) else {
                warn!(event_name = %event.name, "no durable function for event");
                records.push(InvocationRecord {
                    function_id: function_id.clone(),
                    event,
                    attempts: 0,
                    outcome: Err(DispatchError::FunctionNotFound { function_id }),
                });
                continue;
            };

            let (attempts, outcome) = Self::invoke_with_retries(function, &event, steps).await;
            records.push(InvocationRecord {
                function_id,
                event,
                attempts,
                outcome,
            });
        }
        records
    }

    async fn invoke_with_retries(
        function: &DurableFunction,
        event: &EngineEvent,
        steps: &dyn StepRunner,
    ) -> (u32, DispatchResult<DeliveryReport>) {
        let max_attempts = function.config().retries().saturating_add(1);
        let mut attempts = 0;
        loop {
            attempts += 1;
            match function.invoke(event, steps).await {
                Ok(report) => return (attempts, Ok(report)),
                Err(err) if attempts < max_attempts => {
                    debug!(function_id = function.id(), attempts, error = %err, "retrying invocation");
                }
                Err(err) => return (attempts, Err(err)),
            }
        }
    }
}

#[async_trait]
impl WorkflowEngine for InMemoryEngine {
    async fn send(&self, event: &EngineEvent) -> DispatchResult<Vec<String>> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let id = match &event.id {
            Some(id) => {
                if !state.seen_ids.insert(id.clone()) {
                    debug!(event_name = %event.name, id, "duplicate event id ignored");
                    return Ok(vec![id.clone()]);
                }
                id.clone()
            }
            None => format!("mem-{}", self.seq.fetch_add(1, Ordering::Relaxed) + 1),
        };

        state.accepted.push(event.clone());
        state.pending.push(event.clone());
        Ok(vec![id])
    }
}
