//! 事件分发层统一错误定义
//!
//! 数据形态问题（未知事件、校验失败、未配置传输）按设计降级为“未投递”，
//! 不会以错误形式出现；这里只收敛装配错误、消费者失败与引擎交互失败。
//!
use crate::transport::TransportKind;
use thiserror::Error;

/// 统一错误类型
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DispatchError {
    // --- 装配 ---
    #[error("transport not found: {transport}")]
    TransportNotFound { transport: String },
    #[error("durable function not found: {function_id}")]
    FunctionNotFound { function_id: String },
    #[error("transport mismatch: transport={transport}, config={config}")]
    TransportMismatch {
        transport: TransportKind,
        config: TransportKind,
    },

    // --- 投递 ---
    #[error("consumer failed: event={event_name}, failed={failed}/{total}, reason={reason}")]
    ConsumerFailed {
        event_name: String,
        failed: usize,
        total: usize,
        reason: String,
    },
    #[error("workflow engine error: {reason}")]
    Engine { reason: String },
    #[error("invalid delay: {reason}")]
    InvalidDelay { reason: String },

    // --- 序列化 ---
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
}

/// 统一 Result 类型别名
pub type DispatchResult<T> = Result<T, DispatchError>;

impl DispatchError {
    pub fn engine(reason: impl Into<String>) -> Self {
        DispatchError::Engine {
            reason: reason.into(),
        }
    }
}

impl From<humantime::DurationError> for DispatchError {
    fn from(err: humantime::DurationError) -> Self {
        DispatchError::InvalidDelay {
            reason: err.to_string(),
        }
    }
}

#[cfg(feature = "http-engine")]
impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        DispatchError::Engine {
            reason: err.to_string(),
        }
    }
}
