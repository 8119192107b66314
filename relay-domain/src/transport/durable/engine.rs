//! 外部工作流引擎协议（WorkflowEngine）
//!
//! 持久化传输只依赖引擎的一个能力：接收事件信封并返回引擎分配的事件 ID。
//! 调度、重试、节流与可恢复的休眠都由引擎自身负责。
//!
use super::DurableSendOptions;
use crate::error::DispatchResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 提交给引擎的事件信封：`{ id?, name, data: { payload, options } }`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineEvent {
    /// 幂等 ID；相同 ID 的重复提交由引擎去重
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub data: EngineEventData,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineEventData {
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub options: Option<DurableSendOptions>,
}

impl EngineEvent {
    pub fn new(
        name: impl Into<String>,
        payload: Value,
        options: Option<DurableSendOptions>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            data: EngineEventData { payload, options },
        }
    }

    pub fn with_id(mut self, id: Option<String>) -> Self {
        self.id = id;
        self
    }
}

/// 工作流引擎
#[async_trait]
pub trait WorkflowEngine: Send + Sync {
    /// 提交事件，返回引擎为其分配的事件 ID
    async fn send(&self, event: &EngineEvent) -> DispatchResult<Vec<String>>;
}

#[cfg(feature = "http-engine")]
pub use http::{EngineClientConfig, HttpEngineClient};

#[cfg(feature = "http-engine")]
mod http {
    use super::{EngineEvent, WorkflowEngine};
    use crate::error::{DispatchError, DispatchResult};
    use async_trait::async_trait;
    use bon::Builder;
    use reqwest::StatusCode;
    use serde::Deserialize;
    use std::time::Duration;
    use tracing::{debug, warn};

    /// HTTP 引擎客户端配置
    #[derive(Builder, Clone, Debug)]
    pub struct EngineClientConfig {
        /// 引擎地址，如 `https://inn.gs` 或本地开发服务 `http://localhost:8288`
        #[builder(into)]
        base_url: String,
        /// 事件密钥，作为事件入口路径的一部分
        #[builder(into)]
        event_key: String,
        /// 单次请求超时
        #[builder(default = Duration::from_secs(10))]
        timeout: Duration,
    }

    impl EngineClientConfig {
        pub fn endpoint(&self) -> String {
            format!(
                "{}/e/{}",
                self.base_url.trim_end_matches('/'),
                self.event_key
            )
        }

        pub fn timeout(&self) -> Duration {
            self.timeout
        }
    }

    #[derive(Debug, Deserialize)]
    struct SendResponse {
        #[serde(default)]
        ids: Vec<String>,
        #[serde(default)]
        error: Option<String>,
    }

    /// 通过事件入口 `POST {base_url}/e/{event_key}` 提交事件
    pub struct HttpEngineClient {
        client: reqwest::Client,
        endpoint: String,
    }

    impl HttpEngineClient {
        pub fn new(config: &EngineClientConfig) -> DispatchResult<Self> {
            let client = reqwest::Client::builder()
                .timeout(config.timeout())
                .build()?;
            Ok(Self {
                client,
                endpoint: config.endpoint(),
            })
        }
    }

    #[async_trait]
    impl WorkflowEngine for HttpEngineClient {
        async fn send(&self, event: &EngineEvent) -> DispatchResult<Vec<String>> {
            let response = self.client.post(&self.endpoint).json(event).send().await?;
            let status = response.status();
            let body = response.text().await?;

            let ids = decode_response(status, &body).inspect_err(|err| {
                warn!(event_name = %event.name, %status, error = %err, "engine rejected event");
            })?;
            debug!(event_name = %event.name, ?ids, "event accepted by engine");
            Ok(ids)
        }
    }

    /// 解析事件入口的响应：非 2xx 与带 `error` 字段的响应体都视为失败
    fn decode_response(status: StatusCode, body: &str) -> DispatchResult<Vec<String>> {
        if !status.is_success() {
            return Err(DispatchError::engine(format!("HTTP {status}: {body}")));
        }
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        let body: SendResponse = serde_json::from_str(body)?;
        match body.error {
            Some(error) => Err(DispatchError::engine(error)),
            None => Ok(body.ids),
        }
    }

}
