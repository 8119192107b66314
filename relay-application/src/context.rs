use crate::catalog;
use crate::config::AppConfig;
use crate::error::AppResult;
use relay_domain::EventService;
use relay_domain::transport::durable::{FunctionManifest, HttpEngineClient, WorkflowEngine};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// 向引擎注册函数时提交的文档：应用标识与全部持久化函数
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionRegistration {
    pub app_id: String,
    pub functions: Vec<FunctionManifest>,
}

/// 应用层上下文（Application Context）
///
/// 持有配置与装配完成的事件服务，是应用代码发送与订阅事件的唯一入口：
/// - `bootstrap`：按配置创建 HTTP 引擎客户端并装配事件服务；
/// - `with_engine`：注入任意引擎实现（测试中使用 `InMemoryEngine`）；
/// - `functions`：持久化函数清单；
/// - `registration`：带 `ENGINE_APP_ID` 的注册文档，供引擎注册端点返回。
///
/// 典型用法：
/// ```rust,no_run
/// use relay_application::{AppConfig, AppContext};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let ctx = AppContext::bootstrap(AppConfig::from_env()?)?;
/// for function in ctx.functions() {
///     println!("{}", function.id);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AppContext {
    config: AppConfig,
    events: Arc<EventService>,
}

impl AppContext {
    pub fn bootstrap(config: AppConfig) -> AppResult<Self> {
        let client = HttpEngineClient::new(&config.engine.client_config())?;
        Ok(Self::with_engine(config, Arc::new(client)))
    }

    pub fn with_engine(config: AppConfig, engine: Arc<dyn WorkflowEngine>) -> Self {
        let events = EventService::builder()
            .event_registry(catalog::event_registry())
            .transport_registry(catalog::transport_registry())
            .engine(engine)
            .build();

        info!(
            env = %config.env,
            app_id = %config.engine.app_id,
            events = events.get_event_registry().len(),
            "application context ready"
        );

        Self {
            config,
            events: Arc::new(events),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn events(&self) -> &Arc<EventService> {
        &self.events
    }

    pub fn functions(&self) -> Vec<FunctionManifest> {
        self.events
            .durable_transport()
            .map(|transport| transport.manifests())
            .unwrap_or_default()
    }

    pub fn registration(&self) -> FunctionRegistration {
        FunctionRegistration {
            app_id: self.config.engine.app_id.clone(),
            functions: self.functions(),
        }
    }
}
