//! 事件分发层（relay-domain）
//!
//! 将“有哪些事件、携带什么载荷”与“如何投递”“由谁消费”三者解耦：
//! - 事件注册表（`event`）：事件名到载荷定义的映射，以及可选的载荷校验；
//! - 传输配置表（`transport::TransportRegistry`）：(事件, 传输) 到传输专属配置；
//! - 消费者注册表（`consumer`）：事件名到订阅回调列表；
//! - 传输实现（`transport`）：进程内同步投递 `LocalTransport` 与
//!   经由外部工作流引擎的持久化投递 `DurableTransport`；
//! - 事件服务（`service`）：校验 → 解析传输 → 并发分发 → 汇总结果（`result`）。
//!
//! 典型用法：
//! 1. 通过 `EventRegistry::register_event` 声明事件与可选 schema；
//! 2. 通过 `TransportRegistry::configure_event_transport` 为事件配置一个或多个传输；
//! 3. 用 `EventService::builder()` 构建服务，启动时完成全部 `subscribe`；
//! 4. 运行期调用 `send` / `send_many`，按 `SendEventResult` 读取各传输结果。
//!
pub mod consumer;
pub mod error;
pub mod event;
pub mod result;
pub mod service;
pub mod transport;

pub use consumer::{ConsumerRegistry, EventConsumer};
pub use error::{DispatchError, DispatchResult};
pub use event::{Event, EventRegistry, PayloadDefinition};
pub use result::{SendEventResult, TransportReceipt};
pub use service::EventService;
pub use transport::{
    SendOptions, Transport, TransportConfig, TransportHandle, TransportKind, TransportRegistry,
};

// 允许在本 crate 内部通过 ::relay_domain 进行自引用，
// 以便过程宏在本 crate 的测试中也能解析到 ::relay_domain 路径。
extern crate self as relay_domain;
