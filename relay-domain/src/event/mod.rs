//! 事件定义（Event）与事件注册表
//!
//! 载荷在分发层内部统一以 `serde_json::Value` 流转；`Event` trait 为具体的
//! 载荷结构体提供稳定事件名与载荷定义，作为运行时映射之上的类型化门面。

mod registry;
mod schema;

pub use registry::EventRegistry;
pub use schema::{FieldKind, ObjectSchema, PayloadSchema, SchemaViolation, TypedSchema};

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;

/// 类型化事件载荷
///
/// - `NAME`：事件的稳定名称，用于注册、路由与持久化函数命名，避免依赖 `type_name::<T>()`；
/// - `definition`：默认不带 schema，可覆写为 `PayloadDefinition::typed::<Self>()`。
pub trait Event: Serialize + DeserializeOwned + Send + Sync + 'static {
    const NAME: &'static str;

    fn definition() -> PayloadDefinition {
        PayloadDefinition::new()
    }
}

/// 载荷定义：描述事件载荷，并可携带一个校验 schema
#[derive(Clone, Default)]
pub struct PayloadDefinition {
    schema: Option<Arc<dyn PayloadSchema>>,
}

impl PayloadDefinition {
    /// 不带 schema 的定义：任意载荷均视为合法
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(schema: impl PayloadSchema + 'static) -> Self {
        Self {
            schema: Some(Arc::new(schema)),
        }
    }

    /// 以载荷类型本身作为 schema：载荷必须能反序列化为 `T`
    pub fn typed<T>() -> Self
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        Self::with_schema(TypedSchema::<T>::new())
    }

    pub fn schema(&self) -> Option<&dyn PayloadSchema> {
        self.schema.as_deref()
    }

    pub fn has_schema(&self) -> bool {
        self.schema.is_some()
    }
}

impl fmt::Debug for PayloadDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayloadDefinition")
            .field("schema", &self.schema.as_ref().map(|s| s.describe()))
            .finish()
    }
}
