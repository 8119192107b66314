//! 事件注册表（EventRegistry）
//!
//! 只增不减：每次注册都消费旧表并返回扩展后的新表，重复注册同名事件时后者覆盖前者。
//! 校验从不报错，未知事件或不合法载荷统一返回 `false`。
//!
use super::{Event, PayloadDefinition};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

#[derive(Clone, Debug, Default)]
pub struct EventRegistry {
    events: HashMap<String, PayloadDefinition>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册事件，返回包含该事件的新注册表
    pub fn register_event(mut self, name: impl Into<String>, definition: PayloadDefinition) -> Self {
        self.events.insert(name.into(), definition);
        self
    }

    /// 以 `E::NAME` 注册类型化事件
    pub fn register<E: Event>(self) -> Self {
        self.register_event(E::NAME, E::definition())
    }

    /// 合并另一张注册表，同名事件以 `other` 为准
    pub fn register_events(mut self, other: EventRegistry) -> Self {
        self.events.extend(other.events);
        self
    }

    pub fn validate_event(&self, name: &str, payload: &Value) -> bool {
        let Some(definition) = self.events.get(name) else {
            return false;
        };
        let Some(schema) = definition.schema() else {
            return true;
        };

        match schema.validate(payload) {
            Ok(()) => true,
            Err(violation) => {
                debug!(event_name = name, %violation, "payload rejected by schema");
                false
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.events.contains_key(name)
    }

    pub fn definition(&self, name: &str) -> Option<&PayloadDefinition> {
        self.events.get(name)
    }

    pub fn event_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.events.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
