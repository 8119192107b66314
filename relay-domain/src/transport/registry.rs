//! 传输配置表（TransportRegistry）
//!
//! 以 (事件名, 传输) 为键保存传输专属配置，同一键后写覆盖先写。
//! 仅在启动装配阶段写入；运行期只读。
//!
use super::{DurableEventConfig, TransportConfig, TransportKind};
use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Debug, Default)]
pub struct TransportRegistry {
    configs_by_event: HashMap<String, BTreeMap<TransportKind, TransportConfig>>,
}

impl TransportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为事件配置一个传输；传输由配置的变体决定
    pub fn configure_event_transport(
        &mut self,
        event_name: impl Into<String>,
        config: impl Into<TransportConfig>,
    ) -> &mut Self {
        let config = config.into();
        self.configs_by_event
            .entry(event_name.into())
            .or_default()
            .insert(config.kind(), config);
        self
    }

    pub fn get_transport_config_by_event(
        &self,
        event_name: &str,
        transport: TransportKind,
    ) -> Option<&TransportConfig> {
        self.configs_by_event
            .get(event_name)
            .and_then(|configs| configs.get(&transport))
    }

    /// 某事件配置的全部传输；未配置时为空
    pub fn get_transport_configs_by_event(
        &self,
        event_name: &str,
    ) -> BTreeMap<TransportKind, &TransportConfig> {
        self.configs_by_event
            .get(event_name)
            .map(|configs| configs.iter().map(|(k, c)| (*k, c)).collect())
            .unwrap_or_default()
    }

    /// 某传输需要承载的全部事件及其配置
    pub fn get_transport_configs_by_transport(
        &self,
        transport: TransportKind,
    ) -> BTreeMap<&str, &TransportConfig> {
        self.configs_by_event
            .iter()
            .filter_map(|(event, configs)| {
                configs
                    .get(&transport)
                    .map(|config| (event.as_str(), config))
            })
            .collect()
    }

    pub fn durable_configs(&self) -> BTreeMap<&str, &DurableEventConfig> {
        self.get_transport_configs_by_transport(TransportKind::Durable)
            .into_iter()
            .filter_map(|(event, config)| config.as_durable().map(|c| (event, c)))
            .collect()
    }

    pub fn event_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.configs_by_event.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::LocalEventConfig;

    #[test]
    fn unconfigured_event_resolves_to_empty_mapping() {
        let registry = TransportRegistry::new();
        assert!(registry.get_transport_configs_by_event("NONE").is_empty());
        assert!(
            registry
                .get_transport_config_by_event("NONE", TransportKind::Local)
                .is_none()
        );
    }

    #[test]
    fn lookup_by_event_and_by_transport() {
        let mut registry = TransportRegistry::new();
        registry
            .configure_event_transport("A", LocalEventConfig::default())
            .configure_event_transport("A", DurableEventConfig::default())
            .configure_event_transport("B", DurableEventConfig::default());

        let by_event = registry.get_transport_configs_by_event("A");
        assert_eq!(
            by_event.keys().copied().collect::<Vec<_>>(),
            vec![TransportKind::Local, TransportKind::Durable]
        );

        let durable = registry.get_transport_configs_by_transport(TransportKind::Durable);
        assert_eq!(durable.keys().copied().collect::<Vec<_>>(), vec!["A", "B"]);

        let local = registry.get_transport_configs_by_transport(TransportKind::Local);
        assert_eq!(local.keys().copied().collect::<Vec<_>>(), vec!["A"]);
    }

    #[test]
    fn last_write_wins_per_pair() {
        let mut registry = TransportRegistry::new();
        registry
            .configure_event_transport("A", DurableEventConfig::default())
            .configure_event_transport("A", DurableEventConfig::builder().retries(3).build());

        let configs = registry.durable_configs();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs["A"].retries(), 3);
    }
}
