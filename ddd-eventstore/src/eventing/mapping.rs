//! 事件到监听器的映射（EventToListenerMapping）
//!
//! 一条映射把一个事件类型关联到一个监听器，并携带投递配置（`queueName`、
//! `queueOptions` 等）。映射表由外部提供者按事件存储给出，核心逻辑只读。
//!
use crate::{
    error::DomainResult as Result,
    eventing::EventListener,
    value_object::{EventStoreId, ListenerId},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::slice::Iter;
use std::sync::RwLock;

/// 映射配置：不透明的 JSON 对象
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingOptions(Map<String, Value>);

impl MappingOptions {
    pub const QUEUE_NAME: &'static str = "queueName";
    pub const QUEUE_OPTIONS: &'static str = "queueOptions";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn with_queue_name(self, queue_name: impl Into<String>) -> Self {
        self.with(Self::QUEUE_NAME, Value::String(queue_name.into()))
    }

    pub fn with_queue_options(self, queue_options: Map<String, Value>) -> Self {
        self.with(Self::QUEUE_OPTIONS, Value::Object(queue_options))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// 目标队列名；未配置或不是字符串时为 `None`
    pub fn queue_name(&self) -> Option<&str> {
        self.0.get(Self::QUEUE_NAME).and_then(Value::as_str)
    }

    /// 透传给队列的选项；未配置时为空
    pub fn queue_options(&self) -> Map<String, Value> {
        self.0
            .get(Self::QUEUE_OPTIONS)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }
}

/// 单条映射：事件类型 -> 监听器
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventToListenerMapping {
    event_type: String,
    listener: ListenerId,
    #[serde(default)]
    options: MappingOptions,
}

impl EventToListenerMapping {
    pub fn new(
        event_type: impl Into<String>,
        listener: impl Into<ListenerId>,
        options: MappingOptions,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            listener: listener.into(),
            options,
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn listener(&self) -> &ListenerId {
        &self.listener
    }

    pub fn options(&self) -> &MappingOptions {
        &self.options
    }
}

/// 有序映射表
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventToListenerMappings {
    mappings: Vec<EventToListenerMapping>,
}

impl EventToListenerMappings {
    pub fn from_vec(mappings: Vec<EventToListenerMapping>) -> Self {
        Self { mappings }
    }

    pub fn iter(&self) -> Iter<'_, EventToListenerMapping> {
        self.mappings.iter()
    }

    pub fn filter_by_event_type(&self, event_type: &str) -> Self {
        self.filtered(|m| m.event_type == event_type)
    }

    pub fn filter_by_listener(&self, listener: &ListenerId) -> Self {
        self.filtered(|m| &m.listener == listener)
    }

    pub fn has_listener(&self, listener: &ListenerId) -> bool {
        self.mappings.iter().any(|m| &m.listener == listener)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    fn filtered(&self, f: impl Fn(&EventToListenerMapping) -> bool) -> Self {
        Self {
            mappings: self.mappings.iter().filter(|m| f(m)).cloned().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a EventToListenerMappings {
    type Item = &'a EventToListenerMapping;
    type IntoIter = Iter<'a, EventToListenerMapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.mappings.iter()
    }
}

/// 映射提供者：按事件存储给出映射表
pub trait EventToListenerMappingProvider: Send + Sync {
    fn mappings_for_event_store(&self, event_store: &EventStoreId)
    -> Result<EventToListenerMappings>;
}

/// 内存版映射提供者，未配置的事件存储返回空映射表
#[derive(Default)]
pub struct InMemoryMappingProvider {
    by_store: RwLock<HashMap<EventStoreId, Vec<EventToListenerMapping>>>,
}

impl InMemoryMappingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条映射
    pub fn add(&self, event_store: &EventStoreId, mapping: EventToListenerMapping) {
        let mut guard = self.by_store.write().unwrap_or_else(|e| e.into_inner());
        guard.entry(event_store.clone()).or_default().push(mapping);
    }

    /// 按监听器订阅的事件类型生成映射，共用同一份配置
    pub fn map_listener(
        &self,
        event_store: &EventStoreId,
        listener: &dyn EventListener,
        options: MappingOptions,
    ) {
        let id = listener.listener_id();
        for event_type in listener.subscribed_event_types() {
            self.add(
                event_store,
                EventToListenerMapping::new(event_type, id.clone(), options.clone()),
            );
        }
    }
}

impl EventToListenerMappingProvider for InMemoryMappingProvider {
    fn mappings_for_event_store(
        &self,
        event_store: &EventStoreId,
    ) -> Result<EventToListenerMappings> {
        let guard = self.by_store.read().unwrap_or_else(|e| e.into_inner());
        Ok(EventToListenerMappings::from_vec(
            guard.get(event_store).cloned().unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn options_resolve_queue_name_and_options() {
        let mut queue_options = Map::new();
        queue_options.insert("priority".into(), json!(5));
        let options = MappingOptions::new()
            .with_queue_name("q1")
            .with_queue_options(queue_options.clone());

        assert_eq!(options.queue_name(), Some("q1"));
        assert_eq!(options.queue_options(), queue_options);

        let empty = MappingOptions::new().with(MappingOptions::QUEUE_NAME, json!(42));
        assert_eq!(empty.queue_name(), None);
        assert!(empty.queue_options().is_empty());
    }

    #[test]
    fn provider_keeps_mappings_per_store() {
        let provider = InMemoryMappingProvider::new();
        let store = EventStoreId::from("Acme:Store");
        provider.add(
            &store,
            EventToListenerMapping::new("X", "l1", MappingOptions::new()),
        );
        provider.add(
            &store,
            EventToListenerMapping::new("Y", "l1", MappingOptions::new()),
        );
        provider.add(
            &store,
            EventToListenerMapping::new("X", "l2", MappingOptions::new()),
        );

        let mappings = provider.mappings_for_event_store(&store).unwrap();
        assert_eq!(mappings.len(), 3);
        assert_eq!(mappings.filter_by_event_type("X").len(), 2);
        assert_eq!(mappings.filter_by_listener(&"l1".into()).len(), 2);
        assert!(mappings.has_listener(&"l2".into()));

        let other = provider
            .mappings_for_event_store(&EventStoreId::from("Other:Store"))
            .unwrap();
        assert!(other.is_empty());
    }
}
