use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::event::DomainEvent;

/// 装饰事件：在未装饰事件外附加标识、因果/关联 ID 与任意元数据
///
/// 装饰只有一层：对装饰事件再次装饰（见 `Event::decorate`）会写入同一层，
/// `wrapped_event` 始终是原始事件。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoratedEvent {
    event: DomainEvent,
    #[serde(skip_serializing_if = "Option::is_none")]
    event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    causation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    metadata: Map<String, Value>,
}

impl DecoratedEvent {
    pub fn new(event: DomainEvent) -> Self {
        Self {
            event,
            event_id: None,
            causation_id: None,
            correlation_id: None,
            metadata: Map::new(),
        }
    }

    pub fn with_identifier(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }

    pub fn with_causation_id(mut self, causation_id: impl Into<String>) -> Self {
        self.causation_id = Some(causation_id.into());
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// 合并元数据，同名键以新值为准
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata.extend(metadata);
        self
    }

    pub fn wrapped_event(&self) -> &DomainEvent {
        &self.event
    }

    pub fn into_wrapped_event(self) -> DomainEvent {
        self.event
    }

    pub fn event_id(&self) -> Option<&str> {
        self.event_id.as_deref()
    }

    pub fn causation_id(&self) -> Option<&str> {
        self.causation_id.as_deref()
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }
}
