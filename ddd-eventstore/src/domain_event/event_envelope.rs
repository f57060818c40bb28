use super::event::DomainEvent;
use super::metadata::RawEventMetadata;

/// 事件信封：读取事件流时返回，包含去装饰后的原始事件与存储元数据
#[derive(Debug, Clone, PartialEq)]
pub struct EventEnvelope {
    pub raw: RawEventMetadata,
    pub domain_event: DomainEvent,
}

impl EventEnvelope {
    pub fn new(raw: RawEventMetadata, domain_event: DomainEvent) -> Self {
        Self { raw, domain_event }
    }

    pub fn sequence_number(&self) -> u64 {
        self.raw.sequence_number()
    }

    pub fn event_type(&self) -> &str {
        self.domain_event.event_type()
    }

    pub fn domain_event(&self) -> &DomainEvent {
        &self.domain_event
    }

    pub fn into_domain_event(self) -> DomainEvent {
        self.domain_event
    }
}
