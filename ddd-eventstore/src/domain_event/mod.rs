//! 领域事件（Domain Event）与事件集合
//!
//! 定义事件载荷（`DomainEvent`）、可携带元信息的装饰事件（`DecoratedEvent`），
//! 以及提交时使用的批量集合 `DomainEvents` 与读取时返回的 `EventEnvelope`。

mod decorated_event;
mod domain_events;
mod event;
mod event_envelope;
mod metadata;

pub use decorated_event::DecoratedEvent;
pub use domain_events::{DomainEvents, Event};
pub use event::{DomainEvent, TypedEvent};
pub use event_envelope::EventEnvelope;
pub use metadata::RawEventMetadata;
