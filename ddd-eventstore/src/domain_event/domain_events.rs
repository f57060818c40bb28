use std::slice::Iter;
use std::vec::IntoIter;

use serde::{Deserialize, Serialize};

use super::decorated_event::DecoratedEvent;
use super::event::DomainEvent;

/// 提交到事件存储的单个事件：原始事件或装饰事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Domain(DomainEvent),
    Decorated(DecoratedEvent),
}

impl Event {
    /// 事件类型，总是取自未装饰的原始事件
    pub fn event_type(&self) -> &str {
        self.domain_event().event_type()
    }

    /// 去掉装饰后的原始事件
    pub fn domain_event(&self) -> &DomainEvent {
        match self {
            Event::Domain(event) => event,
            Event::Decorated(decorated) => decorated.wrapped_event(),
        }
    }

    pub fn into_domain_event(self) -> DomainEvent {
        match self {
            Event::Domain(event) => event,
            Event::Decorated(decorated) => decorated.into_wrapped_event(),
        }
    }

    pub fn decoration(&self) -> Option<&DecoratedEvent> {
        match self {
            Event::Domain(_) => None,
            Event::Decorated(decorated) => Some(decorated),
        }
    }

    /// 添加装饰；已装饰的事件在原装饰层上修改，不会产生嵌套
    pub fn decorate<F>(self, f: F) -> Event
    where
        F: FnOnce(DecoratedEvent) -> DecoratedEvent,
    {
        let decorated = match self {
            Event::Domain(event) => DecoratedEvent::new(event),
            Event::Decorated(decorated) => decorated,
        };
        Event::Decorated(f(decorated))
    }
}

impl From<DomainEvent> for Event {
    fn from(event: DomainEvent) -> Self {
        Event::Domain(event)
    }
}

impl From<DecoratedEvent> for Event {
    fn from(event: DecoratedEvent) -> Self {
        Event::Decorated(event)
    }
}

/// 一次提交/发布的有序事件批次
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DomainEvents {
    events: Vec<Event>,
}

impl DomainEvents {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_vec(events: Vec<Event>) -> Self {
        Self { events }
    }

    pub fn with_single_event(event: impl Into<Event>) -> Self {
        Self {
            events: vec![event.into()],
        }
    }

    /// 追加另一批事件，保持到达顺序
    pub fn append(&mut self, other: DomainEvents) {
        self.events.extend(other.events);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, Event> {
        self.events.iter()
    }

    pub fn as_slice(&self) -> &[Event] {
        &self.events
    }
}

impl FromIterator<Event> for DomainEvents {
    fn from_iter<T: IntoIterator<Item = Event>>(iter: T) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

impl FromIterator<DomainEvent> for DomainEvents {
    fn from_iter<T: IntoIterator<Item = DomainEvent>>(iter: T) -> Self {
        iter.into_iter().map(Event::from).collect()
    }
}

impl IntoIterator for DomainEvents {
    type Item = Event;
    type IntoIter = IntoIter<Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a> IntoIterator for &'a DomainEvents {
    type Item = &'a Event;
    type IntoIter = Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
