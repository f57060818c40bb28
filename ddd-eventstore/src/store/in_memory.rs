//! 内存版事件存储（InMemoryEventStore）
//!
//! 以 `Mutex<Vec<EventEnvelope>>` 保存全部事件，序号在存储内全局递增；
//! 典型用途：测试环境与示例。提交与读取前需要先调用 `setup`。

use super::{EventStore, EventStoreFactory};
use crate::domain_event::{DomainEvents, Event, EventEnvelope, RawEventMetadata};
use crate::error::{DomainError, DomainResult as Result};
use crate::eventing::{EventPublisher, EventPublisherFactory};
use crate::value_object::{EventStoreId, StreamName, ValueObject};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub struct InMemoryEventStore {
    identifier: EventStoreId,
    records: Mutex<Vec<EventEnvelope>>,
    publisher: Arc<dyn EventPublisher>,
    set_up: AtomicBool,
}

impl InMemoryEventStore {
    pub fn new(identifier: EventStoreId, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            identifier,
            records: Mutex::new(Vec::new()),
            publisher,
            set_up: AtomicBool::new(false),
        }
    }

    pub fn is_set_up(&self) -> bool {
        self.set_up.load(Ordering::Acquire)
    }

    /// 已写入的事件总数
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn ensure_set_up(&self) -> Result<()> {
        if self.is_set_up() {
            return Ok(());
        }
        Err(DomainError::event_store(
            self.identifier.as_str(),
            "not set up, call setup() first",
        ))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<EventEnvelope>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn to_envelope(stream: &StreamName, sequence_number: u64, event: &Event) -> EventEnvelope {
        let decoration = event.decoration();
        let raw = RawEventMetadata::builder()
            .event_id(
                decoration
                    .and_then(|d| d.event_id())
                    .map(str::to_string)
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            )
            .stream_name(stream.clone())
            .sequence_number(sequence_number)
            .recorded_at(Utc::now())
            .maybe_causation_id(decoration.and_then(|d| d.causation_id()).map(str::to_string))
            .maybe_correlation_id(
                decoration
                    .and_then(|d| d.correlation_id())
                    .map(str::to_string),
            )
            .metadata(decoration.map(|d| d.metadata().clone()).unwrap_or_default())
            .build();

        EventEnvelope::new(raw, event.domain_event().clone())
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    fn identifier(&self) -> &EventStoreId {
        &self.identifier
    }

    async fn setup(&self) -> Result<()> {
        self.set_up.store(true, Ordering::Release);
        Ok(())
    }

    async fn commit(&self, stream: &StreamName, events: DomainEvents) -> Result<()> {
        self.ensure_set_up()?;
        if stream.is_virtual() {
            return Err(DomainError::event_store(
                self.identifier.as_str(),
                format!("cannot commit to virtual stream {stream}"),
            ));
        }
        if stream.as_str().trim().is_empty() {
            return Err(DomainError::event_store(
                self.identifier.as_str(),
                "stream name must not be empty",
            ));
        }
        if events.is_empty() {
            return Ok(());
        }

        {
            let mut records = self.lock();
            for event in &events {
                let sequence_number = records.len() as u64 + 1;
                records.push(Self::to_envelope(stream, sequence_number, event));
            }
        }

        tracing::debug!(
            event_store = %self.identifier,
            stream = %stream,
            count = events.len(),
            "committed events"
        );

        self.publisher.publish(events).await
    }

    async fn load(
        &self,
        stream: &StreamName,
        from_sequence_number: u64,
    ) -> Result<Vec<EventEnvelope>> {
        self.ensure_set_up()?;
        let records = self.lock();
        Ok(records
            .iter()
            .filter(|e| e.sequence_number() >= from_sequence_number)
            .filter(|e| stream.is_virtual() || e.raw.stream_name() == stream)
            .cloned()
            .collect())
    }
}

/// 内存版事件存储工厂：每个标识一个实例，发布器取自发布器工厂
pub struct InMemoryEventStoreFactory {
    publishers: Arc<dyn EventPublisherFactory>,
    stores: DashMap<EventStoreId, Arc<InMemoryEventStore>>,
}

impl InMemoryEventStoreFactory {
    pub fn new(publishers: Arc<dyn EventPublisherFactory>) -> Self {
        Self {
            publishers,
            stores: DashMap::new(),
        }
    }

    /// 具体类型的实例，便于测试直接检查存储内容
    pub fn store(&self, event_store: &EventStoreId) -> Result<Arc<InMemoryEventStore>> {
        if let Some(store) = self.stores.get(event_store) {
            return Ok(store.clone());
        }
        event_store.validate()?;
        let publisher = self.publishers.create(event_store)?;
        let store = self
            .stores
            .entry(event_store.clone())
            .or_insert_with(|| Arc::new(InMemoryEventStore::new(event_store.clone(), publisher)))
            .clone();
        Ok(store)
    }
}

impl EventStoreFactory for InMemoryEventStoreFactory {
    fn create(&self, event_store: &EventStoreId) -> Result<Arc<dyn EventStore>> {
        let store: Arc<dyn EventStore> = self.store(event_store)?;
        Ok(store)
    }
}
