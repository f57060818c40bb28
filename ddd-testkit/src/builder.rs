//! 事件存储构建器（EventStoreBuilder）
//!
//! 测试常用的三步：准备存储、写入事件并立即分发给监听器、读回事件流。
//!
use crate::error::TestkitResult as Result;
use crate::publisher::TestingEventPublisherFactory;
use ddd_eventstore::domain_event::{DomainEvent, DomainEvents, Event};
use ddd_eventstore::store::{EventStore, EventStoreFactory};
use ddd_eventstore::value_object::{EventStoreId, StreamName};
use std::sync::Arc;

#[derive(Clone)]
pub struct EventStoreBuilder {
    event_stores: Arc<dyn EventStoreFactory>,
    publishers: Arc<TestingEventPublisherFactory>,
}

impl EventStoreBuilder {
    pub fn new(
        event_stores: Arc<dyn EventStoreFactory>,
        publishers: Arc<TestingEventPublisherFactory>,
    ) -> Self {
        Self {
            event_stores,
            publishers,
        }
    }

    /// 取得并初始化事件存储（幂等）
    pub async fn setup_event_store(&self, event_store: &EventStoreId) -> Result<Arc<dyn EventStore>> {
        let store = self.event_stores.create(event_store)?;
        store.setup().await?;
        Ok(store)
    }

    /// 初始化存储、向事件流提交事件，然后 flush 全部延迟发布器
    ///
    /// 返回时监听器已经处理完这批事件（未被白名单屏蔽的部分）。
    pub async fn build_event_store_with_events<I, E>(
        &self,
        event_store: &EventStoreId,
        stream: &StreamName,
        events: I,
    ) -> Result<()>
    where
        I: IntoIterator<Item = E>,
        E: Into<Event>,
    {
        let events: DomainEvents = events.into_iter().map(Into::<Event>::into).collect();
        let count = events.len();
        let store = self.setup_event_store(event_store).await?;

        store.commit(stream, events).await?;
        let jobs = self.publishers.invoke_deferred_event_publishers().await?;
        tracing::debug!(
            event_store = %event_store,
            stream = %stream,
            events = count,
            jobs,
            "event store built"
        );
        Ok(())
    }

    /// 初始化存储并读取事件流中序号不小于 `min_sequence_number` 的领域事件（已解除装饰）
    pub async fn load_event_stream_as_vec(
        &self,
        event_store: &EventStoreId,
        stream: &StreamName,
        min_sequence_number: u64,
    ) -> Result<Vec<DomainEvent>> {
        let store = self.setup_event_store(event_store).await?;
        let envelopes = store.load(stream, min_sequence_number).await?;
        Ok(envelopes
            .into_iter()
            .map(|envelope| envelope.into_domain_event())
            .collect())
    }
}
