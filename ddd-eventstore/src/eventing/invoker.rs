//! 监听器追赶（EventListenerInvoker）
//!
//! 记录每个监听器在每个事件存储上已应用到的全局序号，追赶时从 `$all`
//! 读取其后的事件，按顺序交给监听器处理订阅的类型。
//!
use crate::{
    error::{DomainError, DomainResult as Result},
    eventing::EventListener,
    store::EventStore,
    value_object::{EventStoreId, ListenerId, StreamName},
};
use dashmap::DashMap;
use std::collections::HashSet;

#[derive(Default)]
pub struct EventListenerInvoker {
    applied: DashMap<(ListenerId, EventStoreId), u64>,
}

impl EventListenerInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已应用到的最后序号（从未应用时为 0）
    pub fn applied_sequence_number(&self, listener: &ListenerId, store: &EventStoreId) -> u64 {
        self.applied
            .get(&(listener.clone(), store.clone()))
            .map(|v| *v)
            .unwrap_or(0)
    }

    /// 重置位置，下次追赶将从头重放
    pub fn reset(&self, listener: &ListenerId, store: &EventStoreId) {
        self.applied.remove(&(listener.clone(), store.clone()));
    }

    /// 追赶到存储最新位置，返回实际交给监听器处理的事件数
    ///
    /// 监听器出错时立即返回错误，位置停留在最后一个成功处理的事件上。
    pub async fn catch_up(
        &self,
        listener: &dyn EventListener,
        store: &dyn EventStore,
    ) -> Result<usize> {
        let listener_id = listener.listener_id();
        let key = (listener_id.clone(), store.identifier().clone());
        let from = self.applied_sequence_number(&key.0, &key.1) + 1;
        let subscribed: HashSet<String> = listener.subscribed_event_types().into_iter().collect();

        let envelopes = store.load(&StreamName::all(), from).await?;
        let mut handled = 0;

        for envelope in &envelopes {
            if subscribed.contains(envelope.event_type()) {
                listener
                    .when(envelope)
                    .await
                    .map_err(|e| DomainError::EventListener {
                        listener: listener_id.to_string(),
                        reason: e.to_string(),
                    })?;
                handled += 1;
            }
            self.applied.insert(key.clone(), envelope.sequence_number());
        }

        tracing::debug!(
            listener = %listener_id,
            event_store = %key.1,
            handled,
            position = self.applied_sequence_number(&key.0, &key.1),
            "listener caught up"
        );

        Ok(handled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_event::{DomainEvent, DomainEvents, EventEnvelope};
    use crate::eventing::EventPublisher;
    use crate::store::InMemoryEventStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    struct NoopPublisher;

    #[async_trait]
    impl EventPublisher for NoopPublisher {
        async fn publish(&self, _events: DomainEvents) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<u64>>,
        fail_on: Option<u64>,
    }

    #[async_trait]
    impl EventListener for Recorder {
        fn listener_id(&self) -> ListenerId {
            ListenerId::from("recorder")
        }
        fn subscribed_event_types(&self) -> Vec<String> {
            vec!["A".into()]
        }
        async fn when(&self, envelope: &EventEnvelope) -> anyhow::Result<()> {
            if self.fail_on == Some(envelope.sequence_number()) {
                anyhow::bail!("boom at {}", envelope.sequence_number());
            }
            self.seen.lock().unwrap().push(envelope.sequence_number());
            Ok(())
        }
    }

    async fn store_with(types: &[&str]) -> InMemoryEventStore {
        let store = InMemoryEventStore::new("s".into(), Arc::new(NoopPublisher));
        store.setup().await.unwrap();
        let events: DomainEvents = types
            .iter()
            .map(|t| DomainEvent::new(*t, json!({})))
            .collect();
        store.commit(&"stream".into(), events).await.unwrap();
        store
    }

    #[tokio::test]
    async fn catch_up_applies_subscribed_events_once() {
        let store = store_with(&["A", "B", "A"]).await;
        let invoker = EventListenerInvoker::new();
        let listener = Recorder::default();

        assert_eq!(invoker.catch_up(&listener, &store).await.unwrap(), 2);
        assert_eq!(invoker.catch_up(&listener, &store).await.unwrap(), 0);
        assert_eq!(*listener.seen.lock().unwrap(), vec![1, 3]);
        assert_eq!(
            invoker.applied_sequence_number(&listener.listener_id(), &"s".into()),
            3
        );

        invoker.reset(&listener.listener_id(), &"s".into());
        assert_eq!(invoker.catch_up(&listener, &store).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn failing_listener_keeps_last_successful_position() {
        let store = store_with(&["A", "B", "A"]).await;
        let invoker = EventListenerInvoker::new();
        let listener = Recorder {
            fail_on: Some(3),
            ..Default::default()
        };

        let err = invoker.catch_up(&listener, &store).await.unwrap_err();
        match err {
            DomainError::EventListener { listener, reason } => {
                assert_eq!(listener, "recorder");
                assert!(reason.contains("boom at 3"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            invoker.applied_sequence_number(&listener.listener_id(), &"s".into()),
            2
        );
    }
}
