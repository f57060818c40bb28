use anyhow::Result as AnyResult;
use ddd_eventstore::domain_event::{DomainEvent, DomainEvents, Event, EventEnvelope, TypedEvent};
use ddd_eventstore::error::{DomainError, DomainResult};
use ddd_eventstore::eventing::{
    EventListener, EventListenerInvoker, EventPublisher, EventPublisherFactory,
    EventToListenerMappingProvider, InMemoryMappingProvider, ListenerRegistry, MappingOptions,
};
use ddd_eventstore::store::{EventStore, EventStoreFactory, InMemoryEventStoreFactory};
use ddd_eventstore::value_object::{EventStoreId, StreamName};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, OnceLock, Weak};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Deposited {
    account: String,
    amount: i64,
}

impl TypedEvent for Deposited {
    const EVENT_TYPE: &'static str = "AccountEvent.Deposited";
}

#[derive(Default)]
struct Balance {
    total: Mutex<i64>,
}

#[async_trait::async_trait]
impl EventListener for Balance {
    fn listener_id(&self) -> ddd_eventstore::value_object::ListenerId {
        "projection.balance".into()
    }
    fn subscribed_event_types(&self) -> Vec<String> {
        vec![Deposited::EVENT_TYPE.to_string()]
    }
    async fn when(&self, envelope: &EventEnvelope) -> AnyResult<()> {
        let deposited: Deposited = envelope.domain_event().to_typed()?;
        *self.total.lock().unwrap() += deposited.amount;
        Ok(())
    }
}

/// 提交后立即让映射到的监听器追赶
struct InlinePublisher {
    event_store: EventStoreId,
    mappings: Arc<InMemoryMappingProvider>,
    listeners: Arc<ListenerRegistry>,
    invoker: Arc<EventListenerInvoker>,
    stores: Arc<OnceLock<Weak<dyn EventStoreFactory>>>,
}

#[async_trait::async_trait]
impl EventPublisher for InlinePublisher {
    async fn publish(&self, events: DomainEvents) -> DomainResult<()> {
        let stores = self
            .stores
            .get()
            .and_then(Weak::upgrade)
            .ok_or_else(|| DomainError::not_found("event store factory"))?;
        let store = stores.create(&self.event_store)?;
        let mappings = self.mappings.mappings_for_event_store(&self.event_store)?;

        for event in &events {
            for mapping in mappings.filter_by_event_type(event.event_type()).iter() {
                if let Some(listener) = self.listeners.get(mapping.listener()) {
                    self.invoker.catch_up(listener.as_ref(), store.as_ref()).await?;
                }
            }
        }
        Ok(())
    }
}

struct InlinePublishers {
    mappings: Arc<InMemoryMappingProvider>,
    listeners: Arc<ListenerRegistry>,
    invoker: Arc<EventListenerInvoker>,
    stores: Arc<OnceLock<Weak<dyn EventStoreFactory>>>,
}

impl EventPublisherFactory for InlinePublishers {
    fn create(&self, event_store: &EventStoreId) -> DomainResult<Arc<dyn EventPublisher>> {
        Ok(Arc::new(InlinePublisher {
            event_store: event_store.clone(),
            mappings: self.mappings.clone(),
            listeners: self.listeners.clone(),
            invoker: self.invoker.clone(),
            stores: self.stores.clone(),
        }))
    }
}

#[tokio::test]
async fn committed_events_reach_mapped_listeners() -> AnyResult<()> {
    let balance = Arc::new(Balance::default());
    let listeners = Arc::new(ListenerRegistry::new());
    listeners.register(balance.clone())?;

    let store_id = EventStoreId::from("accounts");
    let mappings = Arc::new(InMemoryMappingProvider::new());
    mappings.map_listener(&store_id, balance.as_ref(), MappingOptions::new());

    let stores = Arc::new(OnceLock::new());
    let factory: Arc<dyn EventStoreFactory> = Arc::new(InMemoryEventStoreFactory::new(Arc::new(
        InlinePublishers {
            mappings,
            listeners,
            invoker: Arc::new(EventListenerInvoker::new()),
            stores: stores.clone(),
        },
    )));
    let _ = stores.set(Arc::downgrade(&factory));

    let store = factory.create(&store_id)?;
    store.setup().await?;

    let stream = StreamName::from("account-1");
    let deposit = |amount| {
        DomainEvent::from_typed(&Deposited {
            account: "account-1".into(),
            amount,
        })
    };
    store
        .commit(&stream, DomainEvents::from_iter([deposit(10)?, deposit(5)?]))
        .await?;
    store
        .commit(
            &stream,
            DomainEvents::with_single_event(
                Event::from(deposit(7)?).decorate(|d| d.with_causation_id("cmd-1")),
            ),
        )
        .await?;

    assert_eq!(*balance.total.lock().unwrap(), 22);

    let loaded = store.load(&stream, 3).await?;
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].raw.causation_id(), Some("cmd-1"));
    assert_eq!(loaded[0].domain_event().to_typed::<Deposited>()?.amount, 7);
    Ok(())
}

#[tokio::test]
async fn virtual_stream_is_read_only() -> AnyResult<()> {
    let factory = InMemoryEventStoreFactory::new(Arc::new(InlinePublishers {
        mappings: Arc::new(InMemoryMappingProvider::new()),
        listeners: Arc::new(ListenerRegistry::new()),
        invoker: Arc::new(EventListenerInvoker::new()),
        stores: Arc::new(OnceLock::new()),
    }));
    let store = factory.store(&EventStoreId::from("accounts"))?;
    store.setup().await?;

    let err = store
        .commit(
            &StreamName::all(),
            DomainEvents::with_single_event(DomainEvent::new("X", serde_json::json!({}))),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::EventStore { .. }));
    assert!(store.is_empty());
    Ok(())
}
