//! 作业（Job）与载荷解码
//!
//! 队列只认识字节载荷；`JobDecoder` 负责把载荷还原为可执行的作业。
//! `CatchUpEventListenerJob` 让一个监听器在指定事件存储上追赶到最新位置。
//!
use super::{Message, Queue};
use crate::error::{TestkitError, TestkitResult as Result};
use async_trait::async_trait;
use ddd_eventstore::error::DomainError;
use ddd_eventstore::eventing::{EventListenerInvoker, ListenerRegistry};
use ddd_eventstore::store::EventStoreFactory;
use ddd_eventstore::value_object::{EventStoreId, ListenerId};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock, Weak};

/// 可执行作业
#[async_trait]
pub trait Job: Send + Sync {
    /// 人类可读的描述（用于错误与日志）
    fn label(&self) -> String;

    /// 执行作业；返回 `false` 表示作业自身判定失败
    async fn execute(&self, queue: &dyn Queue, message: &Message) -> Result<bool>;
}

/// 载荷解码器：无法还原为作业时返回 `InvalidPayload`
pub trait JobDecoder: Send + Sync {
    fn decode(&self, payload: &[u8]) -> Result<Box<dyn Job>>;
}

/// 追赶作业：监听器 + 需要追赶的事件存储
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatchUpEventListenerJob {
    listener: ListenerId,
    event_store: EventStoreId,
}

impl CatchUpEventListenerJob {
    pub fn new(listener: ListenerId, event_store: EventStoreId) -> Self {
        Self {
            listener,
            event_store,
        }
    }

    pub fn listener(&self) -> &ListenerId {
        &self.listener
    }

    pub fn event_store(&self) -> &EventStoreId {
        &self.event_store
    }

    pub fn label(&self) -> String {
        format!(
            "Catch up event listener \"{}\" from store \"{}\"",
            self.listener, self.event_store
        )
    }
}

/// 解码追赶作业并绑定监听器注册表与事件存储工厂
///
/// 事件存储工厂经由发布器间接依赖本解码器，因此以弱引用在装配完成后绑定。
pub struct CatchUpJobDecoder {
    listeners: Arc<ListenerRegistry>,
    invoker: Arc<EventListenerInvoker>,
    event_stores: OnceLock<Weak<dyn EventStoreFactory>>,
}

impl CatchUpJobDecoder {
    pub fn new(listeners: Arc<ListenerRegistry>, invoker: Arc<EventListenerInvoker>) -> Self {
        Self {
            listeners,
            invoker,
            event_stores: OnceLock::new(),
        }
    }

    /// 绑定事件存储工厂，只能绑定一次
    pub fn bind_event_stores(&self, event_stores: &Arc<dyn EventStoreFactory>) -> Result<()> {
        self.event_stores
            .set(Arc::downgrade(event_stores))
            .map_err(|_| TestkitError::InvalidState("event store factory already bound".into()))
    }
}

impl JobDecoder for CatchUpJobDecoder {
    fn decode(&self, payload: &[u8]) -> Result<Box<dyn Job>> {
        let job: CatchUpEventListenerJob =
            serde_json::from_slice(payload).map_err(|e| TestkitError::InvalidPayload {
                reason: e.to_string(),
            })?;
        let event_stores = self
            .event_stores
            .get()
            .and_then(Weak::upgrade)
            .ok_or_else(|| TestkitError::InvalidState("no event store factory bound".into()))?;

        Ok(Box::new(BoundCatchUpJob {
            job,
            listeners: self.listeners.clone(),
            invoker: self.invoker.clone(),
            event_stores,
        }))
    }
}

struct BoundCatchUpJob {
    job: CatchUpEventListenerJob,
    listeners: Arc<ListenerRegistry>,
    invoker: Arc<EventListenerInvoker>,
    event_stores: Arc<dyn EventStoreFactory>,
}

#[async_trait]
impl Job for BoundCatchUpJob {
    fn label(&self) -> String {
        self.job.label()
    }

    async fn execute(&self, queue: &dyn Queue, message: &Message) -> Result<bool> {
        let listener = self.listeners.get(&self.job.listener).ok_or_else(|| {
            DomainError::not_found(format!("event listener {}", self.job.listener))
        })?;
        let store = self.event_stores.create(&self.job.event_store)?;

        let handled = self.invoker.catch_up(listener.as_ref(), store.as_ref()).await?;
        tracing::debug!(
            queue = queue.name(),
            message = message.identifier(),
            listener = %self.job.listener,
            handled,
            "catch-up job executed"
        );
        Ok(true)
    }
}
