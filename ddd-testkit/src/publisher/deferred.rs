use super::TestingEventPublisher;
use crate::error::TestkitResult as Result;
use async_trait::async_trait;
use ddd_eventstore::domain_event::DomainEvents;
use ddd_eventstore::error::DomainResult;
use ddd_eventstore::eventing::EventPublisher;
use std::sync::{Arc, Mutex, MutexGuard};

/// 延迟发布器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredState {
    /// 没有待分发的事件
    Idle,
    /// 已记录事件，等待 flush
    Recording,
    /// 正在分发
    Flushing,
}

struct Buffer {
    state: DeferredState,
    pending: DomainEvents,
}

/// 延迟发布器：`publish`/`record` 只记录，`flush` 才真正分发
///
/// flush 期间（监听器追赶时再次提交）记录的事件留到下一次 flush；
/// flush 期间再次调用 flush 不做任何事。
pub struct DeferredEventPublisher {
    publisher: Arc<TestingEventPublisher>,
    buffer: Mutex<Buffer>,
}

impl DeferredEventPublisher {
    pub fn new(publisher: Arc<TestingEventPublisher>) -> Self {
        Self {
            publisher,
            buffer: Mutex::new(Buffer {
                state: DeferredState::Idle,
                pending: DomainEvents::empty(),
            }),
        }
    }

    pub fn publisher(&self) -> &Arc<TestingEventPublisher> {
        &self.publisher
    }

    pub fn state(&self) -> DeferredState {
        self.lock().state
    }

    /// 尚未分发的事件数
    pub fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }

    /// 记录事件，保持到达顺序
    pub fn record(&self, events: DomainEvents) {
        if events.is_empty() {
            return;
        }
        let mut buffer = self.lock();
        buffer.pending.append(events);
        if buffer.state == DeferredState::Idle {
            buffer.state = DeferredState::Recording;
        }
    }

    /// 取出全部已记录的事件并分发，返回提交的作业数
    pub async fn flush(&self) -> Result<usize> {
        let batch = {
            let mut buffer = self.lock();
            match buffer.state {
                DeferredState::Flushing => {
                    tracing::debug!(
                        event_store = %self.publisher.event_store(),
                        "flush already in progress, skipped"
                    );
                    return Ok(0);
                }
                DeferredState::Idle => return Ok(0),
                DeferredState::Recording => {
                    buffer.state = DeferredState::Flushing;
                    std::mem::take(&mut buffer.pending)
                }
            }
        };

        let _reset = FlushGuard { deferred: self };
        tracing::debug!(
            event_store = %self.publisher.event_store(),
            events = batch.len(),
            "flushing deferred events"
        );
        self.publisher.publish_events(&batch).await
    }

    fn lock(&self) -> MutexGuard<'_, Buffer> {
        self.buffer.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// 结束 flush（包括出错与 panic）时回到 Idle 或 Recording
struct FlushGuard<'a> {
    deferred: &'a DeferredEventPublisher,
}

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        let mut buffer = self.deferred.lock();
        buffer.state = if buffer.pending.is_empty() {
            DeferredState::Idle
        } else {
            DeferredState::Recording
        };
    }
}

#[async_trait]
impl EventPublisher for DeferredEventPublisher {
    async fn publish(&self, events: DomainEvents) -> DomainResult<()> {
        self.record(events);
        Ok(())
    }
}
