use crate::allow_list::AllowListStore;
use crate::error::TestkitResult as Result;
use crate::queue::{CatchUpEventListenerJob, JobManager};
use async_trait::async_trait;
use ddd_eventstore::domain_event::DomainEvents;
use ddd_eventstore::error::{DomainError, DomainResult};
use ddd_eventstore::eventing::{EventPublisher, EventToListenerMappings};
use ddd_eventstore::value_object::{EventStoreId, ListenerId};
use std::collections::HashSet;
use std::sync::Arc;

/// 通过作业队列通知监听器的发布器
///
/// 同一批事件中，每种事件类型只处理一次，每个监听器最多收到一个追赶作业；
/// 白名单受限时，不在名单中的监听器被跳过。
pub struct TestingEventPublisher {
    event_store: EventStoreId,
    mappings: EventToListenerMappings,
    allow_list: Arc<AllowListStore>,
    job_manager: Arc<JobManager>,
    default_queue_name: String,
}

impl TestingEventPublisher {
    /// 创建时加载白名单（每个进程只有第一次真正读取缓存）
    pub fn new(
        event_store: EventStoreId,
        mappings: EventToListenerMappings,
        allow_list: Arc<AllowListStore>,
        job_manager: Arc<JobManager>,
        default_queue_name: impl Into<String>,
    ) -> Result<Self> {
        allow_list.load()?;
        Ok(Self {
            event_store,
            mappings,
            allow_list,
            job_manager,
            default_queue_name: default_queue_name.into(),
        })
    }

    pub fn event_store(&self) -> &EventStoreId {
        &self.event_store
    }

    pub fn mappings(&self) -> &EventToListenerMappings {
        &self.mappings
    }

    /// 为一批事件提交追赶作业，返回提交的作业数；任一提交失败即中止
    pub async fn publish_events(&self, events: &DomainEvents) -> Result<usize> {
        let mut processed_event_types: HashSet<&str> = HashSet::new();
        let mut queued_listeners: HashSet<ListenerId> = HashSet::new();

        for event in events {
            let event_type = event.event_type();
            if !processed_event_types.insert(event_type) {
                continue;
            }

            for mapping in &self.mappings {
                if mapping.event_type() != event_type {
                    continue;
                }
                let listener = mapping.listener();
                if !self.allow_list.is_allowed(listener)? {
                    tracing::debug!(listener = %listener, event_type, "listener not allowed, skipped");
                    continue;
                }
                if queued_listeners.contains(listener) {
                    continue;
                }

                let job = CatchUpEventListenerJob::new(listener.clone(), self.event_store.clone());
                let queue_name = mapping
                    .options()
                    .queue_name()
                    .unwrap_or(&self.default_queue_name);
                let options = mapping.options().queue_options();

                let message_id = self.job_manager.queue(queue_name, &job, &options).await?;
                tracing::debug!(
                    event_store = %self.event_store,
                    listener = %listener,
                    queue = queue_name,
                    message = %message_id,
                    "catch-up job submitted"
                );
                queued_listeners.insert(listener.clone());
            }
        }

        Ok(queued_listeners.len())
    }
}

#[async_trait]
impl EventPublisher for TestingEventPublisher {
    async fn publish(&self, events: DomainEvents) -> DomainResult<()> {
        if events.is_empty() {
            return Ok(());
        }
        self.publish_events(&events)
            .await
            .map(|_| ())
            .map_err(DomainError::from)
    }
}
