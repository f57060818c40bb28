use super::{DeferredEventPublisher, TestingEventPublisher};
use crate::allow_list::AllowListStore;
use crate::error::{TestkitError, TestkitResult as Result};
use crate::queue::JobManager;
use dashmap::{DashMap, mapref::entry::Entry};
use ddd_eventstore::error::{DomainError, DomainResult};
use ddd_eventstore::eventing::{
    EventPublisher, EventPublisherFactory, EventToListenerMappingProvider,
};
use ddd_eventstore::value_object::EventStoreId;
use std::sync::Arc;

/// 工厂中登记的发布器
#[derive(Clone)]
pub enum PublisherEntry {
    /// 由工厂创建，需要 `invoke_deferred_event_publishers` 才会分发
    Deferred(Arc<DeferredEventPublisher>),
    /// 通过 `register` 安装，调用方自行负责分发
    Immediate(Arc<dyn EventPublisher>),
}

impl PublisherEntry {
    pub fn as_publisher(&self) -> Arc<dyn EventPublisher> {
        match self {
            PublisherEntry::Deferred(deferred) => {
                let publisher: Arc<dyn EventPublisher> = deferred.clone();
                publisher
            }
            PublisherEntry::Immediate(publisher) => publisher.clone(),
        }
    }

    pub fn as_deferred(&self) -> Option<&Arc<DeferredEventPublisher>> {
        match self {
            PublisherEntry::Deferred(deferred) => Some(deferred),
            PublisherEntry::Immediate(_) => None,
        }
    }
}

/// 测试用发布器工厂：每个事件存储一个发布器，创建后缓存
pub struct TestingEventPublisherFactory {
    mapping_provider: Arc<dyn EventToListenerMappingProvider>,
    allow_list: Arc<AllowListStore>,
    job_manager: Arc<JobManager>,
    default_queue_name: String,
    instances: DashMap<EventStoreId, PublisherEntry>,
}

impl TestingEventPublisherFactory {
    pub fn new(
        mapping_provider: Arc<dyn EventToListenerMappingProvider>,
        allow_list: Arc<AllowListStore>,
        job_manager: Arc<JobManager>,
        default_queue_name: impl Into<String>,
    ) -> Self {
        Self {
            mapping_provider,
            allow_list,
            job_manager,
            default_queue_name: default_queue_name.into(),
            instances: DashMap::new(),
        }
    }

    /// 取得（必要时创建）事件存储对应的发布器
    pub fn publisher_for(&self, event_store: &EventStoreId) -> Result<PublisherEntry> {
        if let Some(entry) = self.instances.get(event_store) {
            return Ok(entry.clone());
        }

        let mappings = self.mapping_provider.mappings_for_event_store(event_store)?;
        let testing = TestingEventPublisher::new(
            event_store.clone(),
            mappings,
            self.allow_list.clone(),
            self.job_manager.clone(),
            self.default_queue_name.clone(),
        )?;
        let created = PublisherEntry::Deferred(Arc::new(DeferredEventPublisher::new(Arc::new(
            testing,
        ))));

        let entry = self
            .instances
            .entry(event_store.clone())
            .or_insert(created)
            .clone();
        tracing::debug!(event_store = %event_store, "deferred publisher created");
        Ok(entry)
    }

    /// 事件存储对应的延迟发布器；已注册为即时发布器时返回 `None`
    pub fn deferred(&self, event_store: &EventStoreId) -> Result<Option<Arc<DeferredEventPublisher>>> {
        Ok(self.publisher_for(event_store)?.as_deferred().cloned())
    }

    /// 为事件存储安装即时发布器
    ///
    /// 事件存储在创建时绑定发布器，因此已有登记（包括已创建的延迟发布器）时报错。
    pub fn register(&self, event_store: EventStoreId, publisher: Arc<dyn EventPublisher>) -> Result<()> {
        match self.instances.entry(event_store) {
            Entry::Occupied(entry) => Err(TestkitError::InvalidState(format!(
                "event store {} already has a publisher",
                entry.key()
            ))),
            Entry::Vacant(entry) => {
                tracing::debug!(event_store = %entry.key(), "immediate publisher registered");
                entry.insert(PublisherEntry::Immediate(publisher));
                Ok(())
            }
        }
    }

    /// 已登记的事件存储（有序）
    pub fn event_stores(&self) -> Vec<EventStoreId> {
        let mut ids: Vec<EventStoreId> = self.instances.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// 按事件存储标识顺序 flush 所有延迟发布器，返回提交的作业总数
    ///
    /// 即时发布器被跳过；任一 flush 失败即中止并返回错误。
    pub async fn invoke_deferred_event_publishers(&self) -> Result<usize> {
        let mut deferred: Vec<(EventStoreId, Arc<DeferredEventPublisher>)> = self
            .instances
            .iter()
            .filter_map(|e| e.value().as_deferred().map(|d| (e.key().clone(), d.clone())))
            .collect();
        deferred.sort_by(|a, b| a.0.cmp(&b.0));

        let mut queued = 0;
        for (event_store, publisher) in deferred {
            let jobs = publisher.flush().await?;
            if jobs > 0 {
                tracing::debug!(event_store = %event_store, jobs, "deferred publisher flushed");
            }
            queued += jobs;
        }
        Ok(queued)
    }
}

impl EventPublisherFactory for TestingEventPublisherFactory {
    fn create(&self, event_store: &EventStoreId) -> DomainResult<Arc<dyn EventPublisher>> {
        self.publisher_for(event_store)
            .map(|entry| entry.as_publisher())
            .map_err(DomainError::from)
    }
}
