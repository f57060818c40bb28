//! 测试装配（TestHarness）
//!
//! 把缓存、白名单、作业管理器、发布器工厂与内存事件存储装配成一张对象图：
//!
//! ```text
//! InMemoryEventStoreFactory ─▶ TestingEventPublisherFactory ─▶ JobManager ─▶ SameProcessQueue
//!          ▲                                                        │
//!          └──────────── CatchUpJobDecoder（弱引用）◀────────────────┘
//! ```
//!
//! ```ignore
//! let harness = TestHarness::builder()
//!     .listeners(vec![projector.clone()])
//!     .build()?;
//! harness.set_up()?;
//! harness.map_listener(&store, projector.as_ref(), MappingOptions::new());
//! harness
//!     .build_event_store_with_events(&store, &stream, [placed])
//!     .await?;
//! ```
//!
use crate::allow_list::{AllowList, AllowListStore};
use crate::builder::EventStoreBuilder;
use crate::cache::{Cache, FileCache, InMemoryCache, setup_caches};
use crate::config::TestkitConfig;
use crate::error::{TestkitError, TestkitResult as Result};
use crate::publisher::TestingEventPublisherFactory;
use crate::queue::{CatchUpJobDecoder, JobManager, Queue};
use crate::telemetry;
use ddd_eventstore::domain_event::{DomainEvent, Event};
use ddd_eventstore::eventing::{
    EventListener, EventListenerInvoker, InMemoryMappingProvider, ListenerRegistry,
    MappingOptions,
};
use ddd_eventstore::store::{
    EventStore, EventStoreFactory, InMemoryEventStore, InMemoryEventStoreFactory,
};
use ddd_eventstore::value_object::{EventStoreId, ListenerId, StreamName, ValueObject};
use std::future::Future;
use std::sync::Arc;

pub struct TestHarness {
    config: TestkitConfig,
    cache: Arc<dyn Cache>,
    listeners: Arc<ListenerRegistry>,
    invoker: Arc<EventListenerInvoker>,
    job_manager: Arc<JobManager>,
    mappings: Arc<InMemoryMappingProvider>,
    allow_list: Arc<AllowListStore>,
    publishers: Arc<TestingEventPublisherFactory>,
    event_stores: Arc<InMemoryEventStoreFactory>,
    builder: EventStoreBuilder,
}

#[bon::bon]
impl TestHarness {
    /// 装配对象图
    ///
    /// 未指定 `cache` 时：配置了 `cache_dir` 用文件缓存，否则用内存缓存。
    /// `queues` 会按名称注册到作业管理器，替代默认的同进程队列。
    #[builder]
    pub fn new(
        #[builder(default)] config: TestkitConfig,
        cache: Option<Arc<dyn Cache>>,
        #[builder(default)] listeners: Vec<Arc<dyn EventListener>>,
        #[builder(default)] queues: Vec<Arc<dyn Queue>>,
    ) -> Result<Self> {
        let cache: Arc<dyn Cache> = match (cache, &config.cache_dir) {
            (Some(cache), _) => cache,
            (None, Some(dir)) => Arc::new(FileCache::new("file", dir.clone())),
            (None, None) => Arc::new(InMemoryCache::default()),
        };

        let registry = Arc::new(ListenerRegistry::new());
        for listener in listeners {
            registry.register(listener)?;
        }

        let invoker = Arc::new(EventListenerInvoker::new());
        let decoder = Arc::new(CatchUpJobDecoder::new(registry.clone(), invoker.clone()));
        let job_manager = Arc::new(JobManager::new(
            decoder.clone(),
            config.create_missing_queues,
        ));
        for queue in queues {
            job_manager.register_queue(queue);
        }

        let mappings = Arc::new(InMemoryMappingProvider::new());
        let allow_list = Arc::new(AllowListStore::new(
            cache.clone(),
            config.allow_list_cache_key.clone(),
            registry.clone(),
        ));
        let publishers = Arc::new(TestingEventPublisherFactory::new(
            mappings.clone(),
            allow_list.clone(),
            job_manager.clone(),
            config.default_queue_name.clone(),
        ));
        let event_stores = Arc::new(InMemoryEventStoreFactory::new(publishers.clone()));

        let event_store_factory: Arc<dyn EventStoreFactory> = event_stores.clone();
        decoder.bind_event_stores(&event_store_factory)?;
        let builder = EventStoreBuilder::new(event_store_factory, publishers.clone());

        Ok(Self {
            config,
            cache,
            listeners: registry,
            invoker,
            job_manager,
            mappings,
            allow_list,
            publishers,
            event_stores,
            builder,
        })
    }
}

impl TestHarness {
    /// 按环境变量配置装配
    pub fn from_env() -> Result<Self> {
        Self::builder().config(TestkitConfig::from_env()).build()
    }

    /// 初始化日志并准备缓存后端，测试开始前调用一次
    pub fn set_up(&self) -> Result<()> {
        telemetry::init();
        setup_caches(std::slice::from_ref(&self.cache))?;
        tracing::debug!(
            cache = self.cache.name(),
            listeners = self.listeners.len(),
            "test harness set up"
        );
        Ok(())
    }

    pub fn config(&self) -> &TestkitConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<dyn Cache> {
        &self.cache
    }

    pub fn listeners(&self) -> &Arc<ListenerRegistry> {
        &self.listeners
    }

    pub fn invoker(&self) -> &Arc<EventListenerInvoker> {
        &self.invoker
    }

    pub fn job_manager(&self) -> &Arc<JobManager> {
        &self.job_manager
    }

    pub fn mappings(&self) -> &Arc<InMemoryMappingProvider> {
        &self.mappings
    }

    pub fn allow_list(&self) -> &Arc<AllowListStore> {
        &self.allow_list
    }

    pub fn publishers(&self) -> &Arc<TestingEventPublisherFactory> {
        &self.publishers
    }

    pub fn event_stores(&self) -> &Arc<InMemoryEventStoreFactory> {
        &self.event_stores
    }

    pub fn event_store_builder(&self) -> &EventStoreBuilder {
        &self.builder
    }

    /// 具体类型的内存事件存储
    pub fn event_store(&self, event_store: &EventStoreId) -> Result<Arc<InMemoryEventStore>> {
        Ok(self.event_stores.store(event_store)?)
    }

    /// 注册监听器
    ///
    /// 映射需在事件存储第一次使用之前配置，发布器创建时读取映射表。
    pub fn register_listener(&self, listener: Arc<dyn EventListener>) -> Result<()> {
        Ok(self.listeners.register(listener)?)
    }

    /// 按监听器订阅的事件类型为事件存储配置映射
    pub fn map_listener(
        &self,
        event_store: &EventStoreId,
        listener: &dyn EventListener,
        options: MappingOptions,
    ) {
        self.mappings.map_listener(event_store, listener, options);
    }

    /// 为事件存储配置映射，监听器尚未注册时一并注册
    ///
    /// 空白的事件存储标识或监听器标识会被拒绝。
    pub fn subscribe(
        &self,
        event_store: &EventStoreId,
        listener: Arc<dyn EventListener>,
        options: MappingOptions,
    ) -> Result<()> {
        event_store.validate()?;
        if !self.listeners.contains(&listener.listener_id()) {
            self.register_listener(listener.clone())?;
        }
        self.map_listener(event_store, listener.as_ref(), options);
        Ok(())
    }

    pub async fn setup_event_store(&self, event_store: &EventStoreId) -> Result<Arc<dyn EventStore>> {
        self.builder.setup_event_store(event_store).await
    }

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
        self.builder
            .build_event_store_with_events(event_store, stream, events)
            .await
    }

    pub async fn load_event_stream_as_vec(
        &self,
        event_store: &EventStoreId,
        stream: &StreamName,
        min_sequence_number: u64,
    ) -> Result<Vec<DomainEvent>> {
        self.builder
            .load_event_stream_as_vec(event_store, stream, min_sequence_number)
            .await
    }

    pub async fn invoke_deferred_event_publishers(&self) -> Result<usize> {
        self.publishers.invoke_deferred_event_publishers().await
    }

    /// 见 [`AllowListStore::with_allowed_listeners`]
    pub async fn with_allowed_listeners<I, L, F, Fut, T, E>(
        &self,
        listeners: I,
        action: F,
    ) -> std::result::Result<T, E>
    where
        I: IntoIterator<Item = L>,
        L: Into<ListenerId>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: From<TestkitError>,
    {
        self.allow_list.with_allowed_listeners(listeners, action).await
    }

    /// 见 [`AllowListStore::without_any_listeners`]
    pub async fn without_any_listeners<F, Fut, T, E>(&self, action: F) -> std::result::Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: From<TestkitError>,
    {
        self.allow_list.without_any_listeners(action).await
    }

    /// 当前白名单
    pub fn allowed_listeners(&self) -> Result<AllowList> {
        self.allow_list.current()
    }
}
