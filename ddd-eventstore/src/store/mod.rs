//! 事件存储（EventStore）协议
//!
//! 事件存储按事件流追加与读取领域事件；提交成功后把事件批次交给发布器。
//! 真实存储后端由基础设施提供，这里给出协议与一个内存实现。
//!
mod in_memory;

pub use in_memory::{InMemoryEventStore, InMemoryEventStoreFactory};

use crate::{
    domain_event::{DomainEvents, EventEnvelope},
    error::DomainResult as Result,
    value_object::{EventStoreId, StreamName},
};
use async_trait::async_trait;
use std::sync::Arc;

/// 事件存储
#[async_trait]
pub trait EventStore: Send + Sync {
    /// 存储标识
    fn identifier(&self) -> &EventStoreId;

    /// 初始化存储（幂等）
    async fn setup(&self) -> Result<()>;

    /// 向事件流追加事件，并通知发布器
    async fn commit(&self, stream: &StreamName, events: DomainEvents) -> Result<()>;

    /// 读取事件流中序号不小于 `from_sequence_number` 的事件
    async fn load(
        &self,
        stream: &StreamName,
        from_sequence_number: u64,
    ) -> Result<Vec<EventEnvelope>>;
}

/// 事件存储工厂：按标识创建并缓存事件存储
pub trait EventStoreFactory: Send + Sync {
    fn create(&self, event_store: &EventStoreId) -> Result<Arc<dyn EventStore>>;
}
