//! 事件发布器（EventPublisher）协议
//!
//! 事件存储在提交成功后把同一批事件交给发布器，由发布器决定何时、
//! 以何种方式通知监听器。
//!
use crate::{
    domain_event::DomainEvents, error::DomainResult as Result, value_object::EventStoreId,
};
use async_trait::async_trait;
use std::sync::Arc;

/// 事件发布器：接收一次提交产生的事件批次
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, events: DomainEvents) -> Result<()>;
}

#[async_trait]
impl<T> EventPublisher for Arc<T>
where
    T: EventPublisher + ?Sized,
{
    async fn publish(&self, events: DomainEvents) -> Result<()> {
        (**self).publish(events).await
    }
}

/// 发布器工厂：每个事件存储标识对应一个发布器
pub trait EventPublisherFactory: Send + Sync {
    fn create(&self, event_store: &EventStoreId) -> Result<Arc<dyn EventPublisher>>;
}
