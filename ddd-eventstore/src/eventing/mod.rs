//! 事件子系统（eventing）
//!
//! 定义事件写入后通知监听器所需的协议：
//! - `EventPublisher` / `EventPublisherFactory`：事件存储提交后交给发布器；
//! - `EventListener` / `ListenerRegistry`：监听器及其按标识的注册表；
//! - `EventToListenerMapping`：事件类型到监听器的映射与投递配置；
//! - `EventListenerInvoker`：让监听器从存储追赶（catch up）到最新位置。
//!
//! 该模块不绑定投递方式，具体发布器（如测试用的同步队列发布器）由上层实现。
//!
pub mod invoker;
pub mod listener;
pub mod mapping;
pub mod publisher;

pub use invoker::EventListenerInvoker;
pub use listener::{EventListener, ListenerRegistry};
pub use mapping::{
    EventToListenerMapping, EventToListenerMappingProvider, EventToListenerMappings,
    InMemoryMappingProvider, MappingOptions,
};
pub use publisher::{EventPublisher, EventPublisherFactory};
