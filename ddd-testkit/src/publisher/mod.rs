//! 测试用事件发布（publisher）
//!
//! - `TestingEventPublisher`：按映射表与白名单为一批事件生成追赶作业并提交到队列；
//! - `DeferredEventPublisher`：记录提交时发布的事件，直到显式 `flush` 才分发；
//! - `TestingEventPublisherFactory`：每个事件存储一个发布器，并能一次性 flush 全部。
//!
mod deferred;
mod factory;
mod testing;

pub use deferred::{DeferredEventPublisher, DeferredState};
pub use factory::{PublisherEntry, TestingEventPublisherFactory};
pub use testing::TestingEventPublisher;
