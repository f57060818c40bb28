//! 事件溯源测试工具（ddd-testkit）
//!
//! 让测试提交领域事件后，确定性地控制哪些监听器被通知：
//! - 发布器（`publisher`）：提交时只记录事件，`invoke_deferred_event_publishers` 时才分发；
//! - 白名单（`allow_list`）：进程级的监听器白名单，经缓存（`cache`）与子进程共享；
//! - 队列（`queue`）：同进程队列在提交时立即执行追赶作业，不需要 worker；
//! - 装配（`harness`）与构建器（`builder`）：准备存储、写入事件、读回事件流。
//!
//! 典型用法：
//! 1. `TestHarness::builder()` 装配并 `set_up()`；
//! 2. 注册监听器并为事件存储配置映射；
//! 3. `build_event_store_with_events` 写入事件，返回时监听器已处理完毕；
//! 4. 用 `with_allowed_listeners` / `without_any_listeners` 在作用域内限制监听器。
//!
pub mod allow_list;
pub mod builder;
pub mod cache;
pub mod config;
pub mod error;
pub mod harness;
pub mod instances;
pub mod publisher;
pub mod queue;
pub mod telemetry;

pub use allow_list::{AllowList, AllowListStore};
pub use builder::EventStoreBuilder;
pub use config::TestkitConfig;
pub use error::{TestkitError, TestkitResult};
pub use harness::TestHarness;
pub use instances::{find_first_instance_of, find_instances_of};
