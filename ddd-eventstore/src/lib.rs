//! 事件存储领域层（ddd-eventstore）
//!
//! 提供事件溯源应用在测试与运行时共用的最小抽象：
//! - 领域事件（`domain_event`）：原始事件、装饰事件、事件批次与读取信封；
//! - 事件存储（`store`）：按事件流提交/读取的协议与内存实现；
//! - 事件子系统（`eventing`）：发布器、监听器、事件到监听器的映射与追赶；
//! - 值对象（`value_object`）：存储、事件流与监听器标识。
//!
//! 典型用法：
//! 1. 注册监听器并为事件存储配置映射；
//! 2. 通过 `EventStoreFactory` 获得事件存储并 `setup`；
//! 3. `commit` 事件后由发布器决定何时通知监听器；
//! 4. 监听器通过 `EventListenerInvoker` 追赶到最新位置。
//!
pub mod domain_event;
pub mod error;
pub mod eventing;
pub mod store;
pub mod value_object;
