//! 按能力筛选实例
//!
//! 以能力函数 `S -> Option<T>` 代替运行时类型检查：返回 `Some` 的元素即为所需实例，
//! 例如从监听器列表中取出某个具体投影，或从事件批次中取出某类型的事件载荷。
//!
//! ```ignore
//! let placed: Vec<OrderPlaced> =
//!     find_instances_of(events.iter(), |e| e.domain_event().to_typed().ok());
//! ```
//!

/// 所有具备该能力的实例，保持原有顺序
pub fn find_instances_of<S, T, I, F>(subject: I, capability: F) -> Vec<T>
where
    I: IntoIterator<Item = S>,
    F: FnMut(S) -> Option<T>,
{
    subject.into_iter().filter_map(capability).collect()
}

/// 第一个具备该能力的实例
pub fn find_first_instance_of<S, T, I, F>(subject: I, capability: F) -> Option<T>
where
    I: IntoIterator<Item = S>,
    F: FnMut(S) -> Option<T>,
{
    subject.into_iter().find_map(capability)
}
