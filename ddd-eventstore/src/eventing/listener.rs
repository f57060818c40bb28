//! 事件监听器（EventListener）与注册表
//!
//! 监听器声明自身标识与订阅的事件类型，并逐条处理追赶到的事件；
//! 注册表以标识索引监听器，同时充当“某标识是否是监听器”的能力检查。
//!
use crate::{
    domain_event::EventEnvelope,
    error::{DomainError, DomainResult as Result},
    value_object::{ListenerId, ValueObject},
};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// 事件监听器：处理某些类型的事件（投影、流程管理器等）
#[async_trait]
pub trait EventListener: Send + Sync {
    /// 监听器标识（用于映射、白名单与位置记录）
    fn listener_id(&self) -> ListenerId;
    /// 订阅的事件类型
    fn subscribed_event_types(&self) -> Vec<String>;
    /// 处理单个事件
    async fn when(&self, envelope: &EventEnvelope) -> anyhow::Result<()>;
}

/// 监听器注册表
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: DashMap<ListenerId, Arc<dyn EventListener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册监听器，同一标识只能注册一次，标识不能为空白
    pub fn register(&self, listener: Arc<dyn EventListener>) -> Result<()> {
        let id = listener.listener_id();
        id.validate()?;
        if self.listeners.contains_key(&id) {
            return Err(DomainError::InvalidValue {
                reason: format!("listener already registered: {id}"),
            });
        }
        self.listeners.insert(id, listener);
        Ok(())
    }

    pub fn get(&self, id: &ListenerId) -> Option<Arc<dyn EventListener>> {
        self.listeners.get(id).map(|l| l.clone())
    }

    /// 能力检查：该标识是否对应一个已注册的监听器
    pub fn contains(&self, id: &ListenerId) -> bool {
        self.listeners.contains_key(id)
    }

    /// 已注册的监听器标识（有序）
    pub fn ids(&self) -> Vec<ListenerId> {
        let mut ids: Vec<ListenerId> = self.listeners.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop(&'static str);

    #[async_trait]
    impl EventListener for Noop {
        fn listener_id(&self) -> ListenerId {
            ListenerId::from(self.0)
        }
        fn subscribed_event_types(&self) -> Vec<String> {
            vec![]
        }
        async fn when(&self, _envelope: &EventEnvelope) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn registry_rejects_duplicates_and_lists_sorted_ids() {
        let registry = ListenerRegistry::new();
        registry.register(Arc::new(Noop("b"))).unwrap();
        registry.register(Arc::new(Noop("a"))).unwrap();

        let err = registry.register(Arc::new(Noop("a"))).unwrap_err();
        assert!(matches!(err, DomainError::InvalidValue { .. }));

        assert_eq!(registry.ids(), vec![ListenerId::from("a"), ListenerId::from("b")]);
        assert!(registry.contains(&ListenerId::from("a")));
        assert!(!registry.contains(&ListenerId::from("c")));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn registry_rejects_blank_listener_ids() {
        let registry = ListenerRegistry::new();
        let err = registry.register(Arc::new(Noop(" "))).unwrap_err();
        assert!(matches!(err, DomainError::InvalidValue { .. }));
        assert!(registry.is_empty());
    }
}
