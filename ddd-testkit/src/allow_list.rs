//! 监听器白名单（AllowList）
//!
//! 决定哪些监听器会收到追赶任务。状态保存在缓存的固定键下，
//! 派生的子进程通过同一缓存看到同样的限制；每个进程首次使用时从缓存加载一次。
//!
//! 只允许通过 `with_allowed_listeners` / `without_any_listeners` 在一个作用域内修改，
//! 离开作用域（正常返回、返回错误或 panic）都会恢复原状态并写回缓存：
//!
//! ```ignore
//! store
//!     .with_allowed_listeners(["projector.orders"], || async {
//!         builder
//!             .build_event_store_with_events(&store_id, &stream, events)
//!             .await
//!     })
//!     .await?;
//! ```
//!
use crate::cache::Cache;
use crate::error::{TestkitError, TestkitResult as Result};
use ddd_eventstore::eventing::ListenerRegistry;
use ddd_eventstore::value_object::ListenerId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::{Arc, RwLock};

/// 白名单状态
///
/// 缓存中保存带标签的值，“未限制”与“限制为空集合（屏蔽全部）”可以区分。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AllowList {
    #[default]
    Unrestricted,
    Restricted { listeners: BTreeSet<ListenerId> },
}

impl AllowList {
    pub fn only<I>(listeners: I) -> Self
    where
        I: IntoIterator<Item = ListenerId>,
    {
        AllowList::Restricted {
            listeners: listeners.into_iter().collect(),
        }
    }

    pub fn allows(&self, listener: &ListenerId) -> bool {
        match self {
            AllowList::Unrestricted => true,
            AllowList::Restricted { listeners } => listeners.contains(listener),
        }
    }

    pub fn is_restricted(&self) -> bool {
        matches!(self, AllowList::Restricted { .. })
    }
}

#[derive(Default)]
struct State {
    allow_list: AllowList,
    initialized: bool,
}

/// 白名单存储：以缓存为后端，在发布器之间共享
pub struct AllowListStore {
    cache: Arc<dyn Cache>,
    cache_key: String,
    listeners: Arc<ListenerRegistry>,
    state: RwLock<State>,
}

impl AllowListStore {
    pub fn new(
        cache: Arc<dyn Cache>,
        cache_key: impl Into<String>,
        listeners: Arc<ListenerRegistry>,
    ) -> Self {
        Self {
            cache,
            cache_key: cache_key.into(),
            listeners,
            state: RwLock::new(State::default()),
        }
    }

    /// 从缓存加载；本进程已初始化时不做任何事，未命中视为未限制
    pub fn load(&self) -> Result<()> {
        if self.read().initialized {
            return Ok(());
        }

        let allow_list = match self.cache.get(&self.cache_key)? {
            Some(value) => serde_json::from_value(value).map_err(|e| {
                TestkitError::Cache(format!(
                    "malformed allow list under {:?}: {e}",
                    self.cache_key
                ))
            })?,
            None => AllowList::Unrestricted,
        };

        let mut state = self.write();
        if !state.initialized {
            tracing::debug!(cache = self.cache.name(), ?allow_list, "allow list loaded");
            state.allow_list = allow_list;
            state.initialized = true;
        }
        Ok(())
    }

    /// 写入缓存并标记为已初始化
    pub fn save(&self, allow_list: AllowList) -> Result<()> {
        self.cache
            .set(&self.cache_key, serde_json::to_value(&allow_list)?)?;
        let mut state = self.write();
        state.allow_list = allow_list;
        state.initialized = true;
        Ok(())
    }

    /// 仅允许给定的监听器；任一标识不是监听器时报错且不修改状态
    pub fn restrict<I, L>(&self, listeners: I) -> Result<()>
    where
        I: IntoIterator<Item = L>,
        L: Into<ListenerId>,
    {
        let mut allowed = BTreeSet::new();
        for listener in listeners {
            let listener = listener.into();
            if !self.listeners.contains(&listener) {
                return Err(TestkitError::InvalidListener(listener));
            }
            allowed.insert(listener);
        }

        tracing::info!(listeners = ?allowed, "restricting listeners");
        self.save(AllowList::Restricted { listeners: allowed })
    }

    /// 屏蔽全部监听器
    pub fn unrestrict(&self) -> Result<()> {
        self.restrict(std::iter::empty::<ListenerId>())
    }

    /// 恢复为未限制
    pub fn clear(&self) -> Result<()> {
        tracing::info!("allow list cleared");
        self.save(AllowList::Unrestricted)
    }

    /// 当前状态（必要时先从缓存加载）
    pub fn current(&self) -> Result<AllowList> {
        self.load()?;
        Ok(self.read().allow_list.clone())
    }

    pub fn is_allowed(&self, listener: &ListenerId) -> Result<bool> {
        self.load()?;
        Ok(self.read().allow_list.allows(listener))
    }

    /// 在仅允许给定监听器的前提下执行 `action`，结束后恢复原白名单
    ///
    /// `action` 与恢复都失败时返回 `action` 的错误，恢复失败只记录日志。
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
        let previous = self.current()?;
        self.restrict(listeners)?;

        let guard = RestoreGuard {
            store: self,
            previous: Some(previous),
        };
        let outcome = action().await;
        let restored = guard.restore();

        let value = outcome?;
        restored?;
        Ok(value)
    }

    /// 在屏蔽全部监听器的前提下执行 `action`
    pub async fn without_any_listeners<F, Fut, T, E>(&self, action: F) -> std::result::Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: From<TestkitError>,
    {
        self.with_allowed_listeners(std::iter::empty::<ListenerId>(), action)
            .await
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// 作用域结束时恢复白名单；未显式恢复（panic、future 被丢弃）时在 drop 中恢复
struct RestoreGuard<'a> {
    store: &'a AllowListStore,
    previous: Option<AllowList>,
}

impl RestoreGuard<'_> {
    fn restore(mut self) -> Result<()> {
        match self.previous.take() {
            Some(previous) => {
                let result = self.store.save(previous);
                if let Err(e) = &result {
                    tracing::warn!(error = %e, "failed to restore allow list");
                }
                result
            }
            None => Ok(()),
        }
    }
}

impl Drop for RestoreGuard<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            if let Err(e) = self.store.save(previous) {
                tracing::warn!(error = %e, "failed to restore allow list on unwind");
            }
        }
    }
}
