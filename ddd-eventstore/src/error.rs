//! 领域层统一错误定义
//!
//! 聚焦事件序列化、事件存储、监听器与值校验等最小必要集合，
//! 便于在测试工具层统一转换为上层错误。
//!
use thiserror::Error;

/// 统一错误类型（事件存储层最小必要集）
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DomainError {
    // --- 序列化 ---
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
    #[error("type mismatch: expected={expected}, found={found}")]
    TypeMismatch { expected: String, found: String },

    // --- 事件存储 ---
    #[error("event store error: store={store}, reason={reason}")]
    EventStore { store: String, reason: String },

    // --- 事件发布 ---
    #[error("event publisher error: {reason}")]
    EventPublisher { reason: String },

    // --- 事件监听器 ---
    #[error("event listener error: listener={listener}, reason={reason}")]
    EventListener { listener: String, reason: String },

    // --- 通用 ---
    #[error("invalid value: {reason}")]
    InvalidValue { reason: String },
    #[error("not found: {reason}")]
    NotFound { reason: String },
}

impl DomainError {
    pub fn event_store(store: impl Into<String>, reason: impl Into<String>) -> Self {
        DomainError::EventStore {
            store: store.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(reason: impl Into<String>) -> Self {
        DomainError::NotFound {
            reason: reason.into(),
        }
    }
}

/// 统一 Result 类型别名
pub type DomainResult<T> = Result<T, DomainError>;
