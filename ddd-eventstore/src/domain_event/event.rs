use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DomainError, DomainResult};

/// 强类型事件：声明自身的事件类型标识
pub trait TypedEvent: Serialize + DeserializeOwned {
    /// 事件类型（形如 `OrderEvent.Placed`），映射表按它匹配监听器
    const EVENT_TYPE: &'static str;
}

/// 未装饰的领域事件：类型标识 + JSON 载荷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    event_type: String,
    payload: Value,
}

impl DomainEvent {
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }

    /// 从强类型事件构造
    pub fn from_typed<T: TypedEvent>(event: &T) -> DomainResult<Self> {
        Ok(Self::new(T::EVENT_TYPE, serde_json::to_value(event)?))
    }

    /// 还原为强类型事件，类型标识不一致时返回 `TypeMismatch`
    pub fn to_typed<T: TypedEvent>(&self) -> DomainResult<T> {
        if self.event_type != T::EVENT_TYPE {
            return Err(DomainError::TypeMismatch {
                expected: T::EVENT_TYPE.to_string(),
                found: self.event_type.clone(),
            });
        }
        Ok(serde_json::from_value(self.payload.clone())?)
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn is<T: TypedEvent>(&self) -> bool {
        self.event_type == T::EVENT_TYPE
    }
}
