//! 值对象（Value Object）
//!
//! 无标识、以值相等为准的对象。这里集中定义事件存储、事件流与监听器的标识，
//! 均为字符串新类型，序列化时保持透明。
//!

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// 值对象抽象
pub trait ValueObject {
    /// 业务校验失败时的错误类型
    type Error;

    /// 创建值对象时进行验证
    fn validate(&self) -> Result<(), Self::Error>;
}

macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// 构造并校验（不允许空白）
            pub fn parse(value: impl Into<String>) -> DomainResult<Self> {
                let id = Self(value.into());
                id.validate()?;
                Ok(id)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ValueObject for $name {
            type Error = DomainError;

            fn validate(&self) -> Result<(), Self::Error> {
                if self.0.trim().is_empty() {
                    return Err(DomainError::InvalidValue {
                        reason: format!("{} must not be empty", $label),
                    });
                }
                Ok(())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_identifier!(
    /// 事件存储标识（形如 `Acme.Shop:EventStore`）
    EventStoreId,
    "event store identifier"
);

string_identifier!(
    /// 事件流名称
    StreamName,
    "stream name"
);

string_identifier!(
    /// 事件监听器标识，映射与白名单都以它为键
    ListenerId,
    "listener identifier"
);

/// 虚拟事件流：读取一个存储内全部事件流（按全局序号）
const ALL_STREAMS: &str = "$all";

impl StreamName {
    pub fn all() -> Self {
        Self(ALL_STREAMS.to_string())
    }

    pub fn is_virtual(&self) -> bool {
        self.0 == ALL_STREAMS
    }
}
