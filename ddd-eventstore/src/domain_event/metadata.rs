use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::value_object::StreamName;

/// 事件写入存储后的原始元数据
#[derive(Builder, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEventMetadata {
    /// 事件唯一标识（装饰未指定时由存储生成）
    event_id: String,
    /// 所属事件流
    stream_name: StreamName,
    /// 存储内全局序号，从 1 开始
    sequence_number: u64,
    /// 写入时间
    recorded_at: DateTime<Utc>,
    causation_id: Option<String>,
    correlation_id: Option<String>,
    #[builder(default)]
    #[serde(default)]
    metadata: Map<String, Value>,
}

impl RawEventMetadata {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn stream_name(&self) -> &StreamName {
        &self.stream_name
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn recorded_at(&self) -> &DateTime<Utc> {
        &self.recorded_at
    }

    pub fn causation_id(&self) -> Option<&str> {
        self.causation_id.as_deref()
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }
}
