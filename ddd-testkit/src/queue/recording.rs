use super::{Message, Queue, QueueOptions};
use crate::error::TestkitResult as Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// 一次提交
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub message_id: String,
    pub payload: Value,
    pub options: QueueOptions,
}

/// 只记录、不执行的队列，用于断言提交了哪些作业
///
/// 记录的消息可以 `peek`，`flush` 清空记录。
pub struct RecordingQueue {
    name: String,
    submissions: Mutex<Vec<Submission>>,
}

impl RecordingQueue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            submissions: Mutex::new(Vec::new()),
        }
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.lock().clone()
    }

    /// 把载荷还原为作业类型
    pub fn jobs<J: DeserializeOwned>(&self) -> Result<Vec<J>> {
        self.lock()
            .iter()
            .map(|s| Ok(serde_json::from_value(s.payload.clone())?))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Submission>> {
        self.submissions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Queue for RecordingQueue {
    async fn set_up(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn submit(&self, payload: &[u8], options: &QueueOptions) -> Result<String> {
        let message_id = uuid::Uuid::new_v4().to_string();
        let payload: Value = serde_json::from_slice(payload)?;
        self.lock().push(Submission {
            message_id: message_id.clone(),
            payload,
            options: options.clone(),
        });
        Ok(message_id)
    }

    async fn wait_and_take(&self, _timeout: Option<Duration>) -> Result<Option<Message>> {
        Ok(None)
    }

    async fn wait_and_reserve(&self, _timeout: Option<Duration>) -> Result<Option<Message>> {
        Ok(None)
    }

    async fn release(&self, _message_id: &str, _options: &QueueOptions) -> Result<()> {
        Ok(())
    }

    async fn abort(&self, _message_id: &str) -> Result<()> {
        Ok(())
    }

    async fn finish(&self, _message_id: &str) -> Result<bool> {
        Ok(false)
    }

    async fn peek(&self, limit: usize) -> Result<Vec<Message>> {
        self.lock()
            .iter()
            .take(limit)
            .map(|s| {
                Ok(Message::new(
                    s.message_id.clone(),
                    serde_json::to_vec(&s.payload)?,
                ))
            })
            .collect()
    }

    async fn count_ready(&self) -> Result<usize> {
        Ok(self.len())
    }

    async fn count_reserved(&self) -> Result<usize> {
        Ok(0)
    }

    async fn count_failed(&self) -> Result<usize> {
        Ok(0)
    }

    async fn flush(&self) -> Result<()> {
        self.lock().clear();
        Ok(())
    }
}
