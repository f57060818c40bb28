//! 作业队列（Queue）协议
//!
//! 队列接收序列化后的作业载荷并返回消息标识。测试中使用的同进程队列在提交时
//! 立即执行作业，阻塞式的取出/预留/释放操作因此不受支持。
//!
mod job;
mod job_manager;
mod recording;
mod same_process;

pub use job::{CatchUpEventListenerJob, CatchUpJobDecoder, Job, JobDecoder};
pub use job_manager::JobManager;
pub use recording::{RecordingQueue, Submission};
pub use same_process::SameProcessQueue;

use crate::error::TestkitResult as Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;

/// 透传给队列的选项
pub type QueueOptions = Map<String, Value>;

/// 队列消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    identifier: String,
    payload: Vec<u8>,
    number_of_releases: u32,
}

impl Message {
    pub fn new(identifier: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            identifier: identifier.into(),
            payload,
            number_of_releases: 0,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn number_of_releases(&self) -> u32 {
        self.number_of_releases
    }
}

/// 作业队列
#[async_trait]
pub trait Queue: Send + Sync {
    /// 准备队列后端
    async fn set_up(&self) -> Result<()>;

    fn name(&self) -> &str;

    /// 提交载荷，返回消息标识
    async fn submit(&self, payload: &[u8], options: &QueueOptions) -> Result<String>;

    /// 取出并移除一条消息；超时返回 `None`
    async fn wait_and_take(&self, timeout: Option<Duration>) -> Result<Option<Message>>;

    /// 预留一条消息，处理后需 `finish` 或 `release`
    async fn wait_and_reserve(&self, timeout: Option<Duration>) -> Result<Option<Message>>;

    /// 把预留的消息放回队列
    async fn release(&self, message_id: &str, options: &QueueOptions) -> Result<()>;

    /// 把预留的消息标记为失败
    async fn abort(&self, message_id: &str) -> Result<()>;

    /// 完成预留的消息
    async fn finish(&self, message_id: &str) -> Result<bool>;

    async fn peek(&self, limit: usize) -> Result<Vec<Message>>;

    async fn count_ready(&self) -> Result<usize>;

    async fn count_reserved(&self) -> Result<usize>;

    async fn count_failed(&self) -> Result<usize>;

    /// 清空队列
    async fn flush(&self) -> Result<()>;
}
