use super::{JobDecoder, Queue, QueueOptions, SameProcessQueue};
use crate::error::{TestkitError, TestkitResult as Result};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;

/// 作业管理器：序列化作业并提交到指定名称的队列
///
/// - 队列按名称注册，`register_queue` 可替换为任意实现（如记录提交的测试队列）；
/// - 开启 `create_missing` 时，未注册的名称会按需创建同进程队列。
pub struct JobManager {
    queues: DashMap<String, Arc<dyn Queue>>,
    decoder: Arc<dyn JobDecoder>,
    create_missing: bool,
}

impl JobManager {
    pub fn new(decoder: Arc<dyn JobDecoder>, create_missing: bool) -> Self {
        Self {
            queues: DashMap::new(),
            decoder,
            create_missing,
        }
    }

    /// 注册队列，同名队列会被替换
    pub fn register_queue(&self, queue: Arc<dyn Queue>) {
        self.queues.insert(queue.name().to_string(), queue);
    }

    /// 按名称取得队列
    pub async fn queue_named(&self, queue_name: &str) -> Result<Arc<dyn Queue>> {
        if let Some(queue) = self.queues.get(queue_name).map(|q| q.clone()) {
            return Ok(queue);
        }
        if !self.create_missing {
            return Err(TestkitError::QueueNotFound(queue_name.to_string()));
        }

        let created: Arc<dyn Queue> =
            Arc::new(SameProcessQueue::new(queue_name, self.decoder.clone()));
        created.set_up().await?;
        let queue = self
            .queues
            .entry(queue_name.to_string())
            .or_insert(created)
            .clone();
        tracing::debug!(queue = queue_name, "same-process queue created");
        Ok(queue)
    }

    /// 序列化作业并提交，返回消息标识
    pub async fn queue<J>(&self, queue_name: &str, job: &J, options: &QueueOptions) -> Result<String>
    where
        J: Serialize + Sync,
    {
        let payload = serde_json::to_vec(job)?;
        let queue = self.queue_named(queue_name).await?;
        queue.submit(&payload, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{Job, RecordingQueue};
    use serde_json::json;

    struct NeverDecodes;

    impl JobDecoder for NeverDecodes {
        fn decode(&self, _payload: &[u8]) -> Result<Box<dyn Job>> {
            Err(TestkitError::InvalidPayload {
                reason: "never".into(),
            })
        }
    }

    #[tokio::test]
    async fn registered_queue_receives_serialized_job_and_options() {
        let manager = JobManager::new(Arc::new(NeverDecodes), false);
        let recording = Arc::new(RecordingQueue::new("recording"));
        manager.register_queue(recording.clone());

        let mut options = QueueOptions::new();
        options.insert("priority".into(), json!(1));
        let id = manager
            .queue("recording", &json!({"listener": "l"}), &options)
            .await
            .unwrap();

        let submitted = recording.submissions();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].message_id, id);
        assert_eq!(submitted[0].payload, json!({"listener": "l"}));
        assert_eq!(submitted[0].options, options);
    }

    #[tokio::test]
    async fn unknown_queue_is_created_or_rejected() {
        let strict = JobManager::new(Arc::new(NeverDecodes), false);
        let err = strict.queue_named("q1").await.err().unwrap();
        assert!(matches!(err, TestkitError::QueueNotFound(name) if name == "q1"));

        let lenient = JobManager::new(Arc::new(NeverDecodes), true);
        let first = lenient.queue_named("q1").await.unwrap();
        let second = lenient.queue_named("q1").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        // 自动创建的是同进程队列：提交即解码
        let err = lenient
            .queue("q1", &json!({}), &QueueOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TestkitError::InvalidPayload { .. }));
    }
}
