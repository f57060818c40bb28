//! 同进程队列（SameProcessQueue）
//!
//! 提交即执行：解码载荷、以自身作为队列上下文执行作业，执行完成后才返回消息标识。
//! 不保存任何消息，因此不需要 worker，也不支持取出、预留与释放。

use super::{JobDecoder, Message, Queue, QueueOptions};
use crate::error::{TestkitError, TestkitResult as Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

const NO_RESERVING: &str = "the same-process queue does not support reserving of messages; \
     it is not required to use a worker for this queue as messages are handled immediately upon submission";
const NO_RELEASING: &str = "the same-process queue does not support releasing of failed messages; \
     the \"maximumNumberOfReleases\" setting should be removed or set to 0 for this queue";

pub struct SameProcessQueue {
    name: String,
    decoder: Arc<dyn JobDecoder>,
}

impl SameProcessQueue {
    pub fn new(name: impl Into<String>, decoder: Arc<dyn JobDecoder>) -> Self {
        Self {
            name: name.into(),
            decoder,
        }
    }
}

#[async_trait]
impl Queue for SameProcessQueue {
    async fn set_up(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn submit(&self, payload: &[u8], _options: &QueueOptions) -> Result<String> {
        let message_id = uuid::Uuid::new_v4().to_string();
        let message = Message::new(message_id.clone(), payload.to_vec());
        let job = self.decoder.decode(payload)?;

        if !job.execute(self, &message).await? {
            return Err(TestkitError::JobExecutionFailed { label: job.label() });
        }

        tracing::debug!(queue = %self.name, message = %message_id, job = %job.label(), "job executed");
        Ok(message_id)
    }

    async fn wait_and_take(&self, _timeout: Option<Duration>) -> Result<Option<Message>> {
        Err(TestkitError::UnsupportedOperation {
            operation: "wait_and_take",
            reason: NO_RESERVING,
        })
    }

    async fn wait_and_reserve(&self, _timeout: Option<Duration>) -> Result<Option<Message>> {
        Err(TestkitError::UnsupportedOperation {
            operation: "wait_and_reserve",
            reason: NO_RESERVING,
        })
    }

    async fn release(&self, _message_id: &str, _options: &QueueOptions) -> Result<()> {
        Err(TestkitError::UnsupportedOperation {
            operation: "release",
            reason: NO_RELEASING,
        })
    }

    async fn abort(&self, _message_id: &str) -> Result<()> {
        Ok(())
    }

    async fn finish(&self, _message_id: &str) -> Result<bool> {
        Ok(false)
    }

    async fn peek(&self, _limit: usize) -> Result<Vec<Message>> {
        Ok(Vec::new())
    }

    async fn count_ready(&self) -> Result<usize> {
        Ok(0)
    }

    async fn count_reserved(&self) -> Result<usize> {
        Ok(0)
    }

    async fn count_failed(&self) -> Result<usize> {
        Ok(0)
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::Job;
    use serde::Deserialize;
    use std::sync::Mutex;

    #[derive(Deserialize)]
    struct Echo {
        ok: bool,
    }

    struct EchoJob {
        ok: bool,
        seen: Arc<Mutex<Vec<(String, String)>>>,
    }

    #[async_trait]
    impl Job for EchoJob {
        fn label(&self) -> String {
            format!("echo ok={}", self.ok)
        }
        async fn execute(&self, queue: &dyn Queue, message: &Message) -> Result<bool> {
            self.seen
                .lock()
                .unwrap()
                .push((queue.name().to_string(), message.identifier().to_string()));
            Ok(self.ok)
        }
    }

    #[derive(Default)]
    struct EchoDecoder {
        seen: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl JobDecoder for EchoDecoder {
        fn decode(&self, payload: &[u8]) -> Result<Box<dyn Job>> {
            let echo: Echo = serde_json::from_slice(payload).map_err(|e| {
                TestkitError::InvalidPayload {
                    reason: e.to_string(),
                }
            })?;
            Ok(Box::new(EchoJob {
                ok: echo.ok,
                seen: self.seen.clone(),
            }))
        }
    }

    fn queue() -> (SameProcessQueue, Arc<Mutex<Vec<(String, String)>>>) {
        let decoder = EchoDecoder::default();
        let seen = decoder.seen.clone();
        (SameProcessQueue::new("q1", Arc::new(decoder)), seen)
    }

    #[tokio::test]
    async fn submit_executes_before_returning() {
        let (queue, seen) = queue();
        let id = queue
            .submit(br#"{"ok": true}"#, &QueueOptions::new())
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], ("q1".to_string(), id));
    }

    #[tokio::test]
    async fn submit_fails_for_undecodable_payload() {
        let (queue, seen) = queue();
        let err = queue
            .submit(b"not a job", &QueueOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TestkitError::InvalidPayload { .. }));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn submit_fails_when_job_reports_failure() {
        let (queue, _) = queue();
        let err = queue
            .submit(br#"{"ok": false}"#, &QueueOptions::new())
            .await
            .unwrap_err();
        match err {
            TestkitError::JobExecutionFailed { label } => assert_eq!(label, "echo ok=false"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn blocking_operations_are_unsupported() {
        let (queue, _) = queue();
        let errors = [
            queue.wait_and_take(None).await.unwrap_err(),
            queue
                .wait_and_reserve(Some(Duration::from_secs(1)))
                .await
                .unwrap_err(),
            queue.release("m", &QueueOptions::new()).await.unwrap_err(),
        ];
        for err in errors {
            match err {
                TestkitError::UnsupportedOperation { reason, .. } => {
                    assert!(reason.contains("same-process queue"))
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn nothing_is_ever_queued() {
        let (queue, _) = queue();
        queue.set_up().await.unwrap();
        queue.submit(br#"{"ok": true}"#, &QueueOptions::new()).await.unwrap();

        assert!(queue.peek(10).await.unwrap().is_empty());
        assert_eq!(queue.count_ready().await.unwrap(), 0);
        assert_eq!(queue.count_reserved().await.unwrap(), 0);
        assert_eq!(queue.count_failed().await.unwrap(), 0);
        assert!(!queue.finish("m").await.unwrap());
        queue.abort("m").await.unwrap();
        queue.flush().await.unwrap();
    }
}
