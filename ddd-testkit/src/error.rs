use ddd_eventstore::error::DomainError;
use ddd_eventstore::value_object::ListenerId;

#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum TestkitError {
    #[error("domain: {0}")]
    Domain(#[from] DomainError),

    #[error("serialization: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("given payload could not be decoded to a job: {reason}")]
    InvalidPayload { reason: String },

    #[error("result for job \"{label}\" was false")]
    JobExecutionFailed { label: String },

    #[error("unsupported operation {operation}: {reason}")]
    UnsupportedOperation {
        operation: &'static str,
        reason: &'static str,
    },

    #[error("{0} is not an event listener")]
    InvalidListener(ListenerId),

    #[error("queue not found: {0}")]
    QueueNotFound(String),

    #[error("cache: {0}")]
    Cache(String),

    #[error("invalid state: {0}")]
    InvalidState(String),
}

pub type TestkitResult<T> = Result<T, TestkitError>;

// 发布器协议在领域层定义，测试层错误经由它返回时折叠为 DomainError
impl From<TestkitError> for DomainError {
    fn from(err: TestkitError) -> Self {
        match err {
            TestkitError::Domain(inner) => inner,
            other => DomainError::EventPublisher {
                reason: other.to_string(),
            },
        }
    }
}
