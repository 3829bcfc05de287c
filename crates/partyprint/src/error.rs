use uuid::Uuid;

pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("job not found: {0}")]
    NotFound(Uuid),

    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Status text that is not one of the four job states.
    #[error("invalid job status: {0}")]
    InvalidStatus(String),

    #[error("blob store error: {0}")]
    Blob(String),
}

impl QueueError {
    pub fn storage(msg: impl Into<String>) -> Self {
        let msg: String = msg.into();
        Self::Storage(msg.into())
    }
}

impl From<sqlx::Error> for QueueError {
    fn from(e: sqlx::Error) -> Self {
        Self::Storage(Box::new(e))
    }
}
