use thiserror::Error;
use wabot_core::{ApiError, ChannelError};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("No conversation is open")]
    NoOpenConversation,

    #[error("Message is empty")]
    EmptyMessage,

    /// 401 from the backend; the session must be invalidated by the caller.
    #[error("Unauthorized")]
    Unauthorized,

    #[error("API error: {0}")]
    Api(ApiError),

    #[error("Malformed {name} event: {reason}")]
    MalformedEvent { name: String, reason: String },

    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),
}

impl From<ApiError> for SyncError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized => SyncError::Unauthorized,
            other => SyncError::Api(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
