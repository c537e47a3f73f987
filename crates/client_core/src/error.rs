use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComplaintServiceError {
    #[error("complaint service request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("complaint service rejected the request with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("malformed complaint service response: {0}")]
    MalformedResponse(String),
    #[error("invalid complaint service url: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("the assistant is still replying to the previous message")]
    Busy,
    #[error("chat input queue is full; please retry")]
    QueueFull,
    #[error("chat session is closed")]
    Closed,
}
