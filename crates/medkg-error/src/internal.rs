#[derive(Debug, Clone, thiserror::Error)]
pub enum InternalError {
    #[error("Unexpected state: {0}")]
    InvalidState(String),

    #[error("Failed to decode store value: {0}")]
    Decode(String),
}
