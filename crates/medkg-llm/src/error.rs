use medkg_error::WarningError;
use thiserror::Error;

/// Represents errors that can occur while asking the model for text.
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    /// The model process could not be started at all.
    #[error("Failed to start `{command}`: {message}")]
    Spawn { command: String, message: String },

    /// The model process ran and exited unsuccessfully.
    #[error("Model invocation failed (exit status {}): {stderr}", display_status(.status))]
    Invocation { status: Option<i32>, stderr: String },

    /// Failed to exchange the prompt or output with the model process.
    #[error("Model process I/O failed: {0}")]
    Io(String),

    /// Error related to network connectivity or the HTTP request itself.
    #[error("Network request failed: {message}")]
    Request { message: String, url: Option<String> },

    /// The API provider returned a non-success status code.
    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    /// Failed to deserialize the API response.
    #[error("Failed to deserialize response data: {0}")]
    Deserialization(String),

    /// The model did not finish within the caller's limit.
    #[error("The request to the model timed out after {0}s")]
    Timeout(u64),

    /// The generation queue worker is gone.
    #[error("Generation queue is closed")]
    QueueClosed,
}

fn display_status(status: &Option<i32>) -> String {
    status.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        LlmError::Request {
            message: e.to_string(),
            url: e.url().map(|u| u.to_string()),
        }
    }
}

impl From<LlmError> for medkg_error::Error {
    fn from(e: LlmError) -> Self {
        WarningError::GenerationFailure {
            channel: "unknown".to_string(),
            message: e.to_string(),
        }
        .into()
    }
}
