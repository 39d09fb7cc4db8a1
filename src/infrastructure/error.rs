use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("network error: {0}")]
    Network(String),
    #[error("remote call failed: http {status}; body={body}")]
    Remote { status: u16, body: String },
    #[error("invalid response payload: {0}")]
    InvalidPayload(String),
    #[error("credential store error: {0}")]
    Credential(String),
    #[error("session ended: authorization expired and could not be refreshed")]
    SessionEnded,
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl CoreError {
    /// True when the caller should treat the user as signed out.
    pub fn is_session_ended(&self) -> bool {
        matches!(self, CoreError::SessionEnded)
    }
}
