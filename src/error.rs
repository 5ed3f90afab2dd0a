use thiserror::Error;

/// Failure talking to the node. Every variant is transient: the controller
/// keeps its last good view and tries again on the next cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("remote unavailable: {0}")]
    Unavailable(String),

    /// The node answered but the payload did not decode. Handled exactly like
    /// `Unavailable`.
    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("{what} timed out after {after_ms}ms")]
    Timeout { what: String, after_ms: u64 },
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RemoteError::Malformed(e.to_string())
        } else {
            RemoteError::Unavailable(e.to_string())
        }
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(e: serde_json::Error) -> Self {
        RemoteError::Malformed(e.to_string())
    }
}
