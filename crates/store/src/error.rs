use thiserror::Error;

/// Failure talking to (or preparing a call to) the remote store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// An endpoint or access signature is missing. Raised before any I/O.
    #[error("store is not configured: {0}")]
    Configuration(String),

    /// The upstream answered with a non-success status.
    #[error("upstream returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("could not decode upstream response: {0}")]
    Decode(String),

    /// The request itself cannot be expressed against the store (e.g. an
    /// unaddressable key). Raised before any I/O.
    #[error("invalid request: {0}")]
    InvalidInput(String),
}

impl StoreError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// The human-readable part, without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            StoreError::Configuration(m)
            | StoreError::Transport(m)
            | StoreError::Decode(m)
            | StoreError::InvalidInput(m) => m,
            StoreError::Remote { message, .. } => message,
        }
    }

    /// Upstream status, if the upstream answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Transport(err.to_string())
        }
    }
}
