/// Result alias that carries the custom [`MashupError`] type.
pub type Result<T> = std::result::Result<T, MashupError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum MashupError {
    /// A caller passed a value outside the accepted domain, such as a
    /// non-positive BPM or song length.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// An asset could not be decoded or is missing a required member. The
    /// owning block is expected to be skipped as a whole.
    #[error("malformed {kind}: {reason}")]
    MalformedAsset { kind: &'static str, reason: String },
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl MashupError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub fn invalid<T: Into<String>>(reason: T) -> Self {
        Self::InvalidArgument(reason.into())
    }

    pub fn malformed<T: Into<String>>(kind: &'static str, reason: T) -> Self {
        Self::MalformedAsset {
            kind,
            reason: reason.into(),
        }
    }
}

impl From<&str> for MashupError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for MashupError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
