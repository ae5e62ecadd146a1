//! Error types for pet state storage.

/// Errors that can occur while reading or writing pet state.
#[derive(Debug, thiserror::Error)]
pub enum PetError {
    /// The key is empty, too long, or contains characters outside
    /// `[A-Za-z0-9_-]`. Keys become file names, so this is enforced
    /// before any backend sees them.
    #[error("invalid pet state key: {0:?}")]
    InvalidKey(String),

    /// The backend could not read or write its storage.
    #[error("pet state i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// A stored blob could not be parsed or serialized.
    #[error("pet state is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
}

impl PetError {
    /// Returns `true` if the caller sent bad input, as opposed to a
    /// backend failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidKey(_))
    }
}
