//! Error types for the protocol layer.
//!
//! Each crate in Grouptale defines its own error enum. Decoding and
//! validation failures mean the client sent something we could not
//! understand and become `bad_request`. An encode failure is ours.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, an unknown `action` tag, missing
    /// required fields, or wrong data types.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded fine but violates a protocol rule, e.g. an
    /// empty `roomId` or `wallet`.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

impl ProtocolError {
    /// Returns `true` if the error was caused by the request rather than
    /// by encoding a response.
    pub fn is_client_error(&self) -> bool {
        match self {
            #[cfg(feature = "json")]
            Self::Encode(_) => false,
            _ => true,
        }
    }
}
