//! Error types for the room layer.

use grouptale_protocol::RoomId;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist (never created, or already evicted).
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The room store backend failed.
    #[error("room store failed: {0}")]
    Store(String),

    /// Every generated id collided with a live room.
    #[error("no free room id after {0} attempts")]
    IdSpaceExhausted(usize),
}
