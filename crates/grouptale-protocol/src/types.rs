//! Core protocol types for Grouptale's wire format.
//!
//! These are the structures that get serialized into HTTP bodies and
//! deserialized on the other side. Field names follow the browser
//! client's camelCase convention (`roomId`, `packId`, `expiresAt`).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Declares a string newtype used as an identifier on the wire.
///
/// The newtype pattern keeps a `RoomId` from being passed where a
/// `ParticipantId` is expected, even though both are strings underneath.
/// `#[serde(transparent)]` serializes the wrapper as the bare string.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash,
            Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns `true` if the identifier is the empty string.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id! {
    /// A short opaque identifier for a room, generated at creation.
    RoomId
}

string_id! {
    /// A participant's identity. In practice a wallet address string; it
    /// is not authenticated by the backend.
    ParticipantId
}

string_id! {
    /// The story content pack a room was created with.
    PackId
}

string_id! {
    /// The room's current position in the story graph.
    NodeId
}

string_id! {
    /// A story choice a participant votes for.
    ChoiceId
}

/// A winning choice becomes the room's next story node verbatim.
impl From<ChoiceId> for NodeId {
    fn from(choice: ChoiceId) -> Self {
        Self(choice.0)
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// A POST body sent to `/api/group-adventure`.
///
/// `#[serde(tag = "action")]` makes this an "internally tagged" enum: the
/// variant is chosen by the `action` field inside the JSON object, so
/// `{"action":"vote","roomId":"x",...}` decodes to [`RoomRequest::Vote`].
/// An unknown `action` fails to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "action",
    rename_all = "lowercase",
    rename_all_fields = "camelCase"
)]
pub enum RoomRequest {
    /// Create a room, optionally for a specific content pack.
    Create {
        #[serde(default)]
        pack_id: Option<PackId>,
    },

    /// Join an existing room.
    Join {
        room_id: RoomId,
        wallet: ParticipantId,
    },

    /// Vote for a story choice in the current round.
    Vote {
        room_id: RoomId,
        wallet: ParticipantId,
        choice_id: ChoiceId,
    },
}

impl RoomRequest {
    /// Checks rules that decoding alone can't express.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidMessage`] if a required identifier
    /// is the empty string.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            Self::Create { .. } => Ok(()),
            Self::Join { room_id, wallet } => {
                require("roomId", room_id.is_empty())?;
                require("wallet", wallet.is_empty())
            }
            Self::Vote {
                room_id,
                wallet,
                choice_id,
            } => {
                require("roomId", room_id.is_empty())?;
                require("wallet", wallet.is_empty())?;
                require("choiceId", choice_id.is_empty())
            }
        }
    }
}

fn require(field: &str, empty: bool) -> Result<(), ProtocolError> {
    if empty {
        Err(ProtocolError::InvalidMessage(format!("{field} is required")))
    } else {
        Ok(())
    }
}

/// Query string of `GET /api/group-adventure`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomQuery {
    #[serde(default)]
    pub room_id: Option<RoomId>,
}

impl RoomQuery {
    /// Returns the requested room id.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidMessage`] if `roomId` is missing or
    /// empty.
    pub fn require_room_id(self) -> Result<RoomId, ProtocolError> {
        match self.room_id {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(ProtocolError::InvalidMessage(
                "roomId is required".into(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// The JSON shape of a room, returned by every successful room operation.
///
/// `votes` is a `BTreeMap` so the serialized object has a stable key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub id: RoomId,
    pub pack_id: PackId,
    pub node_id: NodeId,
    pub votes: BTreeMap<ParticipantId, ChoiceId>,
    pub members: Vec<ParticipantId>,
    /// End of the current voting round, in epoch milliseconds.
    pub expires_at: u64,
}

/// Machine-readable error codes carried in [`ErrorBody::error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    BadRequest,
    MethodNotAllowed,
    ServerError,
}

impl ErrorCode {
    /// The HTTP status code this error is reported with.
    pub fn status(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::BadRequest => 400,
            Self::MethodNotAllowed => 405,
            Self::ServerError => 500,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotFound => "not_found",
            Self::BadRequest => "bad_request",
            Self::MethodNotAllowed => "method_not_allowed",
            Self::ServerError => "server_error",
        };
        f.write_str(s)
    }
}

/// The body of every error response.
///
/// Only server errors carry a human-readable `message`; client errors are
/// just the code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    /// An error body with no message.
    pub fn new(error: ErrorCode) -> Self {
        Self {
            error,
            message: None,
        }
    }

    /// A `server_error` body with the given message.
    pub fn server_error(message: impl Into<String>) -> Self {
        Self {
            error: ErrorCode::ServerError,
            message: Some(message.into()),
        }
    }
}
