//! Wire protocol for Grouptale.
//!
//! This crate defines what travels between the browser and the backend:
//!
//! - **Types** ([`RoomRequest`], [`RoomSnapshot`], [`ErrorBody`], the
//!   identifier newtypes) — the JSON bodies of the HTTP surface.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how request bodies are
//!   turned into those types and responses back into bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while decoding or
//!   validating a request.
//!
//! # Architecture
//!
//! The protocol layer sits between HTTP (raw bodies) and the room layer
//! (the coordinator). It knows nothing about rooms being stored or locked;
//! it only knows the shapes that cross the wire.
//!
//! ```text
//! HTTP (bytes) → Protocol (RoomRequest) → Room (RoomCoordinator)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ChoiceId, ErrorBody, ErrorCode, NodeId, PackId, ParticipantId,
    RoomId, RoomQuery, RoomRequest, RoomSnapshot,
};
