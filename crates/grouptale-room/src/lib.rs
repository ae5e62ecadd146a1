//! Voting rooms and story progression for Grouptale.
//!
//! A room is a shared session in which participants vote on story
//! choices in timed rounds. When a round has expired, the next vote
//! closes it: the majority choice becomes the room's story node and a
//! fresh round begins.
//!
//! # Key types
//!
//! - [`RoomCoordinator`] — create, join, read, and vote in rooms
//! - [`Room`] — a room's state and its round-closing rules
//! - [`RoomStore`] — where rooms live ([`MemoryRoomStore`] by default)
//! - [`Clock`] — wall-clock source ([`SystemClock`], [`ManualClock`])
//! - [`RoomConfig`] — round length, defaults, tie-break, eviction
//! - [`spawn_reaper`] — background eviction of abandoned rooms

mod clock;
mod config;
mod coordinator;
mod error;
mod reaper;
mod room;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{RoomConfig, TieBreak};
pub use coordinator::RoomCoordinator;
pub use error::RoomError;
pub use reaper::spawn_reaper;
pub use room::{Room, RoundOutcome, Vote};
pub use store::{MemoryRoomStore, RoomStore};
