//! # Grouptale
//!
//! HTTP backend for the group-adventure mode of a browser pet game.
//!
//! Participants share a room, vote on story choices in timed rounds,
//! and the majority choice moves the story forward. This crate puts an
//! HTTP surface in front of the [`RoomCoordinator`] and the pet state
//! store and wires up CORS, error mapping, and tracing.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use grouptale::prelude::*;
//!
//! # async fn run() -> Result<(), GrouptaleError> {
//! let server = GrouptaleServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::{ApiError, GrouptaleError};
pub use handler::router;
pub use server::{AppState, GrouptaleServer, GrouptaleServerBuilder, init_tracing};

pub mod prelude {
    //! Everything needed to run or embed a Grouptale server.

    pub use crate::{
        ApiError, AppState, GrouptaleError, GrouptaleServer,
        GrouptaleServerBuilder, init_tracing, router,
    };
    pub use grouptale_pets::{FileBlobStore, PetStore};
    pub use grouptale_protocol::{
        ChoiceId, ErrorBody, ErrorCode, NodeId, PackId, ParticipantId,
        RoomId, RoomSnapshot,
    };
    pub use grouptale_room::{
        Clock, ManualClock, MemoryRoomStore, RoomConfig, RoomCoordinator,
        RoomError, RoomStore, SystemClock, TieBreak,
    };
}
