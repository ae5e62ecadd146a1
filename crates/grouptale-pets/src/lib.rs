//! Per-participant pet state storage for Grouptale.
//!
//! The browser keeps each participant's pet (stats, inventory, cosmetics)
//! as an opaque JSON blob and syncs it to the backend by key. This crate
//! stores those blobs:
//!
//! 1. **Backends** — the [`BlobStore`] trait, with [`MemoryBlobStore`]
//!    and the directory-backed [`FileBlobStore`]
//! 2. **Fallback** — [`PetStore`] puts an in-memory fallback behind an
//!    optional primary, so a failing disk never loses a save
//! 3. **Wire types** — the `/api/pet-state` request and response bodies
//!
//! ```text
//! HTTP handler ──→ PetStore ──→ primary (FileBlobStore)
//!                      │            ✗ error
//!                      └──────→ fallback (MemoryBlobStore)
//! ```

mod blob;
mod error;
mod file;
mod key;
mod store;
mod types;

pub use blob::{BlobStore, MemoryBlobStore};
pub use error::PetError;
pub use file::FileBlobStore;
pub use key::PetKey;
pub use store::PetStore;
pub use types::{PetStateQuery, PetStateRequest, PetStateResponse, PetStateSaved};
