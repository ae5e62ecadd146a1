//! Room storage.
//!
//! The coordinator never touches a map directly. It goes through
//! [`RoomStore`], so the in-process [`MemoryRoomStore`] can later be
//! swapped for a durable or shared backend without changing any voting
//! logic.
//!
//! A store only has to be a faithful key-value map. Per-room mutual
//! exclusion is the coordinator's job, so implementations need not make
//! read-modify-write sequences atomic.

use std::collections::HashMap;
use std::future::Future;

use grouptale_protocol::RoomId;
use tokio::sync::RwLock;

use crate::{Room, RoomError};

/// Keyed storage for rooms.
///
/// Methods return `Send` futures so the coordinator can be driven from
/// any Tokio worker thread.
pub trait RoomStore: Send + Sync + 'static {
    /// Inserts `room` if its id is free.
    ///
    /// Returns `Ok(false)` without touching the store if a room with the
    /// same id already exists.
    fn create(
        &self,
        room: Room,
    ) -> impl Future<Output = Result<bool, RoomError>> + Send;

    /// Looks up a room by id.
    fn get(
        &self,
        id: &RoomId,
    ) -> impl Future<Output = Result<Option<Room>, RoomError>> + Send;

    /// Writes back a room, replacing the stored copy.
    fn put(
        &self,
        room: Room,
    ) -> impl Future<Output = Result<(), RoomError>> + Send;

    /// Deletes a room. Returns `false` if it did not exist.
    fn delete(
        &self,
        id: &RoomId,
    ) -> impl Future<Output = Result<bool, RoomError>> + Send;

    /// Lists the ids of all stored rooms.
    fn ids(&self) -> impl Future<Output = Result<Vec<RoomId>, RoomError>> + Send;
}

/// A [`RoomStore`] backed by a `HashMap` in process memory.
///
/// Rooms vanish when the process exits.
#[derive(Debug, Default)]
pub struct MemoryRoomStore {
    rooms: RwLock<HashMap<RoomId, Room>>,
}

impl MemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoomStore for MemoryRoomStore {
    async fn create(&self, room: Room) -> Result<bool, RoomError> {
        let mut rooms = self.rooms.write().await;
        if rooms.contains_key(room.id()) {
            return Ok(false);
        }
        rooms.insert(room.id().clone(), room);
        Ok(true)
    }

    async fn get(&self, id: &RoomId) -> Result<Option<Room>, RoomError> {
        Ok(self.rooms.read().await.get(id).cloned())
    }

    async fn put(&self, room: Room) -> Result<(), RoomError> {
        self.rooms.write().await.insert(room.id().clone(), room);
        Ok(())
    }

    async fn delete(&self, id: &RoomId) -> Result<bool, RoomError> {
        Ok(self.rooms.write().await.remove(id).is_some())
    }

    async fn ids(&self) -> Result<Vec<RoomId>, RoomError> {
        Ok(self.rooms.read().await.keys().cloned().collect())
    }
}
