//! Room coordinator: creates rooms, tracks membership, and runs votes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use grouptale_protocol::{ChoiceId, PackId, ParticipantId, RoomId};
use rand::Rng;

use crate::{Clock, Room, RoomConfig, RoomError, RoomStore, SystemClock};

/// Characters a generated room id is drawn from.
const ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// How many fresh ids `create_room` tries before giving up.
const MAX_ID_ATTEMPTS: usize = 16;

/// Owns the lifecycle of voting rooms.
///
/// This is the entry point for room operations from the HTTP layer.
/// Every read-modify-write on a room runs under that room's lock, so two
/// votes racing across a round deadline close the round exactly once.
/// Requests for different rooms never wait on each other.
pub struct RoomCoordinator<S: RoomStore> {
    store: S,
    locks: RoomLocks,
    clock: Arc<dyn Clock>,
    config: RoomConfig,
}

impl<S: RoomStore> RoomCoordinator<S> {
    /// Creates a coordinator over `store` using the system clock.
    pub fn new(store: S, config: RoomConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Creates a coordinator with an explicit clock.
    pub fn with_clock(
        store: S,
        config: RoomConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            locks: RoomLocks::default(),
            clock,
            config,
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Creates a room and returns it.
    ///
    /// A missing or empty `pack_id` falls back to the configured default.
    pub async fn create_room(
        &self,
        pack_id: Option<PackId>,
    ) -> Result<Room, RoomError> {
        let pack_id = pack_id
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| self.config.default_pack_id.clone());

        for _ in 0..MAX_ID_ATTEMPTS {
            let room = Room::new(
                generate_room_id(self.config.id_length),
                pack_id.clone(),
                self.config.root_node.clone(),
                self.clock.now_ms(),
                self.config.round_duration,
            );
            if self.store.create(room.clone()).await? {
                tracing::info!(room_id = %room.id(), %pack_id, "room created");
                return Ok(room);
            }
            tracing::debug!(room_id = %room.id(), "room id collision, retrying");
        }
        Err(RoomError::IdSpaceExhausted(MAX_ID_ATTEMPTS))
    }

    /// Adds a participant to a room. Joining twice is a no-op.
    pub async fn join_room(
        &self,
        room_id: &RoomId,
        participant: ParticipantId,
    ) -> Result<Room, RoomError> {
        let lock = self.locks.handle(room_id);
        let guard = lock.lock().await;

        let mut room = match self.load(room_id).await {
            Ok(room) => room,
            Err(e) => {
                drop(guard);
                drop(lock);
                self.locks.release(room_id);
                return Err(e);
            }
        };
        if room.add_member(participant.clone()) {
            self.store.put(room.clone()).await?;
            tracing::info!(
                %room_id,
                %participant,
                members = room.members().len(),
                "participant joined"
            );
        }
        Ok(room)
    }

    /// Returns a room without changing it.
    pub async fn get_room(&self, room_id: &RoomId) -> Result<Room, RoomError> {
        self.load(room_id).await
    }

    /// Records a vote, closing the current round first if it has expired.
    ///
    /// The vote that closes a round is not tallied into it: it becomes
    /// the first vote of the round that opens.
    pub async fn cast_vote(
        &self,
        room_id: &RoomId,
        participant: ParticipantId,
        choice: ChoiceId,
    ) -> Result<Room, RoomError> {
        let lock = self.locks.handle(room_id);
        let guard = lock.lock().await;

        let mut room = match self.load(room_id).await {
            Ok(room) => room,
            Err(e) => {
                drop(guard);
                drop(lock);
                self.locks.release(room_id);
                return Err(e);
            }
        };
        let now = self.clock.now_ms();

        if room.is_expired(now) {
            let outcome = room.close_round(
                now,
                self.config.round_duration,
                self.config.tie_break,
            );
            match &outcome.winner {
                Some(winner) => tracing::info!(
                    %room_id,
                    %winner,
                    votes = outcome.votes_counted,
                    "round closed, story advanced"
                ),
                None => tracing::info!(
                    %room_id,
                    node = %room.node_id(),
                    "round closed without votes"
                ),
            }
        }

        tracing::debug!(%room_id, %participant, %choice, "vote recorded");
        room.record_vote(participant, choice);
        self.store.put(room.clone()).await?;
        Ok(room)
    }

    /// Deletes every room whose round ended more than `grace` ago.
    ///
    /// Returns the ids that were evicted. Each room is re-checked under
    /// its lock, so a vote that lands first keeps the room alive.
    pub async fn evict_expired(
        &self,
        grace: Duration,
    ) -> Result<Vec<RoomId>, RoomError> {
        let grace_ms = grace.as_millis() as u64;
        let mut evicted = Vec::new();

        for room_id in self.store.ids().await? {
            let lock = self.locks.handle(&room_id);
            let guard = lock.lock().await;

            let stale = match self.store.get(&room_id).await? {
                Some(room) => {
                    self.clock.now_ms()
                        > room.expires_at().saturating_add(grace_ms)
                }
                None => false,
            };
            if stale && self.store.delete(&room_id).await? {
                tracing::info!(%room_id, "idle room evicted");
                evicted.push(room_id.clone());
            }

            drop(guard);
        }

        self.locks.prune();
        Ok(evicted)
    }

    /// Returns the number of live rooms.
    pub async fn room_count(&self) -> Result<usize, RoomError> {
        Ok(self.store.ids().await?.len())
    }

    async fn load(&self, room_id: &RoomId) -> Result<Room, RoomError> {
        self.store
            .get(room_id)
            .await?
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))
    }
}

/// Per-room mutexes, created on first use.
#[derive(Default)]
struct RoomLocks {
    locks: Mutex<HashMap<RoomId, Arc<tokio::sync::Mutex<()>>>>,
}

impl RoomLocks {
    fn handle(&self, room_id: &RoomId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks =
            self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(room_id.clone()).or_default())
    }

    /// Drops the entry for `room_id` if nobody else holds its handle.
    ///
    /// Called after a failed lookup so requests naming unknown rooms
    /// leave the table as they found it.
    fn release(&self, room_id: &RoomId) {
        let mut locks =
            self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(room_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(room_id);
        }
    }

    /// Drops every lock nobody is holding a handle to.
    ///
    /// Handles are only handed out under the table mutex, so an entry
    /// whose only reference is the table cannot be in use.
    fn prune(&self) {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Generates a random room id of `len` lowercase base-36 characters.
///
/// Ids are short for sharing, not secret. Collisions are caught by
/// [`RoomStore::create`].
fn generate_room_id(len: usize) -> RoomId {
    let mut rng = rand::rng();
    let id: String = (0..len.max(1))
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect();
    RoomId(id)
}

#[cfg(test)]
mod tests {
    use crate::MemoryRoomStore;

    use super::*;

    #[test]
    fn test_generate_room_id_uses_alphabet_and_length() {
        let id = generate_room_id(6);
        assert_eq!(id.as_str().len(), 6);
        assert!(id.as_str().bytes().all(|b| ID_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_generate_room_id_zero_length_still_nonempty() {
        assert_eq!(generate_room_id(0).as_str().len(), 1);
    }

    #[test]
    fn test_room_locks_share_handle_per_room() {
        let locks = RoomLocks::default();
        let a = locks.handle(&RoomId::from("a"));
        let a2 = locks.handle(&RoomId::from("a"));
        let b = locks.handle(&RoomId::from("b"));
        assert!(Arc::ptr_eq(&a, &a2));
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_room_locks_prune_keeps_held_handles() {
        let locks = RoomLocks::default();
        let held = locks.handle(&RoomId::from("held"));
        drop(locks.handle(&RoomId::from("idle")));
        assert_eq!(locks.len(), 2);

        locks.prune();
        assert_eq!(locks.len(), 1);
        assert!(Arc::ptr_eq(&held, &locks.handle(&RoomId::from("held"))));
    }

    #[tokio::test]
    async fn test_unknown_room_requests_leave_no_lock_entries() {
        let coordinator = RoomCoordinator::new(
            MemoryRoomStore::new(),
            RoomConfig {
                reap_grace: None,
                ..RoomConfig::default()
            },
        );

        for i in 0..100 {
            let ghost = RoomId(format!("ghost{i}"));
            let joined = coordinator
                .join_room(&ghost, ParticipantId::from("alice"))
                .await;
            assert!(matches!(joined, Err(RoomError::NotFound(_))));

            let voted = coordinator
                .cast_vote(&ghost, ParticipantId::from("alice"), ChoiceId::from("left"))
                .await;
            assert!(matches!(voted, Err(RoomError::NotFound(_))));
        }
        assert_eq!(coordinator.locks.len(), 0);

        let room = coordinator.create_room(None).await.unwrap();
        coordinator
            .join_room(room.id(), ParticipantId::from("alice"))
            .await
            .unwrap();
        assert_eq!(coordinator.locks.len(), 1);
    }

    #[test]
    fn test_room_locks_release_spares_held_handle() {
        let locks = RoomLocks::default();
        let held = locks.handle(&RoomId::from("held"));
        drop(locks.handle(&RoomId::from("idle")));

        locks.release(&RoomId::from("held"));
        locks.release(&RoomId::from("idle"));
        assert_eq!(locks.len(), 1);
        drop(held);
    }
}
