//! `GrouptaleServer` builder and server loop.
//!
//! This is the entry point for running a Grouptale backend. It ties
//! together all the layers: HTTP → protocol → rooms / pet state.

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use grouptale_pets::{FileBlobStore, PetStore};
use grouptale_protocol::JsonCodec;
use grouptale_room::{
    Clock, MemoryRoomStore, RoomConfig, RoomCoordinator, RoomStore,
    SystemClock, spawn_reaper,
};
use tokio::net::TcpListener;

use crate::GrouptaleError;
use crate::handler::router;

/// Shared state handed to every request handler.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The room
/// coordinator and pet store synchronize internally, so no outer lock is
/// needed.
pub struct AppState<S: RoomStore> {
    pub(crate) coordinator: Arc<RoomCoordinator<S>>,
    pub(crate) pets: PetStore<FileBlobStore>,
    pub(crate) codec: JsonCodec,
}

impl<S: RoomStore> AppState<S> {
    pub fn new(
        coordinator: Arc<RoomCoordinator<S>>,
        pets: PetStore<FileBlobStore>,
    ) -> Self {
        Self {
            coordinator,
            pets,
            codec: JsonCodec,
        }
    }

    pub fn coordinator(&self) -> &Arc<RoomCoordinator<S>> {
        &self.coordinator
    }
}

/// Builder for configuring and starting a Grouptale server.
///
/// # Example
///
/// ```rust,ignore
/// use grouptale::prelude::*;
///
/// let server = GrouptaleServer::builder()
///     .bind("0.0.0.0:8080")
///     .room_config(RoomConfig::default())
///     .pet_state_dir("/var/lib/grouptale/pets")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct GrouptaleServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    clock: Arc<dyn Clock>,
    pet_state_dir: Option<PathBuf>,
}

impl GrouptaleServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            room_config: RoomConfig::default(),
            clock: Arc::new(SystemClock),
            pet_state_dir: None,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the room configuration.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Replaces the wall clock (tests and simulations).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Persists pet state under `dir`. Without this, pet state is kept
    /// in memory only.
    pub fn pet_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.pet_state_dir = Some(dir.into());
        self
    }

    /// Binds the listener with an in-memory room store.
    pub async fn build(
        self,
    ) -> Result<GrouptaleServer<MemoryRoomStore>, GrouptaleError> {
        self.build_with_store(MemoryRoomStore::new()).await
    }

    /// Binds the listener with the given room store.
    pub async fn build_with_store<S: RoomStore>(
        self,
        store: S,
    ) -> Result<GrouptaleServer<S>, GrouptaleError> {
        let listener = TcpListener::bind(&self.bind_addr).await?;

        let coordinator = Arc::new(RoomCoordinator::with_clock(
            store,
            self.room_config,
            self.clock,
        ));
        let pets = match self.pet_state_dir {
            Some(dir) => {
                tracing::info!(dir = %dir.display(), "pet state persisted to disk");
                PetStore::with_primary(FileBlobStore::new(dir))
            }
            None => {
                tracing::info!("pet state kept in memory only");
                PetStore::memory_only()
            }
        };

        let state = Arc::new(AppState::new(coordinator, pets));
        Ok(GrouptaleServer { listener, state })
    }
}

impl Default for GrouptaleServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Grouptale server.
///
/// Call [`run()`](Self::run) to start serving requests.
pub struct GrouptaleServer<S: RoomStore = MemoryRoomStore> {
    listener: TcpListener,
    state: Arc<AppState<S>>,
}

impl GrouptaleServer {
    /// Creates a new builder.
    pub fn builder() -> GrouptaleServerBuilder {
        GrouptaleServerBuilder::new()
    }
}

impl<S: RoomStore> GrouptaleServer<S> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Returns the room coordinator, for embedding or inspection.
    pub fn coordinator(&self) -> Arc<RoomCoordinator<S>> {
        Arc::clone(&self.state.coordinator)
    }

    /// Serves requests until the process is terminated.
    pub async fn run(self) -> Result<(), GrouptaleError> {
        self.run_until(std::future::pending()).await
    }

    /// Serves requests until `shutdown` completes, then drains in-flight
    /// requests and stops the reaper.
    pub async fn run_until(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), GrouptaleError> {
        let reaper = spawn_reaper(Arc::clone(&self.state.coordinator));
        let addr = self.listener.local_addr()?;
        tracing::info!(%addr, "Grouptale server running");

        let app = router(Arc::clone(&self.state));
        let result = axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        if let Some(reaper) = reaper {
            reaper.abort();
        }
        tracing::info!("Grouptale server stopped");
        result.map_err(GrouptaleError::Io)
    }
}

/// Installs a `tracing` subscriber that honours `RUST_LOG`.
///
/// Defaults to `info` for this workspace and for request traces.
/// Calling it twice is harmless; the second call is ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with_target(false)
        .try_init();
}
