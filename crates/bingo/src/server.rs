//! `BingoServer` builder and server loop.
//!
//! This is the entry point for running a bingo server. It ties together
//! all the layers: transport → session → room registry → store.

use std::sync::Arc;

use bingo_protocol::{Codec, JsonCodec};
use bingo_room::{RoomConfig, RoomRegistry};
use bingo_session::IdentityResolver;
use bingo_store::RoomStore;
use bingo_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::BingoError;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<S: RoomStore, R: IdentityResolver, C: Codec> {
    pub(crate) rooms: RoomRegistry<S>,
    pub(crate) resolver: R,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a bingo server.
///
/// # Example
///
/// ```rust,ignore
/// let server = BingoServer::builder()
///     .bind("0.0.0.0:8080")
///     .room_config(RoomConfig::default())
///     .build(store, sessions)
///     .await?;
/// server.run().await
/// ```
pub struct BingoServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
}

impl BingoServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            room_config: RoomConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the rules and timings used by every room.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Binds the listener and builds the server over `store`, admitting
    /// sockets whose identity `resolver` can establish.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build<S: RoomStore, R: IdentityResolver>(
        self,
        store: S,
        resolver: R,
    ) -> Result<BingoServer<S, R, JsonCodec>, BingoError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            rooms: RoomRegistry::new(store, self.room_config),
            resolver,
            codec: JsonCodec,
        });

        Ok(BingoServer { transport, state })
    }
}

impl Default for BingoServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound bingo server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct BingoServer<S: RoomStore, R: IdentityResolver, C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<S, R, C>>,
}

// The builder is independent of the server's type parameters; they are
// pinned here only so `BingoServer::builder()` needs no annotations.
impl BingoServer<bingo_store::MemoryStore, bingo_session::SessionManager, JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> BingoServerBuilder {
        BingoServerBuilder::new()
    }
}

impl<S, R, C> BingoServer<S, R, C>
where
    S: RoomStore,
    R: IdentityResolver,
    C: Codec,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// The registry of running room sessions.
    pub fn rooms(&self) -> &RoomRegistry<S> {
        &self.state.rooms
    }

    /// Runs the server accept loop.
    ///
    /// Spawns a handler task for each accepted socket. Runs until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), BingoError> {
        tracing::info!(addr = ?self.local_addr().ok(), "bingo server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
