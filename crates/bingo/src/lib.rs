//! # Bingo
//!
//! Real-time multiplayer bingo rooms over WebSockets.
//!
//! A host creates a room, players join it by code, every player fills a
//! 5×5 board, and players take turns calling numbers until someone claims
//! five complete lines. Each room runs as its own actor, so turn checks,
//! draws and win validation never interleave within a room while rooms
//! progress independently.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bingo::prelude::*;
//!
//! # async fn run() -> Result<(), BingoError> {
//! let store = MemoryStore::new();
//! let sessions = SessionManager::default();
//! let (_code, _token) = sessions.create_room(&store, "alice").await?;
//! // The host connects to ws://127.0.0.1:8080/ws/room/<code>/?session=<token>
//!
//! let server = BingoServer::builder()
//!     .bind("127.0.0.1:8080")
//!     .build(store, sessions)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::BingoError;
pub use server::{BingoServer, BingoServerBuilder};

/// Everything needed to embed a bingo server, in one import.
pub mod prelude {
    pub use crate::{BingoError, BingoServer, BingoServerBuilder};
    pub use bingo_protocol::{
        Board, ClientAction, CloseReason, Codec, JsonCodec, MarkedCell,
        RoomCode, ServerEvent, GENERIC_ERROR,
    };
    pub use bingo_room::{RoomConfig, RoomError, RoomPhase, RoomRegistry};
    pub use bingo_session::{
        IdentityResolver, SessionConfig, SessionError, SessionIdentity,
        SessionManager,
    };
    pub use bingo_store::{
        MemoryStore, PlayerFilter, RoomStore, StoreError,
    };
    pub use bingo_transport::UpgradeRequest;
}
