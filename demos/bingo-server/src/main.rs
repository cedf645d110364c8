//! Standalone bingo server with an in-memory store.
//!
//! Creates one demo room on startup and logs its code and the host's
//! session token. Connect with:
//!
//! ```text
//! ws://127.0.0.1:8080/ws/room/<CODE>/?session=<TOKEN>
//! ```
//!
//! Set `BINGO_ADDR` to change the listen address and `RUST_LOG` to change
//! verbosity.

use bingo::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Creates the demo room and returns `(code, host token)`.
async fn seed(
    store: &MemoryStore,
    sessions: &SessionManager,
    host: &str,
) -> Result<(RoomCode, String), SessionError> {
    sessions.create_room(store, host).await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::var("BINGO_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());

    let store = MemoryStore::new();
    let sessions = SessionManager::default();
    let (code, token) = seed(&store, &sessions, "host").await?;

    let server = BingoServer::builder()
        .bind(&addr)
        .build(store, sessions)
        .await?;

    tracing::info!(
        addr = %server.local_addr()?,
        room = %code,
        url = %format!("ws://{addr}/ws/room/{code}/?session={token}"),
        "bingo server listening"
    );

    server.run().await?;
    Ok(())
}
