//! The session manager: issues tokens and resolves them back to identities.
//!
//! This is the in-process stand-in for the web flow that precedes a socket:
//! a host creates a room (which makes the room record) or a player joins
//! one by code (which checks the room exists and the name is free). Either
//! way the caller gets an opaque token to present when opening the socket.
//!
//! # Concurrency note
//!
//! Clones share one token map behind a Tokio mutex, so the manager can be
//! handed to the server as its [`IdentityResolver`] while the embedding
//! application keeps issuing tokens through another clone.

use std::collections::HashMap;
use std::sync::Arc;

use bingo_protocol::RoomCode;
use bingo_store::{PlayerFilter, RoomStore};
use bingo_transport::UpgradeRequest;
use rand::Rng;
use tokio::sync::Mutex;

use crate::session::normalize_name;
use crate::{IdentityResolver, SessionConfig, SessionError, SessionIdentity};

/// Issues session tokens and resolves them for incoming sockets.
#[derive(Debug, Clone)]
pub struct SessionManager {
    /// Token → identity.
    tokens: Arc<Mutex<HashMap<String, SessionIdentity>>>,
    config: SessionConfig,
}

impl SessionManager {
    /// Creates a new, empty session manager with the given config.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            tokens: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }

    /// Creates a room hosted by `host_name` and returns its code and the
    /// host's session token.
    ///
    /// # Errors
    /// [`SessionError::InvalidName`] for a blank or overlong name, or
    /// [`SessionError::Store`] if the room record can't be written.
    pub async fn create_room<S: RoomStore>(
        &self,
        store: &S,
        host_name: &str,
    ) -> Result<(RoomCode, String), SessionError> {
        let host_name = normalize_name(host_name)?;
        let room = store.create_room(&host_name).await?;

        let token = self
            .issue(SessionIdentity {
                user_name: host_name.clone(),
                room_code: room.code.clone(),
                is_host: true,
            })
            .await;

        tracing::info!(room = %room.code, host = %host_name, "room created");
        Ok((room.code, token))
    }

    /// Joins an existing room by code and returns the player's session
    /// token. The code is trimmed and upper-cased.
    ///
    /// # Errors
    /// - [`SessionError::InvalidName`]: blank or overlong name
    /// - [`SessionError::RoomNotFound`]: no such room
    /// - [`SessionError::NameTaken`]: a player with this name exists
    pub async fn join_room<S: RoomStore>(
        &self,
        store: &S,
        room_code: &str,
        name: &str,
    ) -> Result<String, SessionError> {
        let name = normalize_name(name)?;
        let code = RoomCode::new(room_code);

        store.get_room(&code).await?;
        let players = store.list_players(&code, PlayerFilter::All).await?;
        if players.iter().any(|p| p.name == name) {
            return Err(SessionError::NameTaken { room: code, name });
        }

        let token = self
            .issue(SessionIdentity {
                user_name: name.clone(),
                room_code: code.clone(),
                is_host: false,
            })
            .await;

        tracing::info!(room = %code, player = %name, "join token issued");
        Ok(token)
    }

    /// Binds a fresh token to `identity`.
    pub async fn issue(&self, identity: SessionIdentity) -> String {
        let token = generate_token();
        self.tokens.lock().await.insert(token.clone(), identity);
        token
    }

    /// Looks up the identity bound to a token.
    pub async fn lookup(&self, token: &str) -> Option<SessionIdentity> {
        self.tokens.lock().await.get(token).cloned()
    }

    /// Returns the number of issued tokens.
    pub async fn len(&self) -> usize {
        self.tokens.lock().await.len()
    }

    /// Returns `true` if no tokens have been issued.
    pub async fn is_empty(&self) -> bool {
        self.tokens.lock().await.is_empty()
    }

    /// Finds the token on the request: query parameter first, then cookie.
    fn token_from<'a>(&self, request: &'a UpgradeRequest) -> Option<&'a str> {
        request
            .query_param(&self.config.query_param)
            .or_else(|| request.cookie(&self.config.cookie_name))
            .filter(|token| !token.is_empty())
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl IdentityResolver for SessionManager {
    async fn resolve(
        &self,
        request: &UpgradeRequest,
    ) -> Result<SessionIdentity, SessionError> {
        let token = self
            .token_from(request)
            .ok_or(SessionError::MissingIdentity)?;
        self.lookup(token).await.ok_or(SessionError::UnknownToken)
    }
}

/// Generates a random 32-character hex string (128 bits of entropy).
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
