//! Room registry: creates, tracks, and destroys room sessions by code.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bingo_protocol::RoomCode;
use bingo_store::RoomStore;
use bingo_transport::ConnectionId;
use tokio::sync::Mutex;

use crate::room::{spawn_room, Sessions};
use crate::{EventSender, RoomConfig, RoomError, RoomHandle};

/// Process-wide map from room code to its running session.
///
/// Sessions are created lazily on the first connection to a stored room
/// and remove themselves when they stop. The map lock is only held for
/// map operations, never across a store call or an actor round-trip.
///
/// Cheap to clone; clones share the same sessions.
pub struct RoomRegistry<S: RoomStore> {
    store: Arc<S>,
    config: RoomConfig,
    sessions: Sessions,
    next_instance: Arc<AtomicU64>,
}

impl<S: RoomStore> Clone for RoomRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            sessions: Arc::clone(&self.sessions),
            next_instance: Arc::clone(&self.next_instance),
        }
    }
}

impl<S: RoomStore> RoomRegistry<S> {
    /// Creates an empty registry over `store`.
    pub fn new(store: S, config: RoomConfig) -> Self {
        Self {
            store: Arc::new(store),
            config,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            next_instance: Arc::new(AtomicU64::new(1)),
        }
    }

    /// The store every session in this registry writes to.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Returns the running session for `code`, starting one if the room
    /// exists in the store.
    ///
    /// # Errors
    /// [`RoomError::NotFound`] if the store has no such room, or
    /// [`RoomError::Store`] if the lookup failed.
    pub async fn get_or_create(
        &self,
        code: &RoomCode,
    ) -> Result<RoomHandle, RoomError> {
        if let Some(handle) = self.lookup(code).await {
            return Ok(handle);
        }

        let room = self.store.get_room(code).await?;

        let mut sessions = self.sessions.lock().await;
        if let Some(handle) = sessions.get(code).filter(|h| !h.is_closed()) {
            // Another connection started it while we were reading.
            return Ok(handle.clone());
        }

        let instance = self.next_instance.fetch_add(1, Ordering::Relaxed);
        let handle = spawn_room(
            room,
            self.config.clone(),
            Arc::clone(&self.store),
            Arc::clone(&self.sessions),
            instance,
        );
        sessions.insert(code.clone(), handle.clone());
        tracing::info!(room = %code, instance, "room session created");
        Ok(handle)
    }

    /// Returns the running session for `code`, if any.
    pub async fn lookup(&self, code: &RoomCode) -> Option<RoomHandle> {
        self.sessions
            .lock()
            .await
            .get(code)
            .filter(|h| !h.is_closed())
            .cloned()
    }

    /// Resolves the session for `code` and admits a connection to it.
    ///
    /// A session can stop between lookup and join (its last player just
    /// left). That attempt is retried once through the registry, which
    /// reloads the room from the store and so reports
    /// [`RoomError::NotFound`] if the room was destroyed.
    pub async fn join(
        &self,
        code: &RoomCode,
        conn_id: ConnectionId,
        name: &str,
        is_host: bool,
        sender: EventSender,
    ) -> Result<RoomHandle, RoomError> {
        let handle = self.get_or_create(code).await?;
        match handle.join(conn_id, name, is_host, sender.clone()).await {
            Ok(()) => Ok(handle),
            Err(RoomError::Unavailable(_)) => {
                tracing::debug!(room = %code, %conn_id, "session stopped during join, retrying");
                let handle = self.get_or_create(code).await?;
                handle.join(conn_id, name, is_host, sender).await?;
                Ok(handle)
            }
            Err(err) => Err(err),
        }
    }

    /// Destroys a room: deletes its players and record and stops its
    /// session. Idempotent: returns `true` if this call deleted the room,
    /// `false` if it was already gone.
    ///
    /// # Errors
    /// [`RoomError::Store`] if the store failed while deleting a room that
    /// has no running session.
    pub async fn destroy(&self, code: &RoomCode) -> Result<bool, RoomError> {
        if let Some(handle) = self.lookup(code).await {
            match handle.destroy().await {
                Ok(deleted) => return Ok(deleted),
                // Stopped on its own in the meantime.
                Err(RoomError::Unavailable(_)) => {}
                Err(err) => return Err(err),
            }
        }

        self.store.delete_all_players(code).await?;
        match self.store.delete_room(code).await {
            Ok(()) => {
                tracing::info!(room = %code, "room destroyed");
                Ok(true)
            }
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(RoomError::Store(err)),
        }
    }

    /// Number of running sessions.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Returns `true` if no sessions are running.
    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    /// Codes of all running sessions.
    pub async fn room_codes(&self) -> Vec<RoomCode> {
        self.sessions.lock().await.keys().cloned().collect()
    }
}
