//! A store wrapper that refuses writes (and optionally reads) while
//! switched into failure mode.
//!
//! The room engine promises that a mutation either commits to both its
//! in-memory state and the store, or to neither. `FaultyStore` lets tests
//! pull the store out from under a running room and check that promise.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bingo_protocol::RoomCode;

use crate::{
    Player, PlayerFilter, PlayerUpdate, Room, RoomStore, RoomUpdate,
    StoreError,
};

/// Wraps a [`RoomStore`]; while failing, every write returns
/// [`StoreError::Unavailable`] and leaves the inner store untouched.
/// Reads pass through unless read failures are switched on separately.
#[derive(Debug, Clone)]
pub struct FaultyStore<S> {
    inner: S,
    failing: Arc<AtomicBool>,
    failing_reads: Arc<AtomicBool>,
}

impl<S: RoomStore> FaultyStore<S> {
    /// Wraps `inner`, initially healthy.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            failing: Arc::new(AtomicBool::new(false)),
            failing_reads: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Switches failure mode on or off. Shared by all clones.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Switches read failures on or off. Shared by all clones.
    pub fn set_failing_reads(&self, failing: bool) {
        self.failing_reads.store(failing, Ordering::SeqCst);
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("injected write failure".into()))
        } else {
            Ok(())
        }
    }

    fn check_read(&self) -> Result<(), StoreError> {
        if self.failing_reads.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("injected read failure".into()))
        } else {
            Ok(())
        }
    }
}

impl<S: RoomStore> RoomStore for FaultyStore<S> {
    async fn get_room(&self, code: &RoomCode) -> Result<Room, StoreError> {
        self.check_read()?;
        self.inner.get_room(code).await
    }

    async fn create_room(&self, host_name: &str) -> Result<Room, StoreError> {
        self.check()?;
        self.inner.create_room(host_name).await
    }

    async fn update_room(
        &self,
        code: &RoomCode,
        update: RoomUpdate,
    ) -> Result<Room, StoreError> {
        self.check()?;
        self.inner.update_room(code, update).await
    }

    async fn delete_room(&self, code: &RoomCode) -> Result<(), StoreError> {
        self.check()?;
        self.inner.delete_room(code).await
    }

    async fn get_or_create_player(
        &self,
        code: &RoomCode,
        name: &str,
        is_host: bool,
    ) -> Result<(Player, bool), StoreError> {
        self.check()?;
        self.inner.get_or_create_player(code, name, is_host).await
    }

    async fn update_player(
        &self,
        code: &RoomCode,
        name: &str,
        update: PlayerUpdate,
    ) -> Result<Player, StoreError> {
        self.check()?;
        self.inner.update_player(code, name, update).await
    }

    async fn list_players(
        &self,
        code: &RoomCode,
        filter: PlayerFilter,
    ) -> Result<Vec<Player>, StoreError> {
        self.check_read()?;
        self.inner.list_players(code, filter).await
    }

    async fn delete_all_players(
        &self,
        code: &RoomCode,
    ) -> Result<usize, StoreError> {
        self.check()?;
        self.inner.delete_all_players(code).await
    }
}
