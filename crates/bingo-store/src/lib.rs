//! Durable record of rooms and players.
//!
//! The room session engine never owns persistence; it talks to a
//! [`RoomStore`] through a narrow CRUD-plus-update interface. The store is
//! the system of record: every committed mutation of a room's turn state,
//! drawn numbers, or a player's board is written here before it is
//! announced to clients.
//!
//! # Key types
//!
//! - [`RoomStore`]: the interface the engine consumes
//! - [`Room`] / [`Player`]: the records
//! - [`RoomUpdate`] / [`PlayerUpdate`]: partial field updates
//! - [`MemoryStore`]: in-process implementation
//! - [`FaultyStore`]: wrapper that fails writes or reads on demand, for testing
//!   the engine's no-partial-commit guarantee

#![allow(async_fn_in_trait)]

mod error;
mod faulty;
mod memory;
mod record;

pub use error::StoreError;
pub use faulty::FaultyStore;
pub use memory::MemoryStore;
pub use record::{Player, PlayerFilter, PlayerUpdate, Room, RoomUpdate};

use std::future::Future;

use bingo_protocol::RoomCode;

/// The storage interface consumed by the room session engine.
///
/// # Trait bounds
///
/// `Send + Sync + 'static` and `Send` futures, because one store instance
/// is shared by every room actor and connection task in the process.
///
/// # Ordering
///
/// [`list_players`](RoomStore::list_players) returns players in join
/// order. Turn rotation depends on it.
pub trait RoomStore: Send + Sync + 'static {
    /// Looks up a room by code.
    ///
    /// # Errors
    /// [`StoreError::RoomNotFound`] if no such room exists.
    fn get_room(
        &self,
        code: &RoomCode,
    ) -> impl Future<Output = Result<Room, StoreError>> + Send;

    /// Creates a room for `host_name` under a freshly generated unique code.
    fn create_room(
        &self,
        host_name: &str,
    ) -> impl Future<Output = Result<Room, StoreError>> + Send;

    /// Applies a partial update and returns the updated room.
    fn update_room(
        &self,
        code: &RoomCode,
        update: RoomUpdate,
    ) -> impl Future<Output = Result<Room, StoreError>> + Send;

    /// Deletes a room and, by cascade, all of its players.
    ///
    /// # Errors
    /// [`StoreError::RoomNotFound`] if the room is already gone.
    fn delete_room(
        &self,
        code: &RoomCode,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Returns the player `name` in the room, creating it if needed.
    ///
    /// An existing record is marked connected and keeps its board. The
    /// boolean is `true` when the record was created by this call.
    fn get_or_create_player(
        &self,
        code: &RoomCode,
        name: &str,
        is_host: bool,
    ) -> impl Future<Output = Result<(Player, bool), StoreError>> + Send;

    /// Applies a partial update and returns the updated player.
    fn update_player(
        &self,
        code: &RoomCode,
        name: &str,
        update: PlayerUpdate,
    ) -> impl Future<Output = Result<Player, StoreError>> + Send;

    /// Lists the room's players in join order.
    fn list_players(
        &self,
        code: &RoomCode,
        filter: PlayerFilter,
    ) -> impl Future<Output = Result<Vec<Player>, StoreError>> + Send;

    /// Deletes every player in the room, returning how many were removed.
    /// A missing room counts as zero players.
    fn delete_all_players(
        &self,
        code: &RoomCode,
    ) -> impl Future<Output = Result<usize, StoreError>> + Send;
}
