//! In-process [`RoomStore`] backed by a hash map.

use std::collections::HashMap;
use std::sync::Arc;

use bingo_protocol::RoomCode;
use rand::Rng;
use tokio::sync::Mutex;

use crate::{
    Player, PlayerFilter, PlayerUpdate, Room, RoomStore, RoomUpdate,
    StoreError,
};

/// Alphabet for generated room codes.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of generated room codes.
const CODE_LEN: usize = 6;

/// Attempts before giving up on finding an unused code.
const CODE_ATTEMPTS: usize = 32;

/// A room together with its players, kept in join order.
#[derive(Debug, Clone)]
struct RoomEntry {
    room: Room,
    players: Vec<Player>,
}

/// A [`RoomStore`] that lives in process memory.
///
/// Clones share the same underlying map, so a test can hand one clone to
/// the server and inspect the records through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    rooms: Arc<Mutex<HashMap<RoomCode, RoomEntry>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a room under a caller-chosen code, replacing any existing
    /// room (and its players) with that code.
    pub async fn insert_room(&self, code: RoomCode, host_name: &str) -> Room {
        let room = Room::new(code.clone(), host_name);
        self.rooms.lock().await.insert(
            code,
            RoomEntry {
                room: room.clone(),
                players: Vec::new(),
            },
        );
        room
    }

    /// Number of rooms currently stored.
    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }
}

fn generate_code() -> RoomCode {
    let mut rng = rand::rng();
    let code: String = (0..CODE_LEN)
        .map(|_| {
            let idx = rng.random_range(0..CODE_ALPHABET.len());
            char::from(CODE_ALPHABET[idx])
        })
        .collect();
    RoomCode::new(code)
}

impl RoomStore for MemoryStore {
    async fn get_room(&self, code: &RoomCode) -> Result<Room, StoreError> {
        self.rooms
            .lock()
            .await
            .get(code)
            .map(|entry| entry.room.clone())
            .ok_or_else(|| StoreError::RoomNotFound(code.clone()))
    }

    async fn create_room(&self, host_name: &str) -> Result<Room, StoreError> {
        let mut rooms = self.rooms.lock().await;
        let code = (0..CODE_ATTEMPTS)
            .map(|_| generate_code())
            .find(|code| !rooms.contains_key(code))
            .ok_or(StoreError::CodeExhausted)?;

        let room = Room::new(code.clone(), host_name);
        rooms.insert(
            code.clone(),
            RoomEntry {
                room: room.clone(),
                players: Vec::new(),
            },
        );
        tracing::debug!(room = %code, host = host_name, "room record created");
        Ok(room)
    }

    async fn update_room(
        &self,
        code: &RoomCode,
        update: RoomUpdate,
    ) -> Result<Room, StoreError> {
        let mut rooms = self.rooms.lock().await;
        let entry = rooms
            .get_mut(code)
            .ok_or_else(|| StoreError::RoomNotFound(code.clone()))?;
        update.apply(&mut entry.room);
        Ok(entry.room.clone())
    }

    async fn delete_room(&self, code: &RoomCode) -> Result<(), StoreError> {
        self.rooms
            .lock()
            .await
            .remove(code)
            .map(|_| ())
            .ok_or_else(|| StoreError::RoomNotFound(code.clone()))
    }

    async fn get_or_create_player(
        &self,
        code: &RoomCode,
        name: &str,
        is_host: bool,
    ) -> Result<(Player, bool), StoreError> {
        let mut rooms = self.rooms.lock().await;
        let entry = rooms
            .get_mut(code)
            .ok_or_else(|| StoreError::RoomNotFound(code.clone()))?;

        if let Some(existing) =
            entry.players.iter_mut().find(|p| p.name == name)
        {
            existing.is_connected = true;
            return Ok((existing.clone(), false));
        }

        let player = Player::new(name, is_host);
        entry.players.push(player.clone());
        Ok((player, true))
    }

    async fn update_player(
        &self,
        code: &RoomCode,
        name: &str,
        update: PlayerUpdate,
    ) -> Result<Player, StoreError> {
        let mut rooms = self.rooms.lock().await;
        let entry = rooms
            .get_mut(code)
            .ok_or_else(|| StoreError::RoomNotFound(code.clone()))?;
        let player = entry
            .players
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| StoreError::PlayerNotFound {
                room: code.clone(),
                name: name.to_string(),
            })?;
        update.apply(player);
        Ok(player.clone())
    }

    async fn list_players(
        &self,
        code: &RoomCode,
        filter: PlayerFilter,
    ) -> Result<Vec<Player>, StoreError> {
        let rooms = self.rooms.lock().await;
        let entry = rooms
            .get(code)
            .ok_or_else(|| StoreError::RoomNotFound(code.clone()))?;
        Ok(entry
            .players
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    async fn delete_all_players(
        &self,
        code: &RoomCode,
    ) -> Result<usize, StoreError> {
        let mut rooms = self.rooms.lock().await;
        Ok(rooms
            .get_mut(code)
            .map(|entry| entry.players.drain(..).count())
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_use_alphabet() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.as_str().len(), CODE_LEN);
            assert!(code
                .as_str()
                .bytes()
                .all(|b| CODE_ALPHABET.contains(&b)));
        }
    }

    #[tokio::test]
    async fn test_insert_room_replaces_existing() {
        let store = MemoryStore::new();
        let code = RoomCode::new("ABC123");
        store.insert_room(code.clone(), "alice").await;
        store.get_or_create_player(&code, "alice", true).await.unwrap();

        store.insert_room(code.clone(), "bob").await;
        assert_eq!(store.get_room(&code).await.unwrap().host_name, "bob");
        assert!(store
            .list_players(&code, PlayerFilter::All)
            .await
            .unwrap()
            .is_empty());
    }
}
