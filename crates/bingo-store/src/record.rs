//! Stored records and partial updates.

use bingo_protocol::{Board, PlayerSummary, ReadyEntry, RoomCode};
use serde::{Deserialize, Serialize};

/// The durable record of one bingo room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub code: RoomCode,
    pub host_name: String,
    pub game_started: bool,
    /// The most recently called number.
    pub current_number: Option<u8>,
    /// Called numbers in call order. Never contains duplicates.
    pub drawn_numbers: Vec<u8>,
    /// Whose turn it is. Empty before the game starts.
    pub current_turn_player: String,
}

impl Room {
    /// A fresh, unstarted room.
    pub fn new(code: RoomCode, host_name: impl Into<String>) -> Self {
        Self {
            code,
            host_name: host_name.into(),
            game_started: false,
            current_number: None,
            drawn_numbers: Vec::new(),
            current_turn_player: String::new(),
        }
    }

    /// `true` if `number` has already been called.
    pub fn is_drawn(&self, number: u8) -> bool {
        self.drawn_numbers.contains(&number)
    }
}

/// A player's record within a room. Identified by `(room, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub is_host: bool,
    pub is_connected: bool,
    pub is_ready: bool,
    pub board: Board,
}

impl Player {
    /// A newly joined, connected player with no board.
    pub fn new(name: impl Into<String>, is_host: bool) -> Self {
        Self {
            name: name.into(),
            is_host,
            is_connected: true,
            is_ready: false,
            board: Board::empty(),
        }
    }

    /// The roster view of this player.
    pub fn summary(&self) -> PlayerSummary {
        PlayerSummary {
            name: self.name.clone(),
            is_host: self.is_host,
            is_connected: self.is_connected,
            is_ready: self.is_ready,
        }
    }

    /// The ready-roster view of this player.
    pub fn ready_entry(&self) -> ReadyEntry {
        ReadyEntry {
            name: self.name.clone(),
            is_ready: self.is_ready,
        }
    }
}

/// Which players [`list_players`](crate::RoomStore::list_players) returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerFilter {
    #[default]
    All,
    Connected,
}

impl PlayerFilter {
    /// `true` if `player` passes the filter.
    pub fn matches(self, player: &Player) -> bool {
        match self {
            Self::All => true,
            Self::Connected => player.is_connected,
        }
    }
}

/// A partial update of a [`Room`]. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomUpdate {
    pub game_started: Option<bool>,
    pub current_number: Option<Option<u8>>,
    pub drawn_numbers: Option<Vec<u8>>,
    pub current_turn_player: Option<String>,
}

impl RoomUpdate {
    /// The update that turns `from` into `to`, touching only the fields
    /// that differ.
    pub fn diff(from: &Room, to: &Room) -> Self {
        Self {
            game_started: (from.game_started != to.game_started)
                .then_some(to.game_started),
            current_number: (from.current_number != to.current_number)
                .then_some(to.current_number),
            drawn_numbers: (from.drawn_numbers != to.drawn_numbers)
                .then(|| to.drawn_numbers.clone()),
            current_turn_player: (from.current_turn_player
                != to.current_turn_player)
                .then(|| to.current_turn_player.clone()),
        }
    }

    /// `true` if applying the update would change nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Writes the set fields into `room`.
    pub fn apply(self, room: &mut Room) {
        if let Some(started) = self.game_started {
            room.game_started = started;
        }
        if let Some(number) = self.current_number {
            room.current_number = number;
        }
        if let Some(drawn) = self.drawn_numbers {
            room.drawn_numbers = drawn;
        }
        if let Some(turn) = self.current_turn_player {
            room.current_turn_player = turn;
        }
    }
}

/// A partial update of a [`Player`]. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerUpdate {
    pub is_connected: Option<bool>,
    pub is_ready: Option<bool>,
    pub board: Option<Board>,
}

impl PlayerUpdate {
    /// Sets the connection flag.
    pub fn connected(is_connected: bool) -> Self {
        Self {
            is_connected: Some(is_connected),
            ..Self::default()
        }
    }

    /// Sets the ready flag.
    pub fn ready(is_ready: bool) -> Self {
        Self {
            is_ready: Some(is_ready),
            ..Self::default()
        }
    }

    /// Replaces the board. Readiness is left alone.
    pub fn board(board: Board) -> Self {
        Self {
            board: Some(board),
            ..Self::default()
        }
    }

    /// Wipes the board and resets readiness.
    pub fn cleared() -> Self {
        Self {
            is_connected: None,
            is_ready: Some(false),
            board: Some(Board::empty()),
        }
    }

    /// Writes the set fields into `player`.
    pub fn apply(self, player: &mut Player) {
        if let Some(connected) = self.is_connected {
            player.is_connected = connected;
        }
        if let Some(ready) = self.is_ready {
            player.is_ready = ready;
        }
        if let Some(board) = self.board {
            player.board = board;
        }
    }
}
