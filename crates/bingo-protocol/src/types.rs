//! Core protocol types for the bingo wire format.
//!
//! Every inbound message is a JSON object discriminated by its `action`
//! field ([`ClientAction`]); every outbound message is a JSON object
//! discriminated by its `type` field ([`ServerEvent`]). Both are closed
//! enums, so dispatch is an exhaustive `match` rather than a lookup by
//! name.

use serde::{Deserialize, Serialize};

use std::fmt;

/// Number of cells on a player's board (5×5).
pub const BOARD_CELLS: usize = 25;

/// Message sent to a client when something unexpected went wrong while
/// handling its request. Deliberately vague: internal details are logged,
/// not leaked.
pub const GENERIC_ERROR: &str = "An error occurred processing your request";

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The short code that identifies a room, e.g. `ABC123`.
///
/// Codes are case-insensitive for humans, so construction trims and
/// upper-cases the input. Serialized as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Creates a normalized room code.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_ascii_uppercase())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the code is blank.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// A player's board: either empty (never filled) or exactly
/// [`BOARD_CELLS`] values in row-major order, where `0` marks a cell that
/// has not been filled yet.
///
/// Serialized as a plain JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board(Vec<u8>);

impl Board {
    /// An empty board.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// A board with all cells present but unfilled.
    pub fn blank() -> Self {
        Self(vec![0; BOARD_CELLS])
    }

    /// Wraps raw cell values.
    pub fn from_cells(cells: Vec<u8>) -> Self {
        Self(cells)
    }

    /// Returns the cell values.
    pub fn cells(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the board, returning its cell values.
    pub fn into_cells(self) -> Vec<u8> {
        self.0
    }

    /// `true` if the board has never been filled.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of cells holding a value.
    pub fn filled_count(&self) -> usize {
        self.0.iter().filter(|&&v| v != 0).count()
    }

    /// `true` if all [`BOARD_CELLS`] cells hold a nonzero value.
    pub fn is_complete(&self) -> bool {
        self.0.len() == BOARD_CELLS && self.0.iter().all(|&v| v != 0)
    }
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// One cell of a bingo claim as the client sees it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkedCell {
    /// The value printed in the cell. Missing on malformed clients.
    #[serde(default)]
    pub number: Option<u32>,
    /// Whether the client has marked this cell.
    #[serde(default)]
    pub marked: bool,
}

/// Everything a client can ask the server to do.
///
/// Internally tagged: `{"action": "select_number", "number": 7}`.
/// Unknown fields are ignored; unknown actions fail to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientAction {
    /// Host only: begin the game once every connected player is ready.
    StartGame,
    /// Declare the sender's (complete) board ready.
    PlayerReady,
    /// Replace the sender's board with a random permutation of 1..=25.
    GenerateRandomBoard,
    /// Wipe the sender's board.
    ClearBoard,
    /// Place the next sequential value into an empty cell.
    ManualFillCell { cell_index: u32 },
    /// Call a number on the sender's turn.
    SelectNumber { number: u32 },
    /// Claim a win with the client's view of its marked board.
    ClaimBingo {
        #[serde(default)]
        board_state: Vec<MarkedCell>,
    },
    /// Say something to the room.
    ChatMessage { message: String },
}

impl ClientAction {
    /// The wire name of the action, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StartGame => "start_game",
            Self::PlayerReady => "player_ready",
            Self::GenerateRandomBoard => "generate_random_board",
            Self::ClearBoard => "clear_board",
            Self::ManualFillCell { .. } => "manual_fill_cell",
            Self::SelectNumber { .. } => "select_number",
            Self::ClaimBingo { .. } => "claim_bingo",
            Self::ChatMessage { .. } => "chat_message",
        }
    }
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// A player as shown in the room roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub name: String,
    pub is_host: bool,
    pub is_connected: bool,
    pub is_ready: bool,
}

/// One row of the ready roster broadcast after a player readies up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyEntry {
    pub name: String,
    pub is_ready: bool,
}

/// Everything a freshly connected client needs to render the room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub host_name: String,
    pub game_started: bool,
    pub current_number: Option<u8>,
    pub drawn_numbers: Vec<u8>,
    /// All players in join order, connected or not.
    pub players: Vec<PlayerSummary>,
    /// Empty before the game starts.
    pub current_turn_player: String,
}

/// Everything the server can tell a client.
///
/// Internally tagged: `{"type": "number_called", "number": 7, ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Sent only to the connecting client.
    GameInit {
        board: Board,
        player_name: String,
        is_host: bool,
        room_data: RoomSnapshot,
    },
    PlayerJoined {
        player_name: String,
        is_host: bool,
    },
    /// Informational; carries the turn holder after any rotation.
    PlayerLeft {
        player_name: String,
        current_turn_player: String,
    },
    BoardGenerated {
        board: Board,
    },
    BoardCleared,
    CellFilled {
        cell_index: u32,
        number: u8,
        board: Board,
    },
    PlayerReadyUpdate {
        player_name: String,
        ready_status: Vec<ReadyEntry>,
    },
    GameStarted {
        message: String,
        current_turn_player: String,
    },
    NumberCalled {
        number: u8,
        drawn_numbers: Vec<u8>,
        selected_by: String,
        current_turn_player: String,
    },
    BingoWinner {
        winner: String,
        lines: usize,
    },
    InvalidBingo {
        message: String,
        lines: usize,
    },
    RoomClosing {
        message: String,
    },
    Chat {
        message: String,
        sender: String,
    },
    Error {
        message: String,
    },
}

impl ServerEvent {
    /// Shorthand for an `error` event.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Close codes
// ---------------------------------------------------------------------------

/// Why the server refused to admit a connection.
///
/// The numeric codes are part of the public protocol; clients branch on
/// them, so they must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum CloseReason {
    /// The socket carried no session identity.
    NoSession = 4000,
    /// The room or the player record could not be resolved.
    ResolutionFailed = 4001,
    /// Something unexpected broke during admission.
    InternalError = 4002,
}

impl CloseReason {
    /// The WebSocket close code.
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Human-readable close reason.
    pub fn reason(self) -> &'static str {
        match self {
            Self::NoSession => "no session",
            Self::ResolutionFailed => "room or player could not be resolved",
            Self::InternalError => "internal error",
        }
    }
}
