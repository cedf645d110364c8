//! Error types for the store layer.

use bingo_protocol::RoomCode;

/// Errors a [`RoomStore`](crate::RoomStore) can report.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No room with this code exists.
    #[error("room {0} not found")]
    RoomNotFound(RoomCode),

    /// The room exists but has no player with this name.
    #[error("player {name} not found in room {room}")]
    PlayerNotFound { room: RoomCode, name: String },

    /// A fresh unique room code could not be generated.
    #[error("could not allocate a unique room code")]
    CodeExhausted,

    /// The backing store could not be reached or refused the write.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// `true` if the error means the record does not exist, as opposed to
    /// the store failing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RoomNotFound(_) | Self::PlayerNotFound { .. })
    }
}
