//! Error types for the session layer.

use bingo_protocol::RoomCode;
use bingo_store::StoreError;

/// Errors that can occur while bootstrapping or resolving a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The socket carried no session token at all.
    #[error("no session token presented")]
    MissingIdentity,

    /// The token was not issued by this server (or has been forgotten).
    #[error("unknown session token")]
    UnknownToken,

    /// The display name is empty or too long.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// There is no room with this code to join.
    #[error("room {0} not found")]
    RoomNotFound(RoomCode),

    /// Someone in the room already uses this name.
    #[error("name \"{name}\" is already taken in room {room}")]
    NameTaken { room: RoomCode, name: String },

    /// The store failed while creating or checking the room.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::RoomNotFound(code) => Self::RoomNotFound(code),
            other => Self::Store(other),
        }
    }
}
