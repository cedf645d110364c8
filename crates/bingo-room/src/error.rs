//! Error types for the room layer.

use bingo_protocol::RoomCode;
use bingo_store::StoreError;
use bingo_transport::ConnectionId;

/// Errors that can occur during room operations.
///
/// Variants fall in two groups. *Rejections* are precondition violations
/// caused by the client; their `Display` text is the exact message sent
/// back in an `error` event. *Faults* are server-side failures; clients
/// only ever see the generic error message for them.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    // -- rejections ------------------------------------------------------
    /// Host tried to start while some connected players aren't ready.
    #[error("Waiting for players to be ready: {}", .0.join(", "))]
    NotAllReady(Vec<String>),

    #[error("Please fill your board completely before marking ready!")]
    BoardIncomplete,

    #[error("This cell is already filled!")]
    CellFilled,

    #[error("Board is already full!")]
    BoardFull,

    #[error("Invalid cell index {0}")]
    InvalidCell(u32),

    /// Someone else holds the turn.
    #[error("It's {0}'s turn!")]
    NotYourTurn(String),

    #[error("This number has already been selected!")]
    AlreadyDrawn,

    #[error("Number must be between 1 and {max}")]
    NumberOutOfRange { number: u32, max: u8 },

    #[error("The game has not started yet")]
    NotStarted,

    #[error("The game has already started")]
    AlreadyStarted,

    /// A claim was validated; nothing else can be played.
    #[error("The game is over")]
    GameOver,

    // -- faults ----------------------------------------------------------
    /// The room does not exist in the store.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// A command came from a connection that never joined.
    #[error("{0} is not a member of this room")]
    NotMember(ConnectionId),

    /// The store failed while reading or committing room state.
    #[error(transparent)]
    Store(StoreError),

    /// The room's command channel is closed (the session has stopped).
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}

impl RoomError {
    /// Returns `true` if this is a client-caused rejection whose message
    /// may be shown verbatim.
    pub fn is_rejection(&self) -> bool {
        !matches!(
            self,
            Self::NotFound(_)
                | Self::NotMember(_)
                | Self::Store(_)
                | Self::Unavailable(_)
        )
    }
}

impl From<StoreError> for RoomError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::RoomNotFound(code) => Self::NotFound(code),
            other => Self::Store(other),
        }
    }
}
