//! Unified error type for the bingo server.

use bingo_protocol::ProtocolError;
use bingo_room::RoomError;
use bingo_session::SessionError;
use bingo_store::StoreError;
use bingo_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum BingoError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (missing or unknown token, bad name).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error (not found, unavailable, store fault).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A store error outside any room session.
    #[error(transparent)]
    Store(#[from] StoreError),
}
