//! Wire protocol for bingo rooms.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Types** ([`ClientAction`], [`ServerEvent`], [`RoomSnapshot`], etc.):
//!   the JSON objects that travel over a player's socket.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the room
//! session (game state). It doesn't know about connections or rooms:
//! it only knows how to serialize and deserialize messages.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientAction / ServerEvent) → Room session
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Board, ClientAction, CloseReason, MarkedCell, PlayerSummary, ReadyEntry,
    RoomCode, RoomSnapshot, ServerEvent, BOARD_CELLS, GENERIC_ERROR,
};
