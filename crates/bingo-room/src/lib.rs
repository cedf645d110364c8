//! Room sessions for bingo.
//!
//! Each active room runs as an isolated Tokio task (actor model) that owns
//! the room's turn and draw state. Connection handlers never touch that
//! state directly: they send commands through a [`RoomHandle`] and get the
//! outcome back on a reply channel, so every read-then-write on a room is
//! serialized without a lock.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: create-on-first-join, lookup, and destroy of room
//!   sessions by code
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`board`]: board generation, manual fill, and win validation
//! - [`RoomPhase`]: lifecycle state machine
//! - [`RoomConfig`]: timings and rules (win grace, lines to win, etc.)

mod cleanup;
mod config;
mod error;
mod registry;
mod room;

pub mod board;

pub use config::{RoomConfig, RoomPhase};
pub use error::RoomError;
pub use registry::RoomRegistry;
pub use room::{EventSender, LeaveOutcome, RoomHandle, RoomInfo};
