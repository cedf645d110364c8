//! Session bootstrap for bingo rooms.
//!
//! Before a socket is admitted to a room, something outside the message
//! stream must say who is on the other end. This crate handles that:
//!
//! 1. **Bootstrap**: creating a room as host or joining one by code,
//!    which issues a session token ([`SessionManager`])
//! 2. **Resolution**: turning the token a socket arrives with into a
//!    [`SessionIdentity`] ([`IdentityResolver`] trait)
//!
//! # How it fits in the stack
//!
//! ```text
//! Connection handler (above)  ← asks who the socket belongs to
//!     ↕
//! Session layer (this crate)  ← token → {user_name, room_code, is_host}
//!     ↕
//! Store (below)  ← rooms must exist, names must be free
//! ```

#![allow(async_fn_in_trait)]

mod error;
mod manager;
mod resolver;
mod session;

pub use error::SessionError;
pub use manager::SessionManager;
pub use resolver::IdentityResolver;
pub use session::{SessionConfig, SessionIdentity, MAX_NAME_LEN};
