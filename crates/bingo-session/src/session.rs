//! Session types: who a socket belongs to and where to find the token.

use bingo_protocol::RoomCode;

use crate::SessionError;

/// Longest display name accepted at bootstrap.
pub const MAX_NAME_LEN: usize = 50;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Where the resolver looks for a session token on the upgrade request.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Query parameter checked first, e.g. `?session=<token>`.
    pub query_param: String,
    /// Cookie checked when the query parameter is absent.
    pub cookie_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            query_param: "session".to_string(),
            cookie_name: "bingo_session".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionIdentity
// ---------------------------------------------------------------------------

/// The identity triple a connection is admitted with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    /// Display name, unique within the room.
    pub user_name: String,
    /// The room this session belongs to.
    pub room_code: RoomCode,
    /// Whether this player created the room.
    pub is_host: bool,
}

/// Trims a display name and checks its length.
pub(crate) fn normalize_name(name: &str) -> Result<String, SessionError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SessionError::InvalidName("name must not be empty".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(SessionError::InvalidName(format!(
            "name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}
