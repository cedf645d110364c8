//! Room configuration and phase machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Rules and timings shared by every room session in a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// How long the room stays open after a validated win before the
    /// closing notice goes out.
    pub win_grace: Duration,

    /// Time between the closing notice and teardown, so the notice has a
    /// chance to reach every client.
    pub closing_notice: Duration,

    /// Completed lines a claim needs to win.
    pub lines_to_win: usize,

    /// Highest number that can be called. The pool is `1..=max_number`.
    pub max_number: u8,

    /// Capacity of each room actor's command channel.
    pub command_buffer: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            win_grace: Duration::from_secs(30),
            closing_notice: Duration::from_secs(5),
            lines_to_win: 5,
            max_number: 75,
            command_buffer: 64,
        }
    }
}

// ---------------------------------------------------------------------------
// RoomPhase
// ---------------------------------------------------------------------------

/// The lifecycle phase of a room session.
///
/// Transitions are strictly ordered, except that any phase may jump to
/// `Destroying` (the last player can leave at any time):
///
/// ```text
/// Lobby → InProgress → Finished → Destroying
/// ```
///
/// - **Lobby**: players fill boards and ready up. No numbers are called.
/// - **InProgress**: the host started the game; players take turns
///   calling numbers and may claim bingo.
/// - **Finished**: a claim was validated. Calls and claims are refused
///   while the delayed cleanup runs.
/// - **Destroying**: records are being deleted. The actor stops after this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomPhase {
    Lobby,
    InProgress,
    Finished,
    Destroying,
}

impl RoomPhase {
    /// The phase a session resumes in for a stored room.
    pub fn resume(game_started: bool) -> Self {
        if game_started {
            Self::InProgress
        } else {
            Self::Lobby
        }
    }

    /// Returns `true` once the host has started the game.
    pub fn is_started(&self) -> bool {
        !matches!(self, Self::Lobby)
    }

    /// Returns the next phase in the normal order, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Lobby => Some(Self::InProgress),
            Self::InProgress => Some(Self::Finished),
            Self::Finished => Some(Self::Destroying),
            Self::Destroying => None,
        }
    }

    /// Returns `true` if moving to `target` is allowed.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
            || (target == Self::Destroying && self != Self::Destroying)
    }
}

impl std::fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Finished => write!(f, "Finished"),
            Self::Destroying => write!(f, "Destroying"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_phase_next_follows_strict_order() {
        assert_eq!(RoomPhase::Lobby.next(), Some(RoomPhase::InProgress));
        assert_eq!(RoomPhase::InProgress.next(), Some(RoomPhase::Finished));
        assert_eq!(RoomPhase::Finished.next(), Some(RoomPhase::Destroying));
        assert_eq!(RoomPhase::Destroying.next(), None);
    }

    #[test]
    fn test_room_phase_any_live_phase_can_be_destroyed() {
        assert!(RoomPhase::Lobby.can_transition_to(RoomPhase::Destroying));
        assert!(RoomPhase::InProgress.can_transition_to(RoomPhase::Destroying));
        assert!(!RoomPhase::Destroying.can_transition_to(RoomPhase::Destroying));
        assert!(!RoomPhase::Lobby.can_transition_to(RoomPhase::Finished));
        assert!(!RoomPhase::Finished.can_transition_to(RoomPhase::Lobby));
    }

    #[test]
    fn test_room_phase_resume() {
        assert_eq!(RoomPhase::resume(false), RoomPhase::Lobby);
        assert_eq!(RoomPhase::resume(true), RoomPhase::InProgress);
        assert!(!RoomPhase::Lobby.is_started());
        assert!(RoomPhase::Finished.is_started());
    }

    #[test]
    fn test_room_phase_display() {
        assert_eq!(RoomPhase::Lobby.to_string(), "Lobby");
        assert_eq!(RoomPhase::InProgress.to_string(), "InProgress");
    }

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.win_grace, Duration::from_secs(30));
        assert_eq!(config.closing_notice, Duration::from_secs(5));
        assert_eq!(config.lines_to_win, 5);
        assert_eq!(config.max_number, 75);
    }
}
