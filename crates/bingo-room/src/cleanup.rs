//! Delayed post-win cleanup.
//!
//! The schedule is a plain value owned by the room actor and polled in the
//! actor's `select!` loop, so it lives and dies with the session. Tearing
//! the room down early (everyone left) simply drops the pending deadline;
//! there is no detached task that could fire against a deleted room.

use std::future;

use tokio::time::{self, Instant};

/// What the actor should do when the current deadline passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CleanupStage {
    /// Broadcast the closing notice, then wait for teardown.
    Notice,
    /// Delete the room's records and stop.
    Teardown,
}

/// An optional deadline plus the stage it triggers.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CleanupSchedule {
    next: Option<(Instant, CleanupStage)>,
}

impl CleanupSchedule {
    /// Schedules `stage` to fire at `deadline`, replacing any pending one.
    pub(crate) fn arm(&mut self, deadline: Instant, stage: CleanupStage) {
        self.next = Some((deadline, stage));
    }

    /// Clears the pending deadline.
    pub(crate) fn disarm(&mut self) {
        self.next = None;
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.next.is_some()
    }

    /// Resolves with the stage once its deadline passes. Never resolves
    /// while disarmed.
    pub(crate) async fn wait(self) -> CleanupStage {
        match self.next {
            Some((deadline, stage)) => {
                time::sleep_until(deadline).await;
                stage
            }
            None => future::pending().await,
        }
    }
}
