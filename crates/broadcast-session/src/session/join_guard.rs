//! Join guard: the single source of truth for "is it safe to call the
//! transport's join/leave right now".
//!
//! ```text
//! Idle ──begin_join──▶ Joining ──mark_joined──▶ Joined
//!  ▲                     │  │                     │
//!  └──────abort_join─────┘  └──begin_leave──▶ Left ◀┘
//! ```
//!
//! `Left` accepts a fresh `begin_join`, so a controller can host several
//! sessions one after another.

use crate::errors::BroadcastError;
use tracing::debug;

/// Join guard lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    /// No session attempted yet.
    #[default]
    Idle,
    /// Join requested, waiting for the room confirmation.
    Joining,
    /// Room confirmed.
    Joined,
    /// Session left (locally or remotely).
    Left,
}

impl LifecycleState {
    /// Returns the state as a string for logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Idle => "idle",
            LifecycleState::Joining => "joining",
            LifecycleState::Joined => "joined",
            LifecycleState::Left => "left",
        }
    }
}

/// Guards against duplicate join and duplicate leave calls.
#[derive(Debug, Default)]
pub struct JoinGuard {
    state: LifecycleState,
}

impl JoinGuard {
    /// Create a guard in the `Idle` state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Whether a session is joining or joined.
    #[must_use]
    pub fn is_in_session(&self) -> bool {
        matches!(self.state, LifecycleState::Joining | LifecycleState::Joined)
    }

    /// Start a join attempt.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyJoiningOrJoined` unless the guard is `Idle` or `Left`.
    pub fn begin_join(&mut self) -> Result<(), BroadcastError> {
        match self.state {
            LifecycleState::Idle | LifecycleState::Left => {
                self.transition(LifecycleState::Joining);
                Ok(())
            }
            LifecycleState::Joining | LifecycleState::Joined => {
                Err(BroadcastError::AlreadyJoiningOrJoined)
            }
        }
    }

    /// Record the room confirmation. Returns `false` (and changes nothing)
    /// unless the guard is `Joining`, which absorbs duplicate notifications.
    pub fn mark_joined(&mut self) -> bool {
        if self.state == LifecycleState::Joining {
            self.transition(LifecycleState::Joined);
            true
        } else {
            false
        }
    }

    /// Start leaving. Returns `true` only on the first call from `Joining` or
    /// `Joined`; every later call is a no-op.
    pub fn begin_leave(&mut self) -> bool {
        if self.is_in_session() {
            self.transition(LifecycleState::Left);
            true
        } else {
            false
        }
    }

    /// Roll a failed join attempt back to `Idle`.
    pub fn abort_join(&mut self) {
        if self.state == LifecycleState::Joining {
            self.transition(LifecycleState::Idle);
        }
    }

    fn transition(&mut self, next: LifecycleState) {
        debug!(
            target: "broadcast.session.join_guard",
            from = self.state.as_str(),
            to = next.as_str(),
            "Join guard transition"
        );
        self.state = next;
    }
}
