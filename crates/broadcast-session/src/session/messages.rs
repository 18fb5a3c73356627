//! Message and state types for the session controller.
//!
//! Commands reach the controller task over `tokio::sync::mpsc`; replies use
//! `tokio::sync::oneshot`. Derived state is published on a
//! `tokio::sync::watch` channel as a [`SessionSnapshot`].

use super::role::Role;
use super::roster::{ParticipantView, Roster};
use super::view::Featured;
use crate::credentials::SessionCredential;
use crate::errors::BroadcastError;
use tokio::sync::oneshot;

/// Commands sent to the session controller task.
#[derive(Debug)]
pub enum SessionMessage {
    /// Start a broadcast as its host.
    Start {
        credential: SessionCredential,
        respond_to: oneshot::Sender<Result<(), BroadcastError>>,
    },

    /// Join an existing broadcast as a viewer.
    Join {
        credential: SessionCredential,
        respond_to: oneshot::Sender<Result<(), BroadcastError>>,
    },

    /// Leave the current session. Always acknowledged.
    Leave { respond_to: oneshot::Sender<()> },
}

/// Controller lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerState {
    /// No session yet, or the last attempt failed.
    #[default]
    NotStarted,
    /// Transport join issued, waiting for the room confirmation.
    Starting,
    /// Room confirmed.
    Active,
    /// Session left or torn down.
    Ended,
}

impl ControllerState {
    /// Returns the state as a string for logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ControllerState::NotStarted => "not_started",
            ControllerState::Starting => "starting",
            ControllerState::Active => "active",
            ControllerState::Ended => "ended",
        }
    }

    /// Whether transport events are acted upon in this state.
    #[must_use]
    pub const fn accepts_events(&self) -> bool {
        matches!(self, ControllerState::Starting | ControllerState::Active)
    }
}

/// Derived session state exposed to the UI layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Controller lifecycle state.
    pub state: ControllerState,
    /// Role of the current session, if any.
    pub role: Option<Role>,
    /// Local identity of the current session.
    pub local: Option<ParticipantView>,
    /// Remote participants.
    pub roster: Roster,
    /// Participant on the primary video surface.
    pub featured: Option<Featured>,
    /// Number of viewers (host sessions only, zero otherwise).
    pub viewer_count: usize,
    /// Unix timestamp of the successful transport join.
    pub started_at: Option<i64>,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Explicit `leave()`.
    Requested,
    /// Controller handle cancelled or dropped.
    Teardown,
    /// The transport reported the room as left.
    RemoteLeft,
}

impl EndReason {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            EndReason::Requested => "requested",
            EndReason::Teardown => "teardown",
            EndReason::RemoteLeft => "remote_left",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_snapshot_is_empty() {
        let snapshot = SessionSnapshot::default();
        assert_eq!(snapshot.state, ControllerState::NotStarted);
        assert!(snapshot.role.is_none());
        assert!(snapshot.roster.is_empty());
        assert!(snapshot.featured.is_none());
        assert_eq!(snapshot.viewer_count, 0);
    }

    #[test]
    fn test_only_live_states_accept_events() {
        assert!(!ControllerState::NotStarted.accepts_events());
        assert!(ControllerState::Starting.accepts_events());
        assert!(ControllerState::Active.accepts_events());
        assert!(!ControllerState::Ended.accepts_events());
    }
}
