//! Real-time transport boundary.
//!
//! The media transport (codecs, chat delivery, signaling) is an external
//! capability. The orchestrator only consumes it through these traits:
//!
//! ```text
//! Transport::init(auth_token, media_defaults) -> SessionHandle
//!   SessionHandle::subscribe()            lifecycle + roster events
//!   SessionHandle::join() / leave()       both fallible, neither idempotent
//!   SessionHandle::joined_participants()  everyone except the local identity
//! ```
//!
//! Events are delivered on an unbounded channel in transport order. A
//! subscriber created before `join()` sees every event the join produces.

use async_trait::async_trait;
use common::secret::SecretString;
use common::types::ParticipantId;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors reported by the transport.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The transport could not be reached or has gone away.
    #[error("Transport unavailable: {0}")]
    Unavailable(String),

    /// The transport refused the request (bad token, room closed, ...).
    #[error("Transport rejected the request: {0}")]
    Rejected(String),

    /// The call is not valid in the handle's current state.
    #[error("Invalid transport state: {0}")]
    InvalidState(String),
}

/// Initial media state requested from the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaDefaults {
    /// Start with the microphone enabled.
    pub audio: bool,
    /// Start with the camera enabled.
    pub video: bool,
}

/// Raw participant record as reported by the transport.
///
/// Every field except the id may be missing; the roster projector fills in
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantRecord {
    pub id: ParticipantId,
    pub name: Option<String>,
    pub audio_enabled: Option<bool>,
    pub video_enabled: Option<bool>,
}

impl ParticipantRecord {
    /// Create a record carrying only an id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: ParticipantId::new(id),
            name: None,
            audio_enabled: None,
            video_enabled: None,
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the audio flag.
    #[must_use]
    pub fn with_audio(mut self, enabled: bool) -> Self {
        self.audio_enabled = Some(enabled);
        self
    }

    /// Set the video flag.
    #[must_use]
    pub fn with_video(mut self, enabled: bool) -> Self {
        self.video_enabled = Some(enabled);
        self
    }
}

/// Lifecycle and roster events emitted by a session handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The local participant has joined the room.
    RoomJoined,
    /// The local participant has left the room.
    RoomLeft,
    /// A remote participant joined.
    ParticipantJoined(ParticipantRecord),
    /// A remote participant left.
    ParticipantLeft(ParticipantRecord),
}

impl TransportEvent {
    /// Short name for logs and metric labels.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            TransportEvent::RoomJoined => "room_joined",
            TransportEvent::RoomLeft => "room_left",
            TransportEvent::ParticipantJoined(_) => "participant_joined",
            TransportEvent::ParticipantLeft(_) => "participant_left",
        }
    }
}

/// Receiving side of a handle's event stream.
pub type EventReceiver = mpsc::UnboundedReceiver<TransportEvent>;

/// Factory for session handles.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Acquire a session handle for the given auth token.
    async fn init(
        &self,
        auth_token: &SecretString,
        defaults: MediaDefaults,
    ) -> Result<Box<dyn SessionHandle>, TransportError>;
}

/// A live session granted by the transport.
#[async_trait]
pub trait SessionHandle: Send + Sync {
    /// The local identity.
    fn local_participant(&self) -> ParticipantRecord;

    /// Current remote roster, in transport iteration order.
    fn joined_participants(&self) -> Vec<ParticipantRecord>;

    /// Attach a listener. Must be called before [`SessionHandle::join`] to
    /// observe the first roster snapshot.
    fn subscribe(&self) -> EventReceiver;

    /// Join the room.
    async fn join(&self) -> Result<(), TransportError>;

    /// Leave the room. Calling this twice may fail.
    async fn leave(&self) -> Result<(), TransportError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builder_sets_optional_fields() {
        let record = ParticipantRecord::new("v1")
            .with_name("Ada")
            .with_audio(true)
            .with_video(false);

        assert_eq!(record.id.as_str(), "v1");
        assert_eq!(record.name.as_deref(), Some("Ada"));
        assert_eq!(record.audio_enabled, Some(true));
        assert_eq!(record.video_enabled, Some(false));
    }

    #[test]
    fn test_event_kind_labels() {
        assert_eq!(TransportEvent::RoomJoined.kind(), "room_joined");
        assert_eq!(
            TransportEvent::ParticipantLeft(ParticipantRecord::new("x")).kind(),
            "participant_left"
        );
    }
}
