//! Test data fixtures: participants and session credentials.

use broadcast_session::credentials::SessionCredential;
use broadcast_session::session::Preset;
use broadcast_session::transport::ParticipantRecord;
use common::secret::SecretString;
use uuid::Uuid;

/// Test participant fixture.
#[derive(Debug, Clone)]
pub struct TestParticipant {
    /// Participant ID.
    pub id: String,
    /// Display name (`None` models a transport that reports no name).
    pub name: Option<String>,
    /// Microphone on.
    pub audio_enabled: Option<bool>,
    /// Camera on.
    pub video_enabled: Option<bool>,
}

impl TestParticipant {
    /// Create a participant with a random ID and media state unreported.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: format!("participant-{}", Uuid::new_v4()),
            name: Some(name.into()),
            audio_enabled: None,
            video_enabled: None,
        }
    }

    /// A participant with camera and microphone on.
    #[must_use]
    pub fn broadcaster(name: impl Into<String>) -> Self {
        Self::new(name).with_audio(true).with_video(true)
    }

    /// A participant with camera and microphone off.
    #[must_use]
    pub fn viewer(name: impl Into<String>) -> Self {
        Self::new(name).with_audio(false).with_video(false)
    }

    /// Set the ID.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Drop the display name.
    #[must_use]
    pub fn unnamed(mut self) -> Self {
        self.name = None;
        self
    }

    #[must_use]
    pub fn with_audio(mut self, enabled: bool) -> Self {
        self.audio_enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn with_video(mut self, enabled: bool) -> Self {
        self.video_enabled = Some(enabled);
        self
    }

    /// Raw transport record for this participant.
    #[must_use]
    pub fn record(&self) -> ParticipantRecord {
        self.clone().into()
    }
}

impl From<TestParticipant> for ParticipantRecord {
    fn from(p: TestParticipant) -> Self {
        ParticipantRecord {
            id: p.id.as_str().into(),
            name: p.name,
            audio_enabled: p.audio_enabled,
            video_enabled: p.video_enabled,
        }
    }
}

/// A usable credential with a random token.
#[must_use]
pub fn test_credential(preset: Preset) -> SessionCredential {
    SessionCredential::new(
        SecretString::from(format!("test-token-{}", Uuid::new_v4())),
        preset,
    )
}

/// A credential whose token is blank.
#[must_use]
pub fn blank_credential(preset: Preset) -> SessionCredential {
    SessionCredential::new(SecretString::from(String::new()), preset)
}
