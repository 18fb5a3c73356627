//! Mock credential service.

use async_trait::async_trait;
use broadcast_session::credentials::{
    CredentialError, CredentialService, Meeting, ParticipantGrant,
};
use broadcast_session::session::Preset;
use common::secret::SecretString;
use common::types::{MeetingId, ParticipantId};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behavior {
    Accept,
    Fail,
    BlankToken,
}

/// A recorded `add_participant` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddParticipantCall {
    pub meeting_id: MeetingId,
    pub name: String,
    pub preset: Preset,
}

/// Mock credential service for facade tests.
#[derive(Debug)]
pub struct MockCredentialService {
    behavior: Behavior,
    meeting_id: String,
    create_calls: AtomicUsize,
    add_calls: AtomicUsize,
    titles: Mutex<Vec<String>>,
    participants: Mutex<Vec<AddParticipantCall>>,
}

impl MockCredentialService {
    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            meeting_id: "meeting-test".to_string(),
            create_calls: AtomicUsize::new(0),
            add_calls: AtomicUsize::new(0),
            titles: Mutex::new(Vec::new()),
            participants: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that always succeeds.
    #[must_use]
    pub fn accepting() -> Self {
        Self::with_behavior(Behavior::Accept)
    }

    /// Create a mock whose every call fails with an HTTP error.
    #[must_use]
    pub fn failing() -> Self {
        Self::with_behavior(Behavior::Fail)
    }

    /// Create a mock that mints blank auth tokens.
    #[must_use]
    pub fn blank_token() -> Self {
        Self::with_behavior(Behavior::BlankToken)
    }

    /// Set the id returned by `create_meeting`.
    #[must_use]
    pub fn with_meeting_id(mut self, id: impl Into<String>) -> Self {
        self.meeting_id = id.into();
        self
    }

    #[must_use]
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn add_calls(&self) -> usize {
        self.add_calls.load(Ordering::SeqCst)
    }

    /// Titles passed to `create_meeting`, in call order.
    #[must_use]
    pub fn titles(&self) -> Vec<String> {
        self.titles.lock().unwrap().clone()
    }

    /// `add_participant` calls, in call order.
    #[must_use]
    pub fn participant_calls(&self) -> Vec<AddParticipantCall> {
        self.participants.lock().unwrap().clone()
    }
}

#[async_trait]
impl CredentialService for MockCredentialService {
    async fn create_meeting(&self, title: &str) -> Result<Meeting, CredentialError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.titles.lock().unwrap().push(title.to_string());

        if self.behavior == Behavior::Fail {
            return Err(CredentialError::Http("Mock credential service error".to_string()));
        }

        Ok(Meeting {
            id: MeetingId::new(self.meeting_id.clone()),
            title: title.to_string(),
        })
    }

    async fn add_participant(
        &self,
        meeting_id: &MeetingId,
        name: &str,
        preset: Preset,
    ) -> Result<ParticipantGrant, CredentialError> {
        let count = self.add_calls.fetch_add(1, Ordering::SeqCst);
        self.participants.lock().unwrap().push(AddParticipantCall {
            meeting_id: meeting_id.clone(),
            name: name.to_string(),
            preset,
        });

        let auth_token = match self.behavior {
            Behavior::Fail => {
                return Err(CredentialError::Http(
                    "Mock credential service error".to_string(),
                ))
            }
            Behavior::BlankToken => String::new(),
            Behavior::Accept => format!("token-{}-{count}", preset.as_str()),
        };

        Ok(ParticipantGrant {
            id: Some(ParticipantId::new(format!("participant-{count}"))),
            auth_token: SecretString::from(auth_token),
        })
    }
}
