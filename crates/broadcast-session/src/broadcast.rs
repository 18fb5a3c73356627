//! Broadcast facade: the two user flows on top of the session controller.
//!
//! ```text
//! start_broadcast(name, title)
//!   -> create_meeting(title) -> share link
//!   -> add_participant(meeting, name, host-preset)
//!   -> controller.start(credential)
//!
//! join_broadcast(name, meeting_id)
//!   -> add_participant(meeting, name, viewer-preset)
//!   -> controller.join(credential)
//! ```

use crate::config::Config;
use crate::credentials::CredentialService;
use crate::errors::BroadcastError;
use crate::session::{ControllerState, Preset, SessionControllerHandle};
use common::types::{MeetingId, ParticipantId};
use reqwest::Url;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Result of a successful `start_broadcast`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastInfo {
    pub meeting_id: MeetingId,
    /// Link viewers open to join.
    pub share_url: String,
}

/// User flow a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastAction {
    Start,
    Join,
}

impl BroadcastAction {
    /// Message shown to the user when the flow fails.
    #[must_use]
    pub fn failure_message(&self, err: &BroadcastError) -> String {
        let prefix = match self {
            BroadcastAction::Start => "Failed to start broadcast",
            BroadcastAction::Join => "Failed to join broadcast",
        };
        format!("{prefix}: {}", err.user_message())
    }
}

/// Build the viewer link for a meeting.
///
/// `public_base_url` is the app's origin; any path on it is replaced.
///
/// # Errors
///
/// Returns `BroadcastError::Internal` if the base URL cannot be parsed.
pub fn share_url(public_base_url: &str, meeting_id: &MeetingId) -> Result<String, BroadcastError> {
    let mut url = Url::parse(public_base_url)
        .and_then(|base| base.join("/viewer"))
        .map_err(|e| BroadcastError::Internal(format!("invalid public base url: {e}")))?;
    url.query_pairs_mut()
        .append_pair("meetingId", meeting_id.as_str());
    Ok(url.into())
}

/// Start and join broadcasts.
#[derive(Clone)]
pub struct BroadcastClient {
    credentials: Arc<dyn CredentialService>,
    controller: SessionControllerHandle,
    public_base_url: String,
    default_title: String,
}

impl BroadcastClient {
    #[must_use]
    pub fn new(
        credentials: Arc<dyn CredentialService>,
        controller: SessionControllerHandle,
        config: &Config,
    ) -> Self {
        Self {
            credentials,
            controller,
            public_base_url: config.public_base_url.clone(),
            default_title: config.default_title.clone(),
        }
    }

    /// The underlying session controller.
    #[must_use]
    pub fn controller(&self) -> &SessionControllerHandle {
        &self.controller
    }

    /// Create a meeting and start broadcasting to it.
    ///
    /// # Errors
    ///
    /// `Validation` for a blank name, `AlreadyJoiningOrJoined` while a
    /// session is live, `CredentialFetchFailed` for credential service
    /// failures, and any error from [`SessionControllerHandle::start`].
    #[instrument(skip_all)]
    pub async fn start_broadcast(
        &self,
        host_name: &str,
        title: &str,
    ) -> Result<BroadcastInfo, BroadcastError> {
        let host_name = required(host_name, "Please enter your name")?;
        self.ensure_idle()?;

        let title = match title.trim() {
            "" => self.default_title.as_str(),
            t => t,
        };

        let meeting = self.credentials.create_meeting(title).await.map_err(|e| {
            warn!(target: "broadcast.facade", error = %e, "Meeting creation failed");
            BroadcastError::from(e)
        })?;
        let share_url = share_url(&self.public_base_url, &meeting.id)?;

        let grant = self
            .credentials
            .add_participant(&meeting.id, host_name, Preset::Host)
            .await
            .map_err(|e| {
                warn!(
                    target: "broadcast.facade",
                    meeting_id = %meeting.id,
                    error = %e,
                    "Host credential request failed"
                );
                BroadcastError::from(e)
            })?;

        let participant_id = grant.id.clone();
        self.controller
            .start(grant.into_credential(Preset::Host))
            .await?;

        info!(
            target: "broadcast.facade",
            meeting_id = %meeting.id,
            participant_id = participant_id.as_ref().map_or("", ParticipantId::as_str),
            "Broadcast started"
        );

        Ok(BroadcastInfo {
            meeting_id: meeting.id,
            share_url,
        })
    }

    /// Join an existing broadcast as a viewer.
    ///
    /// # Errors
    ///
    /// `Validation` for a blank name or meeting id, otherwise as
    /// [`BroadcastClient::start_broadcast`].
    #[instrument(skip_all)]
    pub async fn join_broadcast(
        &self,
        viewer_name: &str,
        meeting_id: &str,
    ) -> Result<(), BroadcastError> {
        let viewer_name = required(viewer_name, "Please enter your name")?;
        let meeting_id = MeetingId::new(required(meeting_id, "Meeting ID is required")?);
        self.ensure_idle()?;

        let grant = self
            .credentials
            .add_participant(&meeting_id, viewer_name, Preset::Viewer)
            .await
            .map_err(|e| {
                warn!(
                    target: "broadcast.facade",
                    meeting_id = %meeting_id,
                    error = %e,
                    "Viewer credential request failed"
                );
                BroadcastError::from(e)
            })?;

        let participant_id = grant.id.clone();
        self.controller
            .join(grant.into_credential(Preset::Viewer))
            .await?;

        info!(
            target: "broadcast.facade",
            meeting_id = %meeting_id,
            participant_id = participant_id.as_ref().map_or("", ParticipantId::as_str),
            "Joined broadcast"
        );
        Ok(())
    }

    /// Leave the current broadcast. Never fails.
    pub async fn leave(&self) {
        self.controller.leave().await;
    }

    /// Reject a new flow before any network call while a session is live.
    fn ensure_idle(&self) -> Result<(), BroadcastError> {
        match self.controller.snapshot().state {
            ControllerState::Starting | ControllerState::Active => {
                Err(BroadcastError::AlreadyJoiningOrJoined)
            }
            ControllerState::NotStarted | ControllerState::Ended => Ok(()),
        }
    }
}

fn required<'a>(value: &'a str, message: &str) -> Result<&'a str, BroadcastError> {
    match value.trim() {
        "" => Err(BroadcastError::Validation(message.to_string())),
        trimmed => Ok(trimmed),
    }
}
