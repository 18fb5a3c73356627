//! Credential service client.
//!
//! The credential service is a small HTTP API that creates meetings and
//! mints per-participant auth tokens:
//!
//! ```text
//! POST {api}/api/meeting/create      {"title"}                          -> {"id", "title"}
//! POST {api}/api/participant/add     {"meetingId", "name", "presetName"} -> {"id", "authToken"}
//! ```
//!
//! Tokens never leave a [`SecretString`] except when handed to the
//! transport.

use crate::session::role::Preset;
use async_trait::async_trait;
use common::secret::{ExposeSecret, SecretString};
use common::types::{MeetingId, ParticipantId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, trace, warn};

/// Default HTTP request timeout.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout for the HTTP client.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Credential service errors.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Request could not be sent, or the service answered with a server error.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The service refused the request (4xx).
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// The response body could not be parsed or lacks required fields.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The participant grant carried no auth token.
    #[error("Response carried no auth token")]
    MissingToken,

    /// The HTTP client could not be built.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// A freshly created meeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meeting {
    pub id: MeetingId,
    pub title: String,
}

/// A participant registered in a meeting, with its auth token.
#[derive(Debug)]
pub struct ParticipantGrant {
    pub id: Option<ParticipantId>,
    pub auth_token: SecretString,
}

impl ParticipantGrant {
    /// Turn the grant into the credential a session is started with.
    #[must_use]
    pub fn into_credential(self, preset: Preset) -> SessionCredential {
        SessionCredential::new(self.auth_token, preset)
    }
}

/// Opaque credential for one session.
#[derive(Debug)]
pub struct SessionCredential {
    auth_token: SecretString,
    preset: Preset,
}

impl SessionCredential {
    #[must_use]
    pub fn new(auth_token: SecretString, preset: Preset) -> Self {
        Self { auth_token, preset }
    }

    /// Preset the credential was minted with. A hint only, the session
    /// command decides the role.
    #[must_use]
    pub fn preset(&self) -> Preset {
        self.preset
    }

    #[must_use]
    pub fn auth_token(&self) -> &SecretString {
        &self.auth_token
    }

    /// Whether the token is non-blank.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        !self.auth_token.expose_secret().trim().is_empty()
    }
}

/// Source of meetings and participant credentials.
#[async_trait]
pub trait CredentialService: Send + Sync {
    /// Create a meeting with the given title.
    async fn create_meeting(&self, title: &str) -> Result<Meeting, CredentialError>;

    /// Register a participant and mint its auth token.
    async fn add_participant(
        &self,
        meeting_id: &MeetingId,
        name: &str,
        preset: Preset,
    ) -> Result<ParticipantGrant, CredentialError>;
}

#[derive(Serialize)]
struct CreateMeetingRequest<'a> {
    title: &'a str,
}

#[derive(Deserialize)]
struct CreateMeetingResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddParticipantRequest<'a> {
    meeting_id: &'a str,
    name: &'a str,
    preset_name: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddParticipantResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    auth_token: Option<SecretString>,
}

/// HTTP implementation of [`CredentialService`].
#[derive(Debug, Clone)]
pub struct CredentialClient {
    api_url: String,
    http_client: reqwest::Client,
}

impl CredentialClient {
    /// Create a client for the service at `api_url`.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::Configuration` if the HTTP client cannot be
    /// built.
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self, CredentialError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| {
                CredentialError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;

        let api_url = api_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            api_url,
            http_client,
        })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, CredentialError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}{path}", self.api_url);

        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                debug!(target: "broadcast.credentials", error = %e, url = %url, "HTTP request failed");
                CredentialError::Http(e.to_string())
            })?;

        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| {
                warn!(target: "broadcast.credentials", error = %e, url = %url, "Failed to parse response");
                CredentialError::InvalidResponse(e.to_string())
            })
        } else if status.is_client_error() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            warn!(
                target: "broadcast.credentials",
                status = %status,
                url = %url,
                "Credential service rejected the request"
            );
            trace!(target: "broadcast.credentials", body = %body, "Rejection response body");
            Err(CredentialError::Rejected(format!("Status {status}")))
        } else {
            warn!(
                target: "broadcast.credentials",
                status = %status,
                url = %url,
                "Credential service returned an error"
            );
            Err(CredentialError::Http(format!("Unexpected status: {status}")))
        }
    }
}

#[async_trait]
impl CredentialService for CredentialClient {
    #[instrument(skip_all)]
    async fn create_meeting(&self, title: &str) -> Result<Meeting, CredentialError> {
        let response: CreateMeetingResponse = self
            .post_json("/api/meeting/create", &CreateMeetingRequest { title })
            .await?;

        let id = response
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| CredentialError::InvalidResponse("meeting id missing".to_string()))?;

        debug!(target: "broadcast.credentials", meeting_id = %id, "Meeting created");

        Ok(Meeting {
            id: MeetingId::new(id),
            title: response.title.unwrap_or_else(|| title.to_string()),
        })
    }

    #[instrument(skip_all, fields(meeting_id = %meeting_id, preset = preset.as_str()))]
    async fn add_participant(
        &self,
        meeting_id: &MeetingId,
        name: &str,
        preset: Preset,
    ) -> Result<ParticipantGrant, CredentialError> {
        let request = AddParticipantRequest {
            meeting_id: meeting_id.as_str(),
            name,
            preset_name: preset.as_str(),
        };
        let response: AddParticipantResponse = self
            .post_json("/api/participant/add", &request)
            .await?;

        let auth_token = response
            .auth_token
            .filter(|token| !token.expose_secret().trim().is_empty())
            .ok_or(CredentialError::MissingToken)?;

        debug!(
            target: "broadcast.credentials",
            participant_id = ?response.id,
            "Participant credential minted"
        );

        Ok(ParticipantGrant {
            id: response.id.map(ParticipantId::new),
            auth_token,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> CredentialClient {
        CredentialClient::new(server.uri(), Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn test_blank_credential_is_unusable() {
        let cred = SessionCredential::new(SecretString::from("  "), Preset::Viewer);
        assert!(!cred.is_usable());

        let cred = SessionCredential::new(SecretString::from("tok"), Preset::Viewer);
        assert!(cred.is_usable());
        assert!(!format!("{cred:?}").contains("tok\""));
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = CredentialClient::new("http://api.local/", DEFAULT_HTTP_TIMEOUT).unwrap();
        assert_eq!(client.api_url(), "http://api.local");
    }

    #[tokio::test]
    async fn test_create_meeting_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/meeting/create"))
            .and(body_json(serde_json::json!({ "title": "Launch" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "m-42",
                "title": "Launch"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let meeting = client(&server).create_meeting("Launch").await.unwrap();
        assert_eq!(meeting.id.as_str(), "m-42");
        assert_eq!(meeting.title, "Launch");
    }

    #[tokio::test]
    async fn test_create_meeting_without_id_is_invalid() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/meeting/create"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "title": "x" })),
            )
            .mount(&server)
            .await;

        let err = client(&server).create_meeting("x").await.unwrap_err();
        assert!(matches!(err, CredentialError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_add_participant_sends_preset() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/participant/add"))
            .and(body_json(serde_json::json!({
                "meetingId": "m-42",
                "name": "Ada",
                "presetName": "viewer-preset"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "p-1",
                "authToken": "token-abc"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let grant = client(&server)
            .add_participant(&MeetingId::from("m-42"), "Ada", Preset::Viewer)
            .await
            .unwrap();

        assert_eq!(grant.id, Some(ParticipantId::from("p-1")));
        assert_eq!(grant.auth_token.expose_secret(), "token-abc");

        let credential = grant.into_credential(Preset::Viewer);
        assert!(credential.is_usable());
        assert_eq!(credential.preset(), Preset::Viewer);
    }

    #[tokio::test]
    async fn test_add_participant_missing_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/participant/add"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "p-1" })),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .add_participant(&MeetingId::from("m-1"), "Ada", Preset::Host)
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialError::MissingToken));
    }

    #[tokio::test]
    async fn test_client_error_is_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/participant/add"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such meeting"))
            .mount(&server)
            .await;

        let err = client(&server)
            .add_participant(&MeetingId::from("missing"), "Ada", Preset::Viewer)
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialError::Rejected(ref msg) if msg.contains("404")));
    }

    #[tokio::test]
    async fn test_server_error_is_http_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/meeting/create"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client(&server).create_meeting("x").await.unwrap_err();
        assert!(matches!(err, CredentialError::Http(_)));
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let client = CredentialClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let err = client.create_meeting("x").await.unwrap_err();
        assert!(matches!(err, CredentialError::Http(_)));
    }
}
