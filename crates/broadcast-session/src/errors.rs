//! Broadcast session error types.
//!
//! Errors raised by `start`/`join` are surfaced to the UI through
//! [`BroadcastError::user_message`]; internal details stay in the logs.
//! Leave and teardown paths never return these errors, they only log them.

use crate::credentials::CredentialError;
use crate::transport::TransportError;
use thiserror::Error;

/// Broadcast session error type.
#[derive(Debug, Error)]
pub enum BroadcastError {
    /// The credential service could not create the meeting or mint a token.
    #[error("Credential fetch failed: {0}")]
    CredentialFetchFailed(String),

    /// The credential carries no usable auth token.
    #[error("Invalid credential: missing or empty auth token")]
    InvalidCredential,

    /// The transport refused to hand out a session handle.
    #[error("Transport init failed: {0}")]
    TransportInitFailed(String),

    /// The transport join call failed.
    #[error("Transport join failed: {0}")]
    TransportJoinFailed(String),

    /// The transport leave call failed. Logged on leave/teardown, never returned
    /// to callers of `leave()`.
    #[error("Transport leave failed: {0}")]
    TransportLeaveFailed(String),

    /// A session is already joining or joined.
    #[error("A session is already joining or joined")]
    AlreadyJoiningOrJoined,

    /// Leave or teardown arrived while the transport init/join was pending.
    #[error("Session left before the join completed")]
    JoinAborted,

    /// User input rejected before any network call.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Controller mailbox or reply channel failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BroadcastError {
    /// Returns a client-safe error message (no internal details).
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            BroadcastError::CredentialFetchFailed(_) => {
                "Could not reach the broadcast service".to_string()
            }
            BroadcastError::InvalidCredential => "Received an invalid access token".to_string(),
            BroadcastError::TransportInitFailed(_) => {
                "Could not connect to the media service".to_string()
            }
            BroadcastError::TransportJoinFailed(_) => "Could not join the room".to_string(),
            BroadcastError::TransportLeaveFailed(_) => "Could not leave the room".to_string(),
            BroadcastError::AlreadyJoiningOrJoined => {
                "You are already in a broadcast".to_string()
            }
            BroadcastError::JoinAborted => "The broadcast was left before it started".to_string(),
            BroadcastError::Validation(msg) => msg.clone(),
            BroadcastError::Internal(_) => "An internal error occurred".to_string(),
        }
    }
}

impl From<CredentialError> for BroadcastError {
    fn from(err: CredentialError) -> Self {
        BroadcastError::CredentialFetchFailed(err.to_string())
    }
}

/// Convert a transport error raised during `init`.
pub(crate) fn init_failed(err: &TransportError) -> BroadcastError {
    BroadcastError::TransportInitFailed(err.to_string())
}

/// Convert a transport error raised during `join`.
pub(crate) fn join_failed(err: &TransportError) -> BroadcastError {
    BroadcastError::TransportJoinFailed(err.to_string())
}
