//! Mock media transport.
//!
//! `MockTransport` is cheap to clone; every clone and every session handle it
//! hands out share one state, so a test keeps a clone to drive the roster and
//! inspect the calls the controller made.
//!
//! # Example
//!
//! ```rust,ignore
//! use broadcast_test_utils::{MockTransport, TestParticipant};
//!
//! let transport = MockTransport::builder().local(TestParticipant::new("Host")).build();
//!
//! // ... start a session through a controller built with `transport.clone()`
//!
//! transport.emit_room_joined();
//! transport.add_participant(TestParticipant::new("Viewer"));
//! assert_eq!(transport.join_calls(), 1);
//! ```

use crate::fixtures::TestParticipant;
use async_trait::async_trait;
use broadcast_session::transport::{
    EventReceiver, MediaDefaults, ParticipantRecord, SessionHandle, Transport, TransportError,
    TransportEvent,
};
use common::secret::{ExposeSecret, SecretString};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};

#[derive(Debug)]
struct State {
    local: ParticipantRecord,
    participants: Vec<ParticipantRecord>,
    subscribers: Vec<mpsc::UnboundedSender<TransportEvent>>,
    init_calls: usize,
    join_calls: usize,
    leave_calls: usize,
    last_defaults: Option<MediaDefaults>,
    last_auth_token: Option<String>,
    init_error: Option<TransportError>,
    join_error: Option<TransportError>,
    leave_error: Option<TransportError>,
    room_joined_on_join: bool,
    room_left_on_leave: bool,
    init_gate: Option<Arc<Notify>>,
    join_gate: Option<Arc<Notify>>,
}

impl State {
    fn emit(&mut self, event: &TransportEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// Mock transport for controller tests.
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl MockTransport {
    /// Create a new MockTransport builder.
    #[must_use]
    pub fn builder() -> MockTransportBuilder {
        MockTransportBuilder::default()
    }

    /// A transport that accepts every call and emits events only when told.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("mock transport state poisoned")
    }

    // ------------------------------------------------------------------
    // Driving events
    // ------------------------------------------------------------------

    /// Send a raw event to every live subscriber.
    pub fn emit(&self, event: TransportEvent) {
        self.lock().emit(&event);
    }

    /// Confirm the room join.
    pub fn emit_room_joined(&self) {
        self.emit(TransportEvent::RoomJoined);
    }

    /// End the session from the transport side.
    pub fn emit_room_left(&self) {
        self.emit(TransportEvent::RoomLeft);
    }

    /// Add a remote participant and announce it.
    pub fn add_participant(&self, participant: impl Into<ParticipantRecord>) {
        let record = participant.into();
        let mut state = self.lock();
        state.participants.push(record.clone());
        state.emit(&TransportEvent::ParticipantJoined(record));
    }

    /// Remove a remote participant by id and announce it. Unknown ids are
    /// still announced.
    pub fn remove_participant(&self, id: &str) {
        let mut state = self.lock();
        let position = state.participants.iter().position(|p| p.id.as_str() == id);
        let record = match position {
            Some(index) => state.participants.remove(index),
            None => ParticipantRecord::new(id),
        };
        state.emit(&TransportEvent::ParticipantLeft(record));
    }

    /// Replace the roster without announcing anything.
    pub fn set_participants(&self, participants: Vec<ParticipantRecord>) {
        self.lock().participants = participants;
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    #[must_use]
    pub fn init_calls(&self) -> usize {
        self.lock().init_calls
    }

    #[must_use]
    pub fn join_calls(&self) -> usize {
        self.lock().join_calls
    }

    #[must_use]
    pub fn leave_calls(&self) -> usize {
        self.lock().leave_calls
    }

    /// Media defaults passed to the last `init`.
    #[must_use]
    pub fn last_media_defaults(&self) -> Option<MediaDefaults> {
        self.lock().last_defaults
    }

    /// Auth token passed to the last `init`.
    #[must_use]
    pub fn last_auth_token(&self) -> Option<String> {
        self.lock().last_auth_token.clone()
    }

    /// Wait until `init` has been entered `count` times.
    ///
    /// # Panics
    ///
    /// Panics after 5 seconds.
    pub async fn wait_for_init_calls(&self, count: usize) {
        self.wait_until(|state| state.init_calls >= count).await;
    }

    /// Wait until `join` has been entered `count` times.
    ///
    /// # Panics
    ///
    /// Panics after 5 seconds.
    pub async fn wait_for_join_calls(&self, count: usize) {
        self.wait_until(|state| state.join_calls >= count).await;
    }

    async fn wait_until(&self, predicate: impl Fn(&State) -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !predicate(&self.lock()) {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("timed out waiting for transport call");
    }

    /// Number of subscribers whose receiver is still alive.
    #[must_use]
    pub fn live_subscribers(&self) -> usize {
        let mut state = self.lock();
        state.subscribers.retain(|tx| !tx.is_closed());
        state.subscribers.len()
    }

    // ------------------------------------------------------------------
    // Failure toggles
    // ------------------------------------------------------------------

    /// Make the next `init` calls fail (`None` to recover).
    pub fn set_init_error(&self, error: Option<TransportError>) {
        self.lock().init_error = error;
    }

    /// Make the next `join` calls fail (`None` to recover).
    pub fn set_join_error(&self, error: Option<TransportError>) {
        self.lock().join_error = error;
    }

    /// Let one held `init` complete.
    ///
    /// # Panics
    ///
    /// Panics if the transport was not built with `hold_init`.
    pub fn release_init(&self) {
        self.lock()
            .init_gate
            .as_ref()
            .expect("init is not held")
            .notify_one();
    }

    /// Let one held `join` complete.
    ///
    /// # Panics
    ///
    /// Panics if the transport was not built with `hold_join`.
    pub fn release_join(&self) {
        self.lock()
            .join_gate
            .as_ref()
            .expect("join is not held")
            .notify_one();
    }

    /// Make the next `leave` calls fail (`None` to recover).
    pub fn set_leave_error(&self, error: Option<TransportError>) {
        self.lock().leave_error = error;
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn init(
        &self,
        auth_token: &SecretString,
        defaults: MediaDefaults,
    ) -> Result<Box<dyn SessionHandle>, TransportError> {
        let gate = {
            let mut state = self.lock();
            state.init_calls += 1;
            state.last_defaults = Some(defaults);
            state.last_auth_token = Some(auth_token.expose_secret().to_string());
            state.init_gate.clone()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let state = self.lock();
        if let Some(error) = state.init_error.clone() {
            return Err(error);
        }

        Ok(Box::new(MockSessionHandle {
            state: Arc::clone(&self.state),
        }))
    }
}

/// Session handle handed out by [`MockTransport`].
#[derive(Debug)]
pub struct MockSessionHandle {
    state: Arc<Mutex<State>>,
}

impl MockSessionHandle {
    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("mock transport state poisoned")
    }
}

#[async_trait]
impl SessionHandle for MockSessionHandle {
    fn local_participant(&self) -> ParticipantRecord {
        self.lock().local.clone()
    }

    fn joined_participants(&self) -> Vec<ParticipantRecord> {
        self.lock().participants.clone()
    }

    fn subscribe(&self) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().subscribers.push(tx);
        rx
    }

    async fn join(&self) -> Result<(), TransportError> {
        let gate = {
            let mut state = self.lock();
            state.join_calls += 1;
            state.join_gate.clone()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut state = self.lock();
        if let Some(error) = state.join_error.clone() {
            return Err(error);
        }
        if state.room_joined_on_join {
            state.emit(&TransportEvent::RoomJoined);
        }
        Ok(())
    }

    async fn leave(&self) -> Result<(), TransportError> {
        let mut state = self.lock();
        state.leave_calls += 1;

        if let Some(error) = state.leave_error.clone() {
            return Err(error);
        }
        if state.room_left_on_leave {
            state.emit(&TransportEvent::RoomLeft);
        }
        Ok(())
    }
}

/// Builder for MockTransport configuration.
#[derive(Debug)]
pub struct MockTransportBuilder {
    local: ParticipantRecord,
    participants: Vec<ParticipantRecord>,
    init_error: Option<TransportError>,
    join_error: Option<TransportError>,
    leave_error: Option<TransportError>,
    room_joined_on_join: bool,
    room_left_on_leave: bool,
    hold_init: bool,
    hold_join: bool,
}

impl Default for MockTransportBuilder {
    fn default() -> Self {
        Self {
            local: TestParticipant::new("Local User").with_id("local").into(),
            participants: Vec::new(),
            init_error: None,
            join_error: None,
            leave_error: None,
            room_joined_on_join: false,
            room_left_on_leave: true,
            hold_init: false,
            hold_join: false,
        }
    }
}

impl MockTransportBuilder {
    /// Set the local identity.
    #[must_use]
    pub fn local(mut self, participant: impl Into<ParticipantRecord>) -> Self {
        self.local = participant.into();
        self
    }

    /// Seed the remote roster.
    #[must_use]
    pub fn participants(mut self, participants: Vec<ParticipantRecord>) -> Self {
        self.participants = participants;
        self
    }

    /// Fail every `init`.
    #[must_use]
    pub fn fail_init(mut self, error: TransportError) -> Self {
        self.init_error = Some(error);
        self
    }

    /// Fail every `join`.
    #[must_use]
    pub fn fail_join(mut self, error: TransportError) -> Self {
        self.join_error = Some(error);
        self
    }

    /// Fail every `leave`.
    #[must_use]
    pub fn fail_leave(mut self, error: TransportError) -> Self {
        self.leave_error = Some(error);
        self
    }

    /// Emit `RoomJoined` from inside a successful `join`.
    #[must_use]
    pub fn auto_room_joined(mut self) -> Self {
        self.room_joined_on_join = true;
        self
    }

    /// Do not emit `RoomLeft` from `leave`.
    #[must_use]
    pub fn quiet_leave(mut self) -> Self {
        self.room_left_on_leave = false;
        self
    }

    /// Park every `init` until [`MockTransport::release_init`].
    #[must_use]
    pub fn hold_init(mut self) -> Self {
        self.hold_init = true;
        self
    }

    /// Park every `join` until [`MockTransport::release_join`].
    #[must_use]
    pub fn hold_join(mut self) -> Self {
        self.hold_join = true;
        self
    }

    /// Build the MockTransport.
    #[must_use]
    pub fn build(self) -> MockTransport {
        MockTransport {
            state: Arc::new(Mutex::new(State {
                local: self.local,
                participants: self.participants,
                subscribers: Vec::new(),
                init_calls: 0,
                join_calls: 0,
                leave_calls: 0,
                last_defaults: None,
                last_auth_token: None,
                init_error: self.init_error,
                join_error: self.join_error,
                leave_error: self.leave_error,
                room_joined_on_join: self.room_joined_on_join,
                room_left_on_leave: self.room_left_on_leave,
                init_gate: self.hold_init.then(|| Arc::new(Notify::new())),
                join_gate: self.hold_join.then(|| Arc::new(Notify::new())),
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> MediaDefaults {
        MediaDefaults {
            audio: false,
            video: false,
        }
    }

    #[tokio::test]
    async fn test_init_records_call() {
        let transport = MockTransport::new();
        let handle = transport
            .init(&SecretString::from("tok-1"), defaults())
            .await
            .unwrap();

        assert_eq!(transport.init_calls(), 1);
        assert_eq!(transport.last_auth_token().as_deref(), Some("tok-1"));
        assert_eq!(transport.last_media_defaults(), Some(defaults()));
        assert_eq!(handle.local_participant().id.as_str(), "local");
    }

    #[tokio::test]
    async fn test_roster_changes_are_announced() {
        let transport = MockTransport::new();
        let handle = transport
            .init(&SecretString::from("tok"), defaults())
            .await
            .unwrap();
        let mut events = handle.subscribe();

        transport.add_participant(TestParticipant::new("Ada").with_id("a"));
        transport.remove_participant("a");

        assert!(matches!(
            events.recv().await,
            Some(TransportEvent::ParticipantJoined(r)) if r.id.as_str() == "a"
        ));
        assert!(matches!(
            events.recv().await,
            Some(TransportEvent::ParticipantLeft(r)) if r.id.as_str() == "a"
        ));
        assert!(handle.joined_participants().is_empty());
    }

    #[tokio::test]
    async fn test_failure_toggles() {
        let transport = MockTransport::builder()
            .fail_join(TransportError::Rejected("full".to_string()))
            .build();
        let handle = transport
            .init(&SecretString::from("tok"), defaults())
            .await
            .unwrap();

        assert!(handle.join().await.is_err());
        transport.set_join_error(None);
        assert!(handle.join().await.is_ok());
        assert_eq!(transport.join_calls(), 2);

        transport.set_init_error(Some(TransportError::Unavailable("down".to_string())));
        assert!(transport
            .init(&SecretString::from("tok"), defaults())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_dropped_subscribers_are_pruned() {
        let transport = MockTransport::builder().auto_room_joined().build();
        let handle = transport
            .init(&SecretString::from("tok"), defaults())
            .await
            .unwrap();

        let mut kept = handle.subscribe();
        drop(handle.subscribe());
        handle.join().await.unwrap();

        assert_eq!(kept.recv().await, Some(TransportEvent::RoomJoined));
        assert_eq!(transport.live_subscribers(), 1);
    }

    #[tokio::test]
    async fn test_held_join_waits_for_release() {
        let transport = MockTransport::builder().hold_join().build();
        let handle = transport
            .init(&SecretString::from("tok"), defaults())
            .await
            .unwrap();

        let join = tokio::spawn(async move { handle.join().await });
        transport.wait_for_join_calls(1).await;
        assert!(!join.is_finished());

        transport.release_join();
        join.await.unwrap().unwrap();
    }
}
