//! `SessionController`: the actor that owns one broadcast session at a time.
//!
//! The controller:
//! - Gates transport join/leave through a [`JoinGuard`]
//! - Resolves the role once per session from the command that started it
//! - Re-projects the roster and re-composes the featured participant on every
//!   roster event
//! - Pushes the featured participant to the [`RenderSurface`] after a short
//!   delay, coalescing bursts
//! - Publishes a [`SessionSnapshot`] on a watch channel after every change
//!
//! # Teardown
//!
//! Cancelling the handle's token, or dropping every handle, behaves like
//! `leave()` and then stops the task.
//!
//! Transport `init` and `join` are awaited while the task keeps serving
//! cancellation and the mailbox, so a `leave()` or teardown issued while
//! either is pending abandons the attempt instead of queueing behind it.

use super::join_guard::JoinGuard;
use super::messages::{ControllerState, EndReason, SessionMessage, SessionSnapshot};
use super::role::{resolve_role, Role};
use super::roster::{project, ParticipantView, Roster};
use super::view::{compose, Featured};
use crate::config::{Config, DEFAULT_MAILBOX_SIZE, DEFAULT_RENDER_DELAY_MS};
use crate::credentials::SessionCredential;
use crate::errors::{init_failed, join_failed, BroadcastError};
use crate::observability::metrics;
use crate::render::RenderSurface;
use crate::transport::{EventReceiver, SessionHandle, Transport, TransportEvent};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Why a pending transport call was abandoned.
enum Interrupt {
    Leave(oneshot::Sender<()>),
    Teardown,
}

/// Tunables for the controller task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Delay between a recomputation and the render push.
    pub render_delay: Duration,
    /// Mailbox capacity.
    pub mailbox_size: usize,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            render_delay: Duration::from_millis(DEFAULT_RENDER_DELAY_MS),
            mailbox_size: DEFAULT_MAILBOX_SIZE,
        }
    }
}

impl From<&Config> for ControllerOptions {
    fn from(config: &Config) -> Self {
        Self {
            render_delay: config.render_delay,
            mailbox_size: config.mailbox_size,
        }
    }
}

/// Handle to a `SessionController`.
#[derive(Clone)]
pub struct SessionControllerHandle {
    sender: mpsc::Sender<SessionMessage>,
    cancel_token: CancellationToken,
    snapshot: watch::Receiver<SessionSnapshot>,
}

impl SessionControllerHandle {
    /// Start a broadcast as its host.
    ///
    /// # Errors
    ///
    /// `InvalidCredential`, `AlreadyJoiningOrJoined`, `TransportInitFailed`,
    /// `TransportJoinFailed`, `JoinAborted` if a leave or teardown arrived
    /// first, or `Internal` if the controller is gone.
    pub async fn start(&self, credential: SessionCredential) -> Result<(), BroadcastError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SessionMessage::Start {
                credential,
                respond_to: tx,
            })
            .await
            .map_err(|e| BroadcastError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| BroadcastError::Internal(format!("response receive failed: {e}")))?
    }

    /// Join an existing broadcast as a viewer.
    ///
    /// # Errors
    ///
    /// Same as [`SessionControllerHandle::start`].
    pub async fn join(&self, credential: SessionCredential) -> Result<(), BroadcastError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SessionMessage::Join {
                credential,
                respond_to: tx,
            })
            .await
            .map_err(|e| BroadcastError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| BroadcastError::Internal(format!("response receive failed: {e}")))?
    }

    /// Leave the current session.
    ///
    /// Idempotent and infallible from the caller's side: transport errors are
    /// logged, and a stopped controller has nothing left to leave.
    pub async fn leave(&self) {
        let (tx, rx) = oneshot::channel();
        if let Err(e) = self
            .sender
            .send(SessionMessage::Leave { respond_to: tx })
            .await
        {
            debug!(
                target: "broadcast.session.controller",
                error = %e,
                "Leave sent to stopped controller"
            );
            return;
        }

        if rx.await.is_err() {
            debug!(
                target: "broadcast.session.controller",
                "Controller stopped before acknowledging leave"
            );
        }
    }

    /// Latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver that is notified on every snapshot change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    /// Tear the controller down. Leaves any live session first.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Check if the controller is cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

/// The session controller actor.
pub struct SessionController {
    receiver: mpsc::Receiver<SessionMessage>,
    cancel_token: CancellationToken,
    transport: Arc<dyn Transport>,
    surface: Arc<dyn RenderSurface>,
    render_delay: Duration,
    snapshot_tx: watch::Sender<SessionSnapshot>,

    guard: JoinGuard,
    state: ControllerState,
    handle: Option<Box<dyn SessionHandle>>,
    events: Option<EventReceiver>,
    role: Option<Role>,
    local: Option<ParticipantView>,
    roster: Roster,
    featured: Option<Featured>,
    viewer_count: usize,
    started_at: Option<i64>,

    /// Deadline of the pending render push.
    render_at: Option<Instant>,
    /// Last list handed to the surface.
    rendered: Option<Vec<ParticipantView>>,
}

impl SessionController {
    /// Spawn the controller task.
    ///
    /// Returns a handle and the task join handle.
    pub fn spawn(
        transport: Arc<dyn Transport>,
        surface: Arc<dyn RenderSurface>,
        options: ControllerOptions,
        cancel_token: CancellationToken,
    ) -> (SessionControllerHandle, JoinHandle<()>) {
        let (controller, handle) = Self::new(transport, surface, options, cancel_token);
        let task_handle = tokio::spawn(controller.run());
        (handle, task_handle)
    }

    fn new(
        transport: Arc<dyn Transport>,
        surface: Arc<dyn RenderSurface>,
        options: ControllerOptions,
        cancel_token: CancellationToken,
    ) -> (Self, SessionControllerHandle) {
        let (sender, receiver) = mpsc::channel(options.mailbox_size.max(1));
        let (snapshot_tx, snapshot) = watch::channel(SessionSnapshot::default());

        let controller = Self {
            receiver,
            cancel_token: cancel_token.clone(),
            transport,
            surface,
            render_delay: options.render_delay,
            snapshot_tx,
            guard: JoinGuard::new(),
            state: ControllerState::NotStarted,
            handle: None,
            events: None,
            role: None,
            local: None,
            roster: Roster::empty(),
            featured: None,
            viewer_count: 0,
            started_at: None,
            render_at: None,
            rendered: None,
        };

        let handle = SessionControllerHandle {
            sender,
            cancel_token,
            snapshot,
        };

        (controller, handle)
    }

    #[instrument(skip_all, name = "broadcast.session.controller")]
    async fn run(mut self) {
        info!(target: "broadcast.session.controller", "SessionController started");

        loop {
            let render_at = self.render_at;

            tokio::select! {
                biased;

                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "broadcast.session.controller",
                        "SessionController received cancellation signal"
                    );
                    self.leave_session(EndReason::Teardown).await;
                    break;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => self.handle_message(message).await,
                        None => {
                            info!(
                                target: "broadcast.session.controller",
                                "SessionController channel closed, exiting"
                            );
                            self.leave_session(EndReason::Teardown).await;
                            break;
                        }
                    }
                }

                event = next_event(&mut self.events) => {
                    match event {
                        Some(event) => self.handle_event(event),
                        None => {
                            debug!(
                                target: "broadcast.session.controller",
                                "Transport event stream closed"
                            );
                            self.events = None;
                        }
                    }
                }

                () = render_due(render_at) => {
                    self.flush_render();
                }
            }
        }

        info!(
            target: "broadcast.session.controller",
            state = self.state.as_str(),
            "SessionController stopped"
        );
    }

    async fn handle_message(&mut self, message: SessionMessage) {
        match message {
            SessionMessage::Start {
                credential,
                respond_to,
            } => {
                let result = self.open_session(credential, true).await;
                let _ = respond_to.send(result);
            }

            SessionMessage::Join {
                credential,
                respond_to,
            } => {
                let result = self.open_session(credential, false).await;
                let _ = respond_to.send(result);
            }

            SessionMessage::Leave { respond_to } => {
                self.leave_session(EndReason::Requested).await;
                let _ = respond_to.send(());
            }
        }
    }

    /// Shared start/join path. `is_creator` selects the host role.
    async fn open_session(
        &mut self,
        credential: SessionCredential,
        is_creator: bool,
    ) -> Result<(), BroadcastError> {
        let role = resolve_role(credential.preset(), is_creator);

        if !credential.is_usable() {
            warn!(
                target: "broadcast.session.controller",
                role = role.as_str(),
                "Rejected credential without auth token"
            );
            metrics::record_session_attempt(role.as_str(), "rejected");
            return Err(BroadcastError::InvalidCredential);
        }

        if let Err(e) = self.guard.begin_join() {
            debug!(
                target: "broadcast.session.controller",
                role = role.as_str(),
                guard = self.guard.state().as_str(),
                "Session already in progress"
            );
            metrics::record_session_attempt(role.as_str(), "rejected");
            return Err(e);
        }

        let previous = self.state;
        let started = Instant::now();

        let transport = Arc::clone(&self.transport);
        let init = self
            .until_interrupted(transport.init(credential.auth_token(), role.media_defaults()))
            .await;
        let handle = match init {
            Ok(Ok(handle)) => handle,
            Ok(Err(e)) => {
                warn!(
                    target: "broadcast.session.controller",
                    role = role.as_str(),
                    error = %e,
                    "Transport init failed"
                );
                self.guard.abort_join();
                metrics::record_transport_error("init");
                metrics::record_session_attempt(role.as_str(), "error");
                return Err(init_failed(&e));
            }
            Err(interrupt) => return Err(self.abandon_join(role, None, interrupt).await),
        };

        self.clear_derived();
        self.role = Some(role);
        self.local = Some(ParticipantView::from_record(&handle.local_participant()));
        self.state = ControllerState::Starting;
        self.publish();

        // Subscribe first so the join's own roster events are not missed.
        let events = handle.subscribe();

        match self.until_interrupted(handle.join()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(
                    target: "broadcast.session.controller",
                    role = role.as_str(),
                    error = %e,
                    "Transport join failed"
                );
                self.guard.abort_join();
                drop(events);
                self.clear_derived();
                self.state = previous;
                self.publish();
                metrics::record_transport_error("join");
                metrics::record_session_attempt(role.as_str(), "error");
                return Err(join_failed(&e));
            }
            Err(interrupt) => {
                drop(events);
                return Err(self.abandon_join(role, Some(handle), interrupt).await);
            }
        }

        self.handle = Some(handle);
        self.events = Some(events);
        self.started_at = Some(chrono::Utc::now().timestamp());
        self.publish();

        metrics::record_session_attempt(role.as_str(), "success");
        metrics::record_join_duration(role.as_str(), started.elapsed());
        metrics::set_sessions_active(true);

        info!(
            target: "broadcast.session.controller",
            role = role.as_str(),
            local_id = %self.local.as_ref().map(|l| l.id.as_str()).unwrap_or_default(),
            "Session join issued"
        );

        Ok(())
    }

    /// Await a pending transport call while still serving cancellation and
    /// the mailbox. A `Leave` or teardown abandons the call; a second
    /// start/join is refused.
    async fn until_interrupted<F: Future>(&mut self, call: F) -> Result<F::Output, Interrupt> {
        tokio::pin!(call);

        loop {
            tokio::select! {
                biased;

                () = self.cancel_token.cancelled() => return Err(Interrupt::Teardown),

                msg = self.receiver.recv() => {
                    match msg {
                        Some(SessionMessage::Leave { respond_to }) => {
                            return Err(Interrupt::Leave(respond_to));
                        }
                        Some(
                            SessionMessage::Start { respond_to, .. }
                            | SessionMessage::Join { respond_to, .. },
                        ) => {
                            debug!(
                                target: "broadcast.session.controller",
                                "Session already in progress"
                            );
                            let _ = respond_to.send(Err(BroadcastError::AlreadyJoiningOrJoined));
                        }
                        None => return Err(Interrupt::Teardown),
                    }
                }

                output = &mut call => return Ok(output),
            }
        }
    }

    /// Give up a start/join whose transport call was interrupted. Whatever
    /// was acquired is left once, then the session ends.
    async fn abandon_join(
        &mut self,
        role: Role,
        handle: Option<Box<dyn SessionHandle>>,
        interrupt: Interrupt,
    ) -> BroadcastError {
        let reason = match &interrupt {
            Interrupt::Leave(_) => EndReason::Requested,
            Interrupt::Teardown => EndReason::Teardown,
        };

        info!(
            target: "broadcast.session.controller",
            role = role.as_str(),
            reason = reason.as_str(),
            joining = handle.is_some(),
            "Join abandoned"
        );
        metrics::record_session_attempt(role.as_str(), "aborted");

        self.handle = handle;
        self.leave_session(reason).await;

        if let Interrupt::Leave(respond_to) = interrupt {
            let _ = respond_to.send(());
        }
        BroadcastError::JoinAborted
    }

    fn handle_event(&mut self, event: TransportEvent) {
        let kind = event.kind();

        if !self.state.accepts_events() {
            debug!(
                target: "broadcast.session.controller",
                event = kind,
                state = self.state.as_str(),
                "Ignoring transport event outside a live session"
            );
            metrics::record_transport_event(kind, false);
            return;
        }
        metrics::record_transport_event(kind, true);

        match event {
            TransportEvent::RoomJoined => {
                if self.guard.mark_joined() {
                    self.state = ControllerState::Active;
                    info!(
                        target: "broadcast.session.controller",
                        role = self.role.map(|r| r.as_str()).unwrap_or_default(),
                        "Room joined"
                    );
                    self.recompute();
                } else {
                    debug!(
                        target: "broadcast.session.controller",
                        guard = self.guard.state().as_str(),
                        "Duplicate room joined notification"
                    );
                }
            }

            TransportEvent::RoomLeft => {
                if self.guard.begin_leave() {
                    info!(
                        target: "broadcast.session.controller",
                        "Room left by the transport"
                    );
                    // The transport already left; no leave call on the handle.
                    self.handle = None;
                    self.end_session(EndReason::RemoteLeft);
                }
            }

            TransportEvent::ParticipantJoined(record) | TransportEvent::ParticipantLeft(record) => {
                debug!(
                    target: "broadcast.session.controller",
                    event = kind,
                    participant_id = %record.id,
                    "Roster changed"
                );
                self.recompute();
            }
        }
    }

    /// Re-project the roster and re-compose the view from the handle's
    /// current participant list.
    fn recompute(&mut self) {
        let (Some(handle), Some(role), Some(local)) = (&self.handle, self.role, &self.local)
        else {
            return;
        };

        let roster = project(&handle.joined_participants());
        let featured = compose(role, local, &roster);

        self.viewer_count = match role {
            Role::Host => roster.len(),
            Role::Viewer => 0,
        };
        metrics::set_roster_size(role.as_str(), roster.len());

        self.roster = roster;
        self.featured = featured;
        self.schedule_render();
        self.publish();
    }

    fn schedule_render(&mut self) {
        let pending = self.render_list();
        if self.rendered.as_ref() == Some(&pending) {
            return;
        }
        // An already pending deadline is never pushed back.
        if self.render_at.is_none() {
            self.render_at = Some(Instant::now() + self.render_delay);
        }
    }

    fn flush_render(&mut self) {
        self.render_at = None;
        if !self.state.accepts_events() {
            return;
        }

        let list = self.render_list();
        if self.rendered.as_ref() == Some(&list) {
            return;
        }

        debug!(
            target: "broadcast.session.controller",
            participants = list.len(),
            "Pushing featured view to render surface"
        );
        self.surface.show(list.clone());
        self.rendered = Some(list);
    }

    fn render_list(&self) -> Vec<ParticipantView> {
        self.featured
            .as_ref()
            .map(Featured::to_render_list)
            .unwrap_or_default()
    }

    /// Leave the session if the guard allows it.
    async fn leave_session(&mut self, reason: EndReason) {
        if !self.guard.begin_leave() {
            debug!(
                target: "broadcast.session.controller",
                reason = reason.as_str(),
                guard = self.guard.state().as_str(),
                "No session to leave"
            );
            return;
        }

        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.leave().await {
                let err = BroadcastError::TransportLeaveFailed(e.to_string());
                warn!(
                    target: "broadcast.session.controller",
                    reason = reason.as_str(),
                    error = %err,
                    "Transport leave failed, discarding session anyway"
                );
                metrics::record_transport_error("leave");
            }
        }

        self.end_session(reason);
    }

    /// Drop the handle and every piece of derived state, then move to `Ended`.
    fn end_session(&mut self, reason: EndReason) {
        self.handle = None;
        self.events = None;
        self.render_at = None;

        if self.rendered.take().is_some_and(|list| !list.is_empty()) {
            self.surface.show(Vec::new());
        }

        self.clear_derived();
        self.state = ControllerState::Ended;
        self.publish();

        metrics::set_sessions_active(false);
        metrics::record_session_ended(reason.as_str());

        info!(
            target: "broadcast.session.controller",
            reason = reason.as_str(),
            "Session ended"
        );
    }

    fn clear_derived(&mut self) {
        self.role = None;
        self.local = None;
        self.roster = Roster::empty();
        self.featured = None;
        self.viewer_count = 0;
        self.started_at = None;
        self.render_at = None;
        self.rendered = None;
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(SessionSnapshot {
            state: self.state,
            role: self.role,
            local: self.local.clone(),
            roster: self.roster.clone(),
            featured: self.featured.clone(),
            viewer_count: self.viewer_count,
            started_at: self.started_at,
        });
    }
}

async fn next_event(events: &mut Option<EventReceiver>) -> Option<TransportEvent> {
    match events {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}

async fn render_due(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
