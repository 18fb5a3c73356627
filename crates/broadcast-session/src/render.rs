//! Render surface boundary.
//!
//! The controller is constructed with a [`RenderSurface`] and only ever
//! assigns to it. An empty list means "nothing to show" (the viewer waiting
//! state, or a session that has ended).

use crate::session::roster::ParticipantView;
use tokio::sync::mpsc;
use tracing::debug;

/// Primary video surface.
pub trait RenderSurface: Send + Sync + 'static {
    /// Replace the participants shown on the surface.
    fn show(&self, participants: Vec<ParticipantView>);
}

/// Surface that forwards every assignment over a channel, for UI layers that
/// render on their own task.
#[derive(Debug, Clone)]
pub struct ChannelSurface {
    sender: mpsc::UnboundedSender<Vec<ParticipantView>>,
}

impl ChannelSurface {
    /// Create a surface and the receiver the UI drains.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Vec<ParticipantView>>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl RenderSurface for ChannelSurface {
    fn show(&self, participants: Vec<ParticipantView>) {
        if self.sender.send(participants).is_err() {
            debug!(
                target: "broadcast.render",
                "Render receiver dropped, discarding frame"
            );
        }
    }
}

/// Surface that discards every assignment.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSurface;

impl RenderSurface for NullSurface {
    fn show(&self, _participants: Vec<ParticipantView>) {}
}
