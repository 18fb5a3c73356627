//! Render surface that records every frame.

use broadcast_session::render::RenderSurface;
use broadcast_session::session::ParticipantView;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;

/// How long `wait_for_frames` waits before failing the test.
const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

/// Records every list the controller assigns.
#[derive(Debug)]
pub struct RecordingSurface {
    frames: Mutex<Vec<Vec<ParticipantView>>>,
    count: watch::Sender<usize>,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSurface {
    #[must_use]
    pub fn new() -> Self {
        let (count, _) = watch::channel(0);
        Self {
            frames: Mutex::new(Vec::new()),
            count,
        }
    }

    /// Every frame so far.
    #[must_use]
    pub fn frames(&self) -> Vec<Vec<ParticipantView>> {
        self.frames.lock().unwrap().clone()
    }

    /// The most recent frame.
    #[must_use]
    pub fn last_frame(&self) -> Option<Vec<ParticipantView>> {
        self.frames.lock().unwrap().last().cloned()
    }

    /// Ids of the most recent frame.
    #[must_use]
    pub fn last_frame_ids(&self) -> Option<Vec<String>> {
        self.last_frame()
            .map(|frame| frame.iter().map(|p| p.id.as_str().to_string()).collect())
    }

    /// Wait until at least `n` frames were recorded.
    ///
    /// # Panics
    ///
    /// Panics if that takes longer than five seconds (of tokio time).
    pub async fn wait_for_frames(&self, n: usize) -> Vec<Vec<ParticipantView>> {
        let mut rx = self.count.subscribe();
        tokio::time::timeout(FRAME_TIMEOUT, rx.wait_for(|count| *count >= n))
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for {n} frames"))
            .expect("frame counter closed");
        self.frames()
    }
}

impl RenderSurface for RecordingSurface {
    fn show(&self, participants: Vec<ParticipantView>) {
        let mut frames = self.frames.lock().unwrap();
        frames.push(participants);
        self.count.send_replace(frames.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broadcast_session::transport::ParticipantRecord;

    #[tokio::test]
    async fn test_records_frames_in_order() {
        let surface = RecordingSurface::new();
        let host = ParticipantView::from_record(&ParticipantRecord::new("host"));

        surface.show(vec![host]);
        surface.show(Vec::new());

        let frames = surface.wait_for_frames(2).await;
        assert_eq!(frames.len(), 2);
        assert_eq!(surface.last_frame(), Some(Vec::new()));
    }
}
