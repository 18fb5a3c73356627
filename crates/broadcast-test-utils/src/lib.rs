//! # Broadcast Test Utilities
//!
//! Mocks and fixtures for testing the broadcast session library without a
//! real media transport or credential service.
//!
//! ## Modules
//!
//! - `mock_transport` - Scriptable transport and session handle
//! - `mock_credentials` - Credential service mock with call recording
//! - `render` - Render surface that records frames
//! - `fixtures` - Participants and credentials
//!
//! ## Usage
//!
//! ```rust,ignore
//! use broadcast_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let transport = MockTransport::new();
//!     let surface = Arc::new(RecordingSurface::new());
//!     let (controller, _task) = SessionController::spawn(
//!         Arc::new(transport.clone()),
//!         surface.clone(),
//!         ControllerOptions::default(),
//!         CancellationToken::new(),
//!     );
//!
//!     controller.start(test_credential(Preset::Host)).await.unwrap();
//!     transport.emit_room_joined();
//!     transport.add_participant(TestParticipant::viewer("alice"));
//!
//!     let snapshot = wait_for_snapshot(&controller, |s| s.viewer_count == 1).await;
//! }
//! ```

pub mod fixtures;
pub mod mock_credentials;
pub mod mock_transport;
pub mod render;

pub use fixtures::*;
pub use mock_credentials::*;
pub use mock_transport::*;
pub use render::*;

use broadcast_session::session::{SessionControllerHandle, SessionSnapshot};
use std::time::Duration;

/// Wait until the controller publishes a snapshot matching `predicate`.
///
/// # Panics
///
/// Panics after five seconds (of tokio time) without a match.
pub async fn wait_for_snapshot(
    controller: &SessionControllerHandle,
    predicate: impl FnMut(&SessionSnapshot) -> bool,
) -> SessionSnapshot {
    let mut rx = controller.subscribe();
    let snapshot = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
        .await
        .expect("timed out waiting for session snapshot")
        .expect("session controller stopped");
    snapshot.clone()
}
