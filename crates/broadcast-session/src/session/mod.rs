//! Session orchestration.
//!
//! - [`join_guard`]: join/leave gate
//! - [`role`]: host/viewer resolution and media defaults
//! - [`roster`]: raw participant records to display-ready views
//! - [`view`]: featured participant selection
//! - [`controller`]: the actor tying them to a transport and a render surface

pub mod controller;
pub mod join_guard;
pub mod messages;
pub mod role;
pub mod roster;
pub mod view;

pub use controller::{ControllerOptions, SessionController, SessionControllerHandle};
pub use join_guard::{JoinGuard, LifecycleState};
pub use messages::{ControllerState, EndReason, SessionSnapshot};
pub use role::{resolve_role, Preset, Role};
pub use roster::{project, Activity, ParticipantView, Roster, ANONYMOUS_NAME};
pub use view::{compose, Featured};
