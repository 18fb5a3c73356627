//! Broadcast Session Library
//!
//! Client-side orchestration for one-to-many live broadcasts: one host
//! publishes audio and video, any number of viewers watch.
//!
//! - Guards the media transport against duplicate join and leave calls
//! - Decides host or viewer role once per session
//! - Projects the transport's raw participant list into a display roster
//! - Picks the participant shown on the primary video surface
//! - Fetches meeting and participant credentials over HTTP
//!
//! # Architecture
//!
//! ```text
//! BroadcastClient (start/join flows, input validation)
//! ├── CredentialService (meeting + auth token)
//! └── SessionController (actor, one session at a time)
//!     ├── JoinGuard
//!     ├── Transport -> SessionHandle -> events
//!     └── RenderSurface (featured participant, pushed after a short delay)
//! ```
//!
//! The media transport and the render surface are traits; this crate ships no
//! media stack of its own.
//!
//! # Modules
//!
//! - [`broadcast`] - Start/join facade
//! - [`config`] - Configuration from environment
//! - [`credentials`] - Credential service client
//! - [`errors`] - Error types with client-safe messages
//! - [`observability`] - Metrics
//! - [`render`] - Render surface boundary
//! - [`session`] - Join guard, role, roster, view and the controller actor
//! - [`transport`] - Media transport boundary

pub mod broadcast;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod observability;
pub mod render;
pub mod session;
pub mod transport;

pub use broadcast::{BroadcastAction, BroadcastClient, BroadcastInfo};
pub use config::Config;
pub use errors::BroadcastError;
