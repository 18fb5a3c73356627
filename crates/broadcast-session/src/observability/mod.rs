//! Observability for the broadcast session library.
//!
//! The library only records metrics through the `metrics` facade and emits
//! `tracing` events; installing a recorder or subscriber is the embedding
//! application's job. Without one, every call here is a no-op.
//!
//! # Metrics
//!
//! | Metric | Type | Labels | Purpose |
//! |--------|------|--------|---------|
//! | `broadcast_session_attempts_total` | Counter | `role`, `status` | Start/join outcomes |
//! | `broadcast_join_duration_seconds` | Histogram | `role` | Init + join latency |
//! | `broadcast_sessions_active` | Gauge | none | Sessions between join and end |
//! | `broadcast_roster_size` | Gauge | `role` | Remote participants after the last recompute |
//! | `broadcast_transport_events_total` | Counter | `event`, `handled` | Events received from the transport |
//! | `broadcast_transport_errors_total` | Counter | `operation` | Failed init/join/leave calls |
//! | `broadcast_sessions_ended_total` | Counter | `reason` | Session ends by cause |
//!
//! Labels are bounded by enums in the session module (2 roles, 4 events,
//! 3 operations, 3 end reasons).

pub mod metrics;

pub use self::metrics::{
    record_join_duration, record_session_attempt, record_session_ended, record_transport_error,
    record_transport_event, set_roster_size, set_sessions_active,
};
