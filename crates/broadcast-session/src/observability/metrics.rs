//! Metric recording functions.
//!
//! Naming follows Prometheus conventions: `broadcast_` prefix, `_total`
//! suffix for counters, `_seconds` suffix for duration histograms.

use metrics::{counter, gauge, histogram};
use std::time::Duration;

// ============================================================================
// Session Lifecycle
// ============================================================================

/// Record the outcome of a start or join command.
///
/// Metric: `broadcast_session_attempts_total`
/// Labels: `role` (host, viewer), `status` (success, rejected, error, aborted)
pub fn record_session_attempt(role: &str, status: &str) {
    counter!(
        "broadcast_session_attempts_total",
        "role" => role.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record how long transport init plus join took.
///
/// Metric: `broadcast_join_duration_seconds`
/// Labels: `role`
pub fn record_join_duration(role: &str, duration: Duration) {
    histogram!("broadcast_join_duration_seconds", "role" => role.to_string())
        .record(duration.as_secs_f64());
}

/// Set whether a session is currently live.
///
/// Metric: `broadcast_sessions_active`
/// Labels: none
pub fn set_sessions_active(active: bool) {
    gauge!("broadcast_sessions_active").set(if active { 1.0 } else { 0.0 });
}

/// Record why a session ended.
///
/// Metric: `broadcast_sessions_ended_total`
/// Labels: `reason` (requested, teardown, remote_left)
pub fn record_session_ended(reason: &str) {
    counter!("broadcast_sessions_ended_total", "reason" => reason.to_string()).increment(1);
}

// ============================================================================
// Roster
// ============================================================================

/// Set the roster size after a recompute.
///
/// Metric: `broadcast_roster_size`
/// Labels: `role`
pub fn set_roster_size(role: &str, size: usize) {
    // usize to f64 conversion is safe for realistic roster sizes
    #[allow(clippy::cast_precision_loss)]
    gauge!("broadcast_roster_size", "role" => role.to_string()).set(size as f64);
}

// ============================================================================
// Transport
// ============================================================================

/// Record a transport event.
///
/// Metric: `broadcast_transport_events_total`
/// Labels: `event` (room_joined, room_left, participant_joined,
/// participant_left), `handled` (true, false)
pub fn record_transport_event(event: &str, handled: bool) {
    counter!(
        "broadcast_transport_events_total",
        "event" => event.to_string(),
        "handled" => handled.to_string()
    )
    .increment(1);
}

/// Record a failed transport call.
///
/// Metric: `broadcast_transport_errors_total`
/// Labels: `operation` (init, join, leave)
pub fn record_transport_error(operation: &str) {
    counter!("broadcast_transport_errors_total", "operation" => operation.to_string())
        .increment(1);
}
