//! Probe lifecycle events.
//!
//! Every probe reports its progress through an [`EventSink`]. Payloads are
//! JSON objects carrying at least the target `address`.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

/// A probe passed validation and entered the polling loop.
pub const PROBE_STARTED: &str = "probe.started";
/// A single connection attempt failed; the probe keeps polling.
pub const PROBE_ATTEMPT_FAILED: &str = "probe.attempt_failed";
/// The endpoint accepted a connection.
pub const PROBE_SUCCEEDED: &str = "probe.succeeded";
/// The probe's scope was cancelled.
pub const PROBE_CANCELLED: &str = "probe.cancelled";
/// The address failed validation.
pub const PROBE_REJECTED: &str = "probe.rejected";
