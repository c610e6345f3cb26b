//! Event sink trait and implementations.

use tracing::{debug, info, Level};

/// Hook that receives probe lifecycle events.
///
/// Called synchronously from the polling loop, so implementations must
/// return promptly and never block; a slow sink would delay probe timing.
pub trait EventSink: Send + Sync {
    /// Records one event.
    ///
    /// # Arguments
    ///
    /// * `event_type` - The type of event (e.g., "probe.succeeded")
    /// * `data` - Optional JSON payload
    fn emit(&self, event_type: &str, data: Option<serde_json::Value>);
}

/// A no-op event sink that discards all events.
///
/// Used as the default when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn emit(&self, _event_type: &str, _data: Option<serde_json::Value>) {}
}

/// An event sink that logs events using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a new logging event sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    /// Returns the level events are logged at.
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }
}

impl EventSink for LoggingEventSink {
    fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        let data = data.as_ref();
        if self.level == Level::DEBUG {
            debug!(event_type = %event_type, event_data = ?data, "Event: {}", event_type);
        } else {
            info!(event_type = %event_type, event_data = ?data, "Event: {}", event_type);
        }
    }
}

/// A collecting event sink, handy for asserting on probe behaviour.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: parking_lot::RwLock<Vec<(String, Option<serde_json::Value>)>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<(String, Option<serde_json::Value>)> {
        self.events.read().clone()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Returns the number of events with exactly this type.
    #[must_use]
    pub fn count(&self, event_type: &str) -> usize {
        self.events
            .read()
            .iter()
            .filter(|(t, _)| t == event_type)
            .count()
    }

    /// Returns the event types in emission order.
    #[must_use]
    pub fn types(&self) -> Vec<String> {
        self.events.read().iter().map(|(t, _)| t.clone()).collect()
    }
}

impl EventSink for CollectingEventSink {
    fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.events.write().push((event_type.to_string(), data));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_sink_discards() {
        let sink: &dyn EventSink = &NoOpEventSink;
        sink.emit("probe.started", Some(serde_json::json!({"address": "127.0.0.1:80"})));
    }

    #[test]
    fn test_logging_sink_levels() {
        assert_eq!(LoggingEventSink::default().level(), Level::INFO);

        let sink = LoggingEventSink::debug();
        assert_eq!(sink.level(), Level::DEBUG);
        sink.emit("probe.attempt_failed", Some(serde_json::json!({"attempt": 1})));
        sink.emit("probe.succeeded", None);
    }

    #[test]
    fn test_collecting_sink_keeps_order_and_payloads() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.emit("probe.started", None);
        sink.emit("probe.attempt_failed", Some(serde_json::json!({"attempt": 1})));
        sink.emit("probe.attempt_failed", Some(serde_json::json!({"attempt": 2})));

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.count("probe.attempt_failed"), 2);
        assert_eq!(
            sink.types(),
            vec!["probe.started", "probe.attempt_failed", "probe.attempt_failed"]
        );
        assert_eq!(sink.events()[2].1, Some(serde_json::json!({"attempt": 2})));
    }
}
