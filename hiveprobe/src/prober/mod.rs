//! Liveness prober: polls a TCP endpoint until it accepts a connection.
//!
//! A probe moves through `Validating -> Polling -> {Succeeded, Cancelled}`,
//! or straight from `Validating` to a malformed-address failure. There is no
//! retry cap and no built-in timeout; the caller's scope decides how long a
//! probe may run.

mod address;
mod connector;
mod throttle;

pub use address::{parse_target, split_host_port};
pub use connector::{Connector, TcpConnector};
pub use throttle::LogThrottle;

use crate::cancellation::CancellationToken;
use crate::config::ProbeConfig;
use crate::errors::ProbeError;
use crate::events::{
    EventSink, NoOpEventSink, PROBE_ATTEMPT_FAILED, PROBE_CANCELLED, PROBE_REJECTED,
    PROBE_STARTED, PROBE_SUCCEEDED,
};
use serde_json::json;
use std::sync::Arc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Polls an address on a fixed interval until it is reachable or the
/// probe's scope is cancelled.
pub struct LivenessProber {
    config: ProbeConfig,
    connector: Arc<dyn Connector>,
    sink: Arc<dyn EventSink>,
}

impl LivenessProber {
    /// Creates a prober that dials over TCP and discards events.
    #[must_use]
    pub fn new(config: ProbeConfig) -> Self {
        Self {
            config,
            connector: Arc::new(TcpConnector),
            sink: Arc::new(NoOpEventSink),
        }
    }

    /// Replaces the connector.
    #[must_use]
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    /// Replaces the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Waits until `address` accepts a TCP connection.
    ///
    /// Malformed addresses fail before any connection attempt. Otherwise the
    /// first attempt happens one poll interval after the call, and each
    /// attempt (including one still connecting) is abandoned as soon as
    /// `scope` is cancelled.
    pub async fn probe(&self, scope: &CancellationToken, address: &str) -> Result<(), ProbeError> {
        let target = match parse_target(address) {
            Ok(target) => target,
            Err(err) => {
                let reason = err.reason;
                let err = ProbeError::from(err);
                self.sink.emit(
                    PROBE_REJECTED,
                    Some(json!({ "address": address, "kind": err.kind(), "reason": reason })),
                );
                return Err(err);
            }
        };

        if scope.is_cancelled() {
            return Err(self.cancelled(scope, address, 0));
        }
        self.sink.emit(PROBE_STARTED, Some(json!({ "address": address })));

        let period = self.config.poll_interval();
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut throttle = LogThrottle::new(self.config.log_interval());
        let mut attempts: u64 = 0;

        loop {
            tokio::select! {
                biased;
                () = scope.cancelled() => return Err(self.cancelled(scope, address, attempts)),
                _ = ticker.tick() => {}
            }

            if throttle.ready() {
                info!(address, "checking address");
            }

            attempts += 1;
            let result = tokio::select! {
                biased;
                () = scope.cancelled() => return Err(self.cancelled(scope, address, attempts)),
                result = self.connector.connect(target) => result,
            };

            match result {
                Ok(()) => {
                    debug!(address, attempts, "Address is live");
                    self.sink.emit(
                        PROBE_SUCCEEDED,
                        Some(json!({ "address": address, "attempts": attempts })),
                    );
                    return Ok(());
                }
                Err(err) => {
                    self.sink.emit(
                        PROBE_ATTEMPT_FAILED,
                        Some(json!({
                            "address": address,
                            "attempt": attempts,
                            "error": err.to_string(),
                        })),
                    );
                }
            }
        }
    }

    fn cancelled(&self, scope: &CancellationToken, address: &str, attempts: u64) -> ProbeError {
        let reason = scope.reason().unwrap_or_default();
        let err = ProbeError::cancelled(reason.clone());
        self.sink.emit(
            PROBE_CANCELLED,
            Some(json!({
                "address": address,
                "attempts": attempts,
                "kind": err.kind(),
                "reason": reason,
            })),
        );
        err
    }
}

impl std::fmt::Debug for LivenessProber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LivenessProber")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
