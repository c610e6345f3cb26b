//! The dispatcher: start probes by request id and cancel them by id.
//!
//! This is the boundary consumed by whatever control plane carries probe and
//! cancel requests. Both operations are safe to call from any task.

use crate::cancellation::CancellationToken;
use crate::config::ProbeConfig;
use crate::errors::{ConfigError, ProbeError};
use crate::events::{EventSink, LoggingEventSink};
use crate::prober::{Connector, LivenessProber};
use crate::registry::CancelRegistry;
use std::sync::Arc;
use tracing::{debug, info_span, warn, Instrument};

/// Runs liveness probes keyed by caller-assigned request ids.
///
/// Clones share the same registry and root scope.
#[derive(Clone)]
pub struct ProbeDispatcher {
    registry: Arc<CancelRegistry>,
    root: Arc<CancellationToken>,
    prober: Arc<LivenessProber>,
}

impl ProbeDispatcher {
    /// Creates a dispatcher that dials over TCP.
    pub fn new(config: ProbeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_prober(LivenessProber::new(config)))
    }

    /// Creates a dispatcher with a custom connector and event sink.
    pub fn with_parts(
        config: ProbeConfig,
        connector: Arc<dyn Connector>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_prober(
            LivenessProber::new(config)
                .with_connector(connector)
                .with_event_sink(sink),
        ))
    }

    /// Creates a TCP dispatcher whose probe events are logged at the
    /// configured `event_level`.
    pub fn with_logging_events(config: ProbeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let sink = LoggingEventSink::new(config.level()?);
        Ok(Self::from_prober(
            LivenessProber::new(config).with_event_sink(Arc::new(sink)),
        ))
    }

    fn from_prober(prober: LivenessProber) -> Self {
        Self {
            registry: CancelRegistry::new(),
            root: CancellationToken::new(),
            prober: Arc::new(prober),
        }
    }

    /// Probes `address` under request id `id` until it is reachable, the id
    /// is cancelled, or the address turns out to be malformed.
    ///
    /// The id is tracked for exactly the duration of this call. Reusing an id
    /// that is still active fails with [`ProbeError::is_fatal`] set and leaves
    /// the running probe alone.
    pub async fn start_probe(&self, id: u64, address: &str) -> Result<(), ProbeError> {
        let (scope, guard) = match self.registry.begin_operation(&self.root, id) {
            Ok(registered) => registered,
            Err(err) => {
                warn!(id, address, "Rejected probe for active request id");
                return Err(err.into());
            }
        };

        let result = self
            .prober
            .probe(&scope, address)
            .instrument(info_span!("probe", id, address))
            .await;
        guard.done();
        result
    }

    /// Cancels the probe running under `id`. Unknown ids are ignored.
    pub fn cancel(&self, id: u64) {
        if !self.registry.cancel_operation(id) {
            debug!(id, "Cancel for inactive request id ignored");
        }
    }

    /// Returns true while a probe is running under `id`.
    #[must_use]
    pub fn is_active(&self, id: u64) -> bool {
        self.registry.contains(id)
    }

    /// Returns the number of running probes.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.registry.len()
    }

    /// Returns the ids of all running probes, sorted.
    #[must_use]
    pub fn active_ids(&self) -> Vec<u64> {
        self.registry.active_ids()
    }

    /// Cancels every running probe and refuses to poll for new ones.
    ///
    /// Probes started afterwards still validate their address but end as
    /// cancelled before the first connection attempt.
    pub fn shutdown(&self, reason: &str) {
        self.root.cancel(reason);
        let cancelled = self.registry.cancel_all(reason);
        debug!(cancelled, reason, "Dispatcher shut down");
    }

    /// Returns true once [`ProbeDispatcher::shutdown`] has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.root.is_cancelled()
    }

    /// Returns the prober configuration.
    #[must_use]
    pub fn config(&self) -> &ProbeConfig {
        self.prober.config()
    }
}

impl std::fmt::Debug for ProbeDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeDispatcher")
            .field("active_ids", &self.active_ids())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}
