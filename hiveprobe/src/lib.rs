//! # Hiveprobe
//!
//! A cancellable liveness-probe dispatcher.
//!
//! Callers start a "wait until this endpoint accepts TCP connections"
//! operation under a numeric request id and may cancel it by id from any
//! other task, at any time:
//!
//! - **Cancellation registry**: at most one active operation per request id,
//!   with race-free registration, cancellation and cleanup
//! - **Liveness prober**: fixed-interval TCP polling of an `ip:port` target
//!   that stops on success, cancellation, or a malformed address
//! - **Dispatcher**: the two-operation boundary (`start_probe`, `cancel`)
//!   consumed by an external control plane
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hiveprobe::prelude::*;
//!
//! # async fn run() -> Result<(), ProbeError> {
//! let dispatcher = ProbeDispatcher::new(ProbeConfig::default())?;
//!
//! let waiter = {
//!     let dispatcher = dispatcher.clone();
//!     tokio::spawn(async move { dispatcher.start_probe(1, "127.0.0.1:8545").await })
//! };
//!
//! // From the control path, at any time:
//! dispatcher.cancel(1);
//! # let _ = waiter.await;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod events;
pub mod observability;
pub mod prober;
pub mod registry;
#[cfg(test)]
mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::ProbeConfig;
    pub use crate::dispatcher::ProbeDispatcher;
    pub use crate::errors::{
        ConfigError, MalformedAddressError, MalformedReason, ProbeError, RegistryError,
    };
    pub use crate::events::{
        CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink,
    };
    pub use crate::observability::{init_tracing, LogFormat};
    pub use crate::prober::{Connector, LivenessProber, TcpConnector};
    pub use crate::registry::{CancelRegistry, OperationGuard};
}
