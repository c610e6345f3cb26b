//! Cooperative cancellation scopes.
//!
//! This module provides:
//! - CancellationToken for cooperative cancellation with parent/child scopes

mod token;

pub use token::{CancelCallback, CancellationToken};
