//! Completion guard for a registered operation.

use super::{CancelRegistry, OPERATION_FINISHED};
use crate::cancellation::CancellationToken;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Ends a registered operation: cancels its scope and drops its registry
/// entry.
///
/// Released explicitly through [`OperationGuard::done`] or implicitly on
/// drop, which covers early returns, panics and dropped futures alike.
pub struct OperationGuard {
    registry: Arc<CancelRegistry>,
    id: u64,
    scope: Arc<CancellationToken>,
    released: AtomicBool,
}

impl OperationGuard {
    pub(super) fn new(registry: Arc<CancelRegistry>, id: u64, scope: Arc<CancellationToken>) -> Self {
        Self {
            registry,
            id,
            scope,
            released: AtomicBool::new(false),
        }
    }

    /// Releases the operation. Calls after the first are no-ops.
    ///
    /// The entry is removed only if it still belongs to this guard's scope,
    /// so a late release never touches a newer operation that reused the id.
    pub fn done(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }

        self.scope.cancel(OPERATION_FINISHED);
        if self.registry.release(self.id, self.scope.id()) {
            debug!(id = self.id, "Operation released");
        }
    }
}

impl Drop for OperationGuard {
    fn drop(&mut self) {
        self.done();
    }
}

impl std::fmt::Debug for OperationGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationGuard")
            .field("id", &self.id)
            .field("released", &self.released.load(Ordering::SeqCst))
            .finish()
    }
}
