//! Registry of active operations keyed by caller-assigned request id.

mod guard;

pub use guard::OperationGuard;

use crate::cancellation::CancellationToken;
use crate::errors::RegistryError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Reason recorded on a scope cancelled through [`CancelRegistry::cancel_operation`].
pub const CANCEL_REQUESTED: &str = "canceled";

/// Reason recorded on a scope whose operation finished on its own.
pub const OPERATION_FINISHED: &str = "operation finished";

/// Thread-safe map from request id to the cancellation scope of the operation
/// currently running under that id.
///
/// The lock guards only the map. Scopes are always cancelled after the lock
/// is released, so cancellation callbacks may call back into the registry.
#[derive(Default)]
pub struct CancelRegistry {
    active: Mutex<HashMap<u64, Arc<CancellationToken>>>,
}

impl CancelRegistry {
    /// Creates a new, empty registry.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Starts tracking `id` and returns its scope along with the guard that
    /// must be released when the operation ends.
    ///
    /// The scope is derived from `base`, so cancelling `base` also ends the
    /// operation. An id that is still active is rejected and the existing
    /// entry is left untouched.
    pub fn begin_operation(
        self: &Arc<Self>,
        base: &Arc<CancellationToken>,
        id: u64,
    ) -> Result<(Arc<CancellationToken>, OperationGuard), RegistryError> {
        let scope = base.child();

        {
            let mut active = self.active.lock();
            if active.contains_key(&id) {
                return Err(RegistryError::DuplicateId { id });
            }
            active.insert(id, scope.clone());
        }

        debug!(id, scope = %scope.id(), "Operation registered");
        let guard = OperationGuard::new(Arc::clone(self), id, scope.clone());
        Ok((scope, guard))
    }

    /// Cancels the operation registered under `id`, if any.
    ///
    /// Returns true if an active operation was found. Unknown or already
    /// finished ids are a no-op.
    pub fn cancel_operation(&self, id: u64) -> bool {
        let scope = self.active.lock().remove(&id);
        match scope {
            Some(scope) => {
                debug!(id, scope = %scope.id(), "Operation cancelled by request");
                scope.cancel(CANCEL_REQUESTED);
                true
            }
            None => false,
        }
    }

    /// Cancels and forgets every active operation.
    ///
    /// Returns the number of operations cancelled.
    pub fn cancel_all(&self, reason: &str) -> usize {
        let drained: Vec<_> = {
            let mut active = self.active.lock();
            active.drain().collect()
        };

        for (_, scope) in &drained {
            scope.cancel(reason);
        }
        drained.len()
    }

    /// Removes `id` only if it still maps to the scope with identity `scope_id`.
    ///
    /// Returns true if the entry was removed.
    pub(crate) fn release(&self, id: u64, scope_id: uuid::Uuid) -> bool {
        let mut active = self.active.lock();
        match active.get(&id) {
            Some(current) if current.id() == scope_id => {
                active.remove(&id);
                true
            }
            _ => false,
        }
    }

    /// Returns true if an operation is active under `id`.
    #[must_use]
    pub fn contains(&self, id: u64) -> bool {
        self.active.lock().contains_key(&id)
    }

    /// Returns the ids of all active operations, sorted.
    #[must_use]
    pub fn active_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.active.lock().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Returns the number of active operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.lock().len()
    }

    /// Returns true if no operations are active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.lock().is_empty()
    }
}

impl std::fmt::Debug for CancelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelRegistry")
            .field("active_ids", &self.active_ids())
            .finish()
    }
}
