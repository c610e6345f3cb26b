//! Cancellation token for cooperative cancellation.

use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::Notify;
use tracing::warn;
use uuid::Uuid;

/// A callback type for cancellation notifications.
pub type CancelCallback = Box<dyn Fn() + Send + Sync>;

/// A token for cooperative cancellation, used as the scope of a probe.
///
/// Cancellation is idempotent - only the first cancellation reason is kept.
/// Tokens form a tree through [`CancellationToken::child`]: cancelling a
/// parent cancels every descendant, never the other way around.
pub struct CancellationToken {
    /// Identity used to tell two scopes apart.
    id: Uuid,
    /// Whether cancellation has been requested.
    cancelled: AtomicBool,
    /// The reason for cancellation (first one wins).
    reason: RwLock<Option<String>>,
    /// Callbacks to invoke on cancellation, keyed for removal.
    callbacks: Mutex<Vec<(u64, CancelCallback)>>,
    next_callback_key: AtomicU64,
    /// Wakes tasks parked in [`CancellationToken::cancelled`].
    notify: Notify,
    /// Registration on the parent, removed when this token is dropped.
    parent: Mutex<Option<(Weak<CancellationToken>, u64)>>,
}

impl CancellationToken {
    /// Creates a new root cancellation token.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::detached())
    }

    fn detached() -> Self {
        Self {
            id: Uuid::new_v4(),
            cancelled: AtomicBool::new(false),
            reason: RwLock::new(None),
            callbacks: Mutex::new(Vec::new()),
            next_callback_key: AtomicU64::new(0),
            notify: Notify::new(),
            parent: Mutex::new(None),
        }
    }

    /// Derives a child token that is cancelled together with `self`.
    ///
    /// If `self` is already cancelled the child starts out cancelled with the
    /// same reason.
    #[must_use]
    pub fn child(self: &Arc<Self>) -> Arc<Self> {
        let child = Arc::new(Self::detached());
        let weak_child = Arc::downgrade(&child);
        let weak_parent = Arc::downgrade(self);
        let key = self.register(Box::new(move || {
            if let (Some(child), Some(parent)) = (weak_child.upgrade(), weak_parent.upgrade()) {
                child.cancel(parent.reason().unwrap_or_default());
            }
        }));

        if let Some(key) = key {
            *child.parent.lock() = Some((Arc::downgrade(self), key));
        }
        child
    }

    /// Returns the identity of this token.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Requests cancellation with a reason.
    ///
    /// This is idempotent - only the first reason is kept.
    /// Callbacks run outside of any internal lock, so they may freely call
    /// back into this token. Panics in callbacks are logged and suppressed.
    pub fn cancel(&self, reason: impl Into<String>) {
        {
            // Readers that observe the flag block on this lock until the
            // reason is in place.
            let mut slot = self.reason.write();
            if self
                .cancelled
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                return;
            }
            *slot = Some(reason.into());
        }
        self.notify.notify_waiters();

        let callbacks: Vec<_> = {
            let mut lock = self.callbacks.lock();
            std::mem::take(&mut *lock)
        };
        for (_, callback) in callbacks {
            if let Err(e) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                callback();
            })) {
                warn!("Cancellation callback panicked: {:?}", e);
            }
        }
    }

    /// Registers a callback to be invoked on cancellation.
    ///
    /// If already cancelled, the callback is invoked immediately.
    pub fn on_cancel<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let _ = self.register(Box::new(callback));
    }

    /// Stores the callback and returns its key, or runs it right away and
    /// returns `None` if the token is already cancelled.
    fn register(&self, callback: CancelCallback) -> Option<u64> {
        {
            let mut callbacks = self.callbacks.lock();
            // Checked under the lock so a concurrent cancel cannot take the
            // list between the check and the push.
            if !self.is_cancelled() {
                let key = self.next_callback_key.fetch_add(1, Ordering::Relaxed);
                callbacks.push((key, callback));
                return Some(key);
            }
        }

        if let Err(e) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            callback();
        })) {
            warn!("Cancellation callback panicked: {:?}", e);
        }
        None
    }

    fn unregister(&self, key: u64) {
        self.callbacks.lock().retain(|(k, _)| *k != key);
    }

    /// Returns whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns the cancellation reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.reason.read().clone()
    }

    /// Waits until cancellation is requested.
    ///
    /// Returns immediately if the token is already cancelled.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    #[cfg(test)]
    pub(crate) fn pending_callbacks(&self) -> usize {
        self.callbacks.lock().len()
    }
}

impl Drop for CancellationToken {
    fn drop(&mut self) {
        if let Some((parent, key)) = self.parent.get_mut().take() {
            if let Some(parent) = parent.upgrade() {
                parent.unregister(key);
            }
        }
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("id", &self.id)
            .field("cancelled", &self.is_cancelled())
            .field("reason", &self.reason())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[test]
    fn test_token_default_not_cancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        assert!(token.reason().is_none());
    }

    #[test]
    fn test_token_cancel_idempotent() {
        let token = CancellationToken::new();
        token.cancel("First reason");
        token.cancel("Second reason");

        assert!(token.is_cancelled());
        assert_eq!(token.reason(), Some("First reason".to_string()));
    }

    #[test]
    fn test_on_cancel_before_and_after_cancellation() {
        let token = CancellationToken::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let c = counter.clone();
        token.on_cancel(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        token.cancel("test");
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        // Already cancelled, invoked immediately
        let c = counter.clone();
        token.on_cancel(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_callback_panic_suppressed() {
        let token = CancellationToken::new();
        token.on_cancel(|| panic!("Intentional panic"));

        token.cancel("test");
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_callback_may_reenter_token() {
        let token = CancellationToken::new();
        let weak = Arc::downgrade(&token);
        token.on_cancel(move || {
            if let Some(token) = weak.upgrade() {
                token.cancel("again");
                token.on_cancel(|| {});
            }
        });

        token.cancel("first");
        assert_eq!(token.reason(), Some("first".to_string()));
    }

    #[test]
    fn test_child_follows_parent() {
        let parent = CancellationToken::new();
        let child = parent.child();
        assert_ne!(parent.id(), child.id());

        parent.cancel("shutdown");
        assert!(child.is_cancelled());
        assert_eq!(child.reason(), Some("shutdown".to_string()));
    }

    #[test]
    fn test_child_cancel_leaves_parent() {
        let parent = CancellationToken::new();
        let child = parent.child();

        child.cancel("done");
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn test_child_of_cancelled_parent_starts_cancelled() {
        let parent = CancellationToken::new();
        parent.cancel("gone");

        let child = parent.child();
        assert!(child.is_cancelled());
        assert_eq!(child.reason(), Some("gone".to_string()));
    }

    #[test]
    fn test_dropped_child_unregisters_from_parent() {
        let parent = CancellationToken::new();
        let child = parent.child();
        assert_eq!(parent.pending_callbacks(), 1);

        drop(child);
        assert_eq!(parent.pending_callbacks(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_wakes_waiter() {
        let token = CancellationToken::new();
        let waiter = {
            let token = token.clone();
            tokio::spawn(async move { token.cancelled().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel("wake");

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_returns_immediately_when_cancelled() {
        let token = CancellationToken::new();
        token.cancel("early");
        tokio::time::timeout(Duration::from_millis(50), token.cancelled())
            .await
            .expect("already cancelled");
    }
}
