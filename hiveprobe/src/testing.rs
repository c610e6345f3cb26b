//! Test doubles for probe connections.

use crate::prober::Connector;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// A connector with scripted behaviour that records every attempt.
#[derive(Debug)]
pub struct ScriptedConnector {
    attempts: AtomicUsize,
    /// Number of attempts to refuse before accepting; `None` refuses forever.
    refuse_first: Option<usize>,
    /// Flipped on to accept every subsequent attempt.
    open: AtomicBool,
    hang: bool,
    targets: Mutex<Vec<SocketAddr>>,
}

impl ScriptedConnector {
    fn with(refuse_first: Option<usize>, hang: bool) -> Self {
        Self {
            attempts: AtomicUsize::new(0),
            refuse_first,
            open: AtomicBool::new(false),
            hang,
            targets: Mutex::new(Vec::new()),
        }
    }

    /// Accepts the first attempt.
    pub fn accepting() -> Self {
        Self::with(Some(0), false)
    }

    /// Refuses `failures` attempts, then accepts.
    pub fn accepting_after(failures: usize) -> Self {
        Self::with(Some(failures), false)
    }

    /// Refuses every attempt until [`ScriptedConnector::open`] is called.
    pub fn refusing() -> Self {
        Self::with(None, false)
    }

    /// Never completes an attempt.
    pub fn hanging() -> Self {
        Self::with(None, true)
    }

    /// Starts accepting connections.
    pub fn open(&self) {
        self.open.store(true, Ordering::SeqCst);
    }

    /// Returns the number of attempts made so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Returns the targets of every attempt.
    pub fn targets(&self) -> Vec<SocketAddr> {
        self.targets.lock().clone()
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, target: SocketAddr) -> io::Result<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        self.targets.lock().push(target);

        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.open.load(Ordering::SeqCst) {
            return Ok(());
        }
        match self.refuse_first {
            Some(failures) if attempt >= failures => Ok(()),
            _ => Err(io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused")),
        }
    }
}
