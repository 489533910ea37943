//! Fake [`Submitter`] implementations.
//!
//! - [`RecordingSubmitter`] - records every call and succeeds or fails on a
//!   fixed script.
//! - [`BlockingSubmitter`] - parks every call until the test releases it.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{Notify, Semaphore};

use crate::domain::TransactionId;
use crate::error::{self, Error, SubmissionError};
use crate::port::Submitter;

// ---------------------------------------------------------------------------
// RecordingSubmitter
// ---------------------------------------------------------------------------

/// Records `(target, raw)` for every submission.
pub struct RecordingSubmitter {
    name: &'static str,
    failure: Option<String>,
    healthy: bool,
    calls: Mutex<Vec<(String, Vec<u8>)>>,
}

impl RecordingSubmitter {
    /// A submitter that always succeeds with `"{name}-tx-{n}"`.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            failure: None,
            healthy: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A submitter that always rejects with `reason`.
    pub fn failing(name: &'static str, reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
            ..Self::new(name)
        }
    }

    /// Make [`Submitter::check_health`] fail.
    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    pub fn calls(&self) -> Vec<(String, Vec<u8>)> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl Submitter for RecordingSubmitter {
    async fn submit(&self, target: &str, raw: &[u8]) -> Result<TransactionId, SubmissionError> {
        let n = {
            let mut calls = self.calls.lock();
            calls.push((target.to_string(), raw.to_vec()));
            calls.len()
        };
        match &self.failure {
            Some(reason) => Err(SubmissionError::Rejected {
                submitter: self.name,
                reason: reason.clone(),
            }),
            None => Ok(TransactionId::new(format!("{}-tx-{n}", self.name))),
        }
    }

    async fn check_health(&self) -> error::Result<()> {
        if self.healthy {
            Ok(())
        } else {
            Err(Error::Connection(format!("{} unreachable", self.name)))
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

// ---------------------------------------------------------------------------
// BlockingSubmitter
// ---------------------------------------------------------------------------

/// Parks each submission until [`release`](Self::release) hands out a permit.
pub struct BlockingSubmitter {
    name: &'static str,
    gate: Semaphore,
    started: AtomicUsize,
    completed: AtomicUsize,
    progress: Notify,
}

impl BlockingSubmitter {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            gate: Semaphore::new(0),
            started: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            progress: Notify::new(),
        }
    }

    /// Let `n` parked or future submissions complete.
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    /// Number of submissions that have entered `submit`.
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Number of submissions that returned.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Wait until at least `n` submissions are parked or done.
    pub async fn wait_for_started(&self, n: usize) {
        loop {
            let notified = self.progress.notified();
            if self.started() >= n {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl Submitter for BlockingSubmitter {
    async fn submit(&self, _target: &str, _raw: &[u8]) -> Result<TransactionId, SubmissionError> {
        let n = self.started.fetch_add(1, Ordering::SeqCst) + 1;
        self.progress.notify_waiters();

        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| SubmissionError::Cancelled)?;
        permit.forget();

        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(TransactionId::new(format!("{}-tx-{n}", self.name)))
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
