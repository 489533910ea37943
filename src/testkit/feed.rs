//! Mock [`VaaStream`] implementations for testing.
//!
//! - [`ScriptedStream`] - Pre-loaded connect/subscribe results and messages.
//!   Best for: reconnection logic, retry budgets, fixed delivery sequences.
//!
//! - [`ChannelStream`] - Channel-backed stream with external control handle.
//!   Best for: relay runtime tests needing on-demand delivery and failures.
//!
//! Both streams block forever once their messages are exhausted, like a quiet
//! but healthy feed.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::RawMessage;
use crate::error::{Error, Result};
use crate::port::VaaStream;

// ---------------------------------------------------------------------------
// ScriptedStream
// ---------------------------------------------------------------------------

/// A mock stream with scripted connect/subscribe results and a fixed message queue.
///
/// Each call to `connect()` or `subscribe()` pops the next result from the
/// corresponding queue (defaults to `Ok(())` when exhausted).
pub struct ScriptedStream {
    connect_results: VecDeque<Result<()>>,
    subscribe_results: VecDeque<Result<()>>,
    messages: VecDeque<Result<RawMessage>>,
    connect_count: Arc<AtomicU32>,
    subscribe_count: Arc<AtomicU32>,
}

impl ScriptedStream {
    pub fn new() -> Self {
        Self {
            connect_results: VecDeque::new(),
            subscribe_results: VecDeque::new(),
            messages: VecDeque::new(),
            connect_count: Arc::new(AtomicU32::new(0)),
            subscribe_count: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn with_connect_results(mut self, results: Vec<Result<()>>) -> Self {
        self.connect_results = results.into();
        self
    }

    pub fn with_subscribe_results(mut self, results: Vec<Result<()>>) -> Self {
        self.subscribe_results = results.into();
        self
    }

    /// Queue receive outcomes: `Ok` delivers bytes, `Err` kills the session.
    pub fn with_messages(mut self, messages: Vec<Result<RawMessage>>) -> Self {
        self.messages = messages.into();
        self
    }

    /// Queue successful deliveries of raw bytes.
    pub fn with_payloads(mut self, payloads: Vec<Vec<u8>>) -> Self {
        self.messages = payloads.into_iter().map(|p| Ok(RawMessage::new(p))).collect();
        self
    }

    /// Get shared counters for asserting connect/subscribe call counts.
    pub fn counts(&self) -> (Arc<AtomicU32>, Arc<AtomicU32>) {
        (self.connect_count.clone(), self.subscribe_count.clone())
    }

    pub fn connect_count(&self) -> u32 {
        self.connect_count.load(Ordering::SeqCst)
    }

    pub fn subscribe_count(&self) -> u32 {
        self.subscribe_count.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedStream {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VaaStream for ScriptedStream {
    async fn connect(&mut self) -> Result<()> {
        self.connect_count.fetch_add(1, Ordering::SeqCst);
        self.connect_results.pop_front().unwrap_or(Ok(()))
    }

    async fn subscribe(&mut self) -> Result<()> {
        self.subscribe_count.fetch_add(1, Ordering::SeqCst);
        self.subscribe_results.pop_front().unwrap_or(Ok(()))
    }

    async fn next_message(&mut self) -> Result<RawMessage> {
        match self.messages.pop_front() {
            Some(message) => message,
            None => std::future::pending().await,
        }
    }

    fn feed_name(&self) -> &'static str {
        "scripted"
    }
}

// ---------------------------------------------------------------------------
// ChannelStream
// ---------------------------------------------------------------------------

enum Delivery {
    Message(RawMessage),
    Failure(String),
}

/// A mock stream controlled externally via a [`ChannelStreamHandle`].
///
/// Messages and receive failures are pushed through the handle. Connect
/// failures can be armed on the handle to exercise resubscription.
pub struct ChannelStream {
    rx: mpsc::UnboundedReceiver<Delivery>,
    connect_count: Arc<AtomicU32>,
    subscribe_count: Arc<AtomicU32>,
    failing_connects: Arc<AtomicU32>,
}

/// Control handle for a [`ChannelStream`].
#[derive(Clone)]
pub struct ChannelStreamHandle {
    tx: mpsc::UnboundedSender<Delivery>,
    connect_count: Arc<AtomicU32>,
    subscribe_count: Arc<AtomicU32>,
    failing_connects: Arc<AtomicU32>,
}

impl ChannelStreamHandle {
    /// Deliver raw bytes to the stream.
    pub fn send(&self, bytes: Vec<u8>) {
        let _ = self.tx.send(Delivery::Message(RawMessage::new(bytes)));
    }

    /// Make the next receive fail as if the transport dropped.
    pub fn fail(&self, reason: &str) {
        let _ = self.tx.send(Delivery::Failure(reason.to_string()));
    }

    /// Make the next `n` connect calls fail.
    pub fn fail_next_connects(&self, n: u32) {
        self.failing_connects.store(n, Ordering::SeqCst);
    }

    /// How many times `connect()` was called.
    pub fn connect_count(&self) -> u32 {
        self.connect_count.load(Ordering::SeqCst)
    }

    /// How many times `subscribe()` was called.
    pub fn subscribe_count(&self) -> u32 {
        self.subscribe_count.load(Ordering::SeqCst)
    }
}

/// Create a [`ChannelStream`] and its control [`ChannelStreamHandle`].
pub fn channel_stream() -> (ChannelStream, ChannelStreamHandle) {
    let (tx, rx) = mpsc::unbounded_channel();
    let cc = Arc::new(AtomicU32::new(0));
    let sc = Arc::new(AtomicU32::new(0));
    let fc = Arc::new(AtomicU32::new(0));
    (
        ChannelStream {
            rx,
            connect_count: cc.clone(),
            subscribe_count: sc.clone(),
            failing_connects: fc.clone(),
        },
        ChannelStreamHandle {
            tx,
            connect_count: cc,
            subscribe_count: sc,
            failing_connects: fc,
        },
    )
}

#[async_trait]
impl VaaStream for ChannelStream {
    async fn connect(&mut self) -> Result<()> {
        self.connect_count.fetch_add(1, Ordering::SeqCst);
        let armed = self
            .failing_connects
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if armed.is_ok() {
            return Err(Error::Connection("scripted connect failure".to_string()));
        }
        Ok(())
    }

    async fn subscribe(&mut self) -> Result<()> {
        self.subscribe_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn next_message(&mut self) -> Result<RawMessage> {
        match self.rx.recv().await {
            Some(Delivery::Message(message)) => Ok(message),
            Some(Delivery::Failure(reason)) => Err(Error::Connection(reason)),
            None => std::future::pending().await,
        }
    }

    fn feed_name(&self) -> &'static str {
        "channel"
    }
}
