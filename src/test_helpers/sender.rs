//! A `ServiceLogSender` that records what it is asked to send.

use std::sync::{
    Arc,
    atomic::{AtomicU16, Ordering},
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::notification::{NotificationError, ServiceLog, ServiceLogSender, response_checker};

/// Records every service log and answers with a configurable HTTP status.
///
/// Clones share the recorded service logs, so a test can keep one handle
/// while the dispatcher owns another.
#[derive(Clone)]
pub struct RecordingSender {
    sent: Arc<Mutex<Vec<ServiceLog>>>,
    status: Arc<AtomicU16>,
}

impl Default for RecordingSender {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSender {
    /// Creates a sender whose every send succeeds.
    pub fn new() -> Self {
        Self { sent: Arc::new(Mutex::new(Vec::new())), status: Arc::new(AtomicU16::new(201)) }
    }

    /// Creates a sender whose every send is rejected with `status`.
    pub fn failing(status: u16) -> Self {
        let sender = Self::new();
        sender.respond_with(status);
        sender
    }

    /// Changes the status later sends are answered with.
    pub fn respond_with(&self, status: u16) {
        self.status.store(status, Ordering::SeqCst);
    }

    /// Returns the service logs sent so far, including rejected ones.
    pub async fn sent(&self) -> Vec<ServiceLog> {
        self.sent.lock().await.clone()
    }

    /// Returns how many sends were attempted.
    pub async fn count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

#[async_trait]
impl ServiceLogSender for RecordingSender {
    async fn send_service_log(&self, service_log: &ServiceLog) -> Result<(), NotificationError> {
        self.sent.lock().await.push(service_log.clone());
        response_checker("recording-sender", self.status.load(Ordering::SeqCst), br#"{"reason":"rejected by test"}"#)
    }
}
