//! Notifier trait.

use crate::error::NotifyResult;
use pricewatch_core::BoxFuture;
use std::sync::Arc;

/// Delivers one alert message.
///
/// A single attempt per call; the caller decides what a failure means.
pub trait Notifier: Send + Sync {
    fn send<'a>(&'a self, message: &'a str) -> BoxFuture<'a, NotifyResult<()>>;
}

/// Arc wrapper for Notifier trait objects.
pub type DynNotifier = Arc<dyn Notifier>;

/// Mock notifier for testing.
#[derive(Debug)]
pub struct MockNotifier {
    /// Recorded messages for verification.
    sends: parking_lot::Mutex<Vec<String>>,
    /// Result returned by every send until changed.
    next_result: parking_lot::Mutex<NotifyResult<()>>,
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNotifier {
    pub fn new() -> Self {
        Self {
            sends: parking_lot::Mutex::new(Vec::new()),
            next_result: parking_lot::Mutex::new(Ok(())),
        }
    }

    /// Set the result returned by subsequent sends.
    pub fn set_next_result(&self, result: NotifyResult<()>) {
        *self.next_result.lock() = result;
    }

    /// Messages sent so far, including failed attempts.
    pub fn get_sends(&self) -> Vec<String> {
        self.sends.lock().clone()
    }

    pub fn clear_sends(&self) {
        self.sends.lock().clear();
    }
}

impl Notifier for MockNotifier {
    fn send<'a>(&'a self, message: &'a str) -> BoxFuture<'a, NotifyResult<()>> {
        Box::pin(async move {
            self.sends.lock().push(message.to_string());
            self.next_result.lock().clone()
        })
    }
}
