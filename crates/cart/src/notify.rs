//! User notification channel.
//!
//! Failed cart operations push a shopper-facing message here in addition to
//! returning a [`CartError`](crate::error::CartError). A UI would render these
//! as toasts; the default implementation logs them.

use std::sync::{Arc, Mutex, PoisonError};

/// Receives shopper-facing messages from the cart store.
pub trait Notifier {
    /// Report a failed operation.
    fn notify_error(&self, message: &str);
}

/// Logs notifications through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify_error(&self, message: &str) {
        tracing::warn!(notification = message, "Cart operation failed");
    }
}

/// Collects notifications so they can be inspected later.
///
/// Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages recorded so far, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify_error(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}
