//! De-duplicated user-facing error notifications.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, error};

/// Displays a message to the user.
pub trait Notifier: Send + Sync {
    /// Show `message`.
    fn show(&self, message: &str);
}

/// Notifier that writes messages to the error log.
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn show(&self, message: &str) {
        error!(message, "Request failed");
    }
}

/// Collapse whitespace runs and trim, so trivially different renderings of
/// the same message share one cache entry.
pub fn normalize(message: &str) -> String {
    message.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Shows each distinct message at most once per cooldown window.
///
/// The cache is swept of expired entries whenever it grows past the sweep
/// threshold, which bounds memory without a timer.
pub struct NotificationCache {
    notifier: Arc<dyn Notifier>,
    cooldown: Duration,
    sweep_threshold: usize,
    shown: Mutex<HashMap<String, Instant>>,
}

impl NotificationCache {
    /// Create a cache with explicit settings.
    pub fn with_settings(
        notifier: Arc<dyn Notifier>,
        cooldown: Duration,
        sweep_threshold: usize,
    ) -> Self {
        Self {
            notifier,
            cooldown,
            sweep_threshold,
            shown: Mutex::new(HashMap::new()),
        }
    }

    /// Show `message` unless it was shown within the cooldown window.
    ///
    /// Returns whether the message was shown.
    pub fn notify(&self, message: &str) -> bool {
        let key = normalize(message);
        let now = Instant::now();
        {
            let mut shown = self.shown.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(last) = shown.get(&key) {
                if now.duration_since(*last) < self.cooldown {
                    debug!(message = key.as_str(), "Suppressing duplicate notification");
                    return false;
                }
            }
            shown.insert(key.clone(), now);
            if shown.len() > self.sweep_threshold {
                let cooldown = self.cooldown;
                shown.retain(|_, at| now.duration_since(*at) < cooldown);
            }
        }
        self.notifier.show(&key);
        true
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.shown.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for NotificationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationCache")
            .field("cooldown", &self.cooldown)
            .field("sweep_threshold", &self.sweep_threshold)
            .field("entries", &self.len())
            .finish()
    }
}
