//! Live-reload notification hub and preview server.
//!
//! [`ReloadHub`] is a cloneable handle over a broadcast channel: rebuild
//! tasks publish [`ReloadEvent`]s, connected preview clients subscribe.
//! The [`server`] module serves the output directory over HTTP with a
//! server-sent-events stream and an injected client script.

pub mod server;

use tokio::sync::broadcast;

/// Capacity of the reload broadcast channel. Slow subscribers that lag past
/// this many events fall back to a full reload.
const CHANNEL_CAPACITY: usize = 16;

/// A notification to connected preview clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadEvent {
    /// A stylesheet was rebuilt; clients hot-swap without a page load.
    Styles {
        /// Output file name (e.g., `site.min.css`).
        name: String,
    },
    /// Anything else changed; clients reload the page.
    Full,
}

/// Cloneable publish/subscribe handle for reload notifications.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    tx: broadcast::Sender<ReloadEvent>,
}

impl ReloadHub {
    /// Create a new hub with no subscribers.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Notify clients that a stylesheet output changed.
    pub fn notify_styles(&self, name: impl Into<String>) {
        // Send fails only when no client is connected; that is fine.
        let _ = self.tx.send(ReloadEvent::Styles { name: name.into() });
    }

    /// Notify clients to do a full page reload.
    pub fn notify_full(&self) {
        let _ = self.tx.send(ReloadEvent::Full);
    }

    /// Subscribe to reload events.
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.tx.subscribe()
    }

    /// Number of currently connected subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}
