//! Broadcast channel for library change events. Subscribers that lag or
//! disconnect are dropped by the channel, senders never block on them.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    ImageInserted { id: i64 },
}

#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Event>,
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Fire-and-forget: with no subscribers the send errors, which is fine.
    pub fn image_inserted(&self, id: i64) {
        let _ = self.tx.send(Event::ImageInserted { id });
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_receive_inserts() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();
        notifier.image_inserted(42);
        assert_eq!(rx.try_recv().unwrap(), Event::ImageInserted { id: 42 });
    }

    #[test]
    fn send_without_subscribers_does_not_panic() {
        let notifier = Notifier::new();
        notifier.image_inserted(1);
    }
}
