//! Lossless chat fan-out for auth steps.
//!
//! The session publishes every incoming chat line synchronously, as it
//! decodes it. Each auth step subscribes before sending its command and
//! gets its own unbounded queue, so a burst of unrelated chat can never
//! push the plugin's reply out of a step's view. Queues belonging to
//! dropped subscriptions are pruned on the next publish.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use afkbot_protocol::ChatLine;
use tokio::sync::mpsc;

type Subscribers = Vec<mpsc::UnboundedSender<ChatLine>>;

/// Cloneable handle shared by the session (publisher) and the handshake
/// (subscriber).
#[derive(Debug, Clone, Default)]
pub struct ChatFeed {
    subscribers: Arc<Mutex<Subscribers>>,
}

impl ChatFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts receiving every line published from now on.
    ///
    /// Dropping the receiver ends the subscription.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<ChatLine> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().push(tx);
        rx
    }

    /// Delivers `line` to every live subscriber and returns how many got it.
    pub fn publish(&self, line: ChatLine) -> usize {
        let mut subscribers = self.lock();
        subscribers.retain(|tx| tx.send(line.clone()).is_ok());
        subscribers.len()
    }

    /// Number of subscriptions that are still held.
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.lock();
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }

    // The lock is never held across an await or a panic-prone call, so a
    // poisoned list is still consistent.
    fn lock(&self) -> MutexGuard<'_, Subscribers> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(message: &str) -> ChatLine {
        ChatLine {
            sender: "Server".into(),
            message: message.into(),
        }
    }

    #[test]
    fn test_publish_without_subscribers_delivers_nowhere() {
        let feed = ChatFeed::new();
        assert_eq!(feed.publish(line("hello")), 0);
    }

    #[test]
    fn test_publish_keeps_every_line_in_order() {
        let feed = ChatFeed::new();
        let mut rx = feed.subscribe();

        for i in 0..500 {
            assert_eq!(feed.publish(line(&format!("line {i}"))), 1);
        }

        for i in 0..500 {
            assert_eq!(rx.try_recv().unwrap().message, format!("line {i}"));
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_subscriber_sees_only_lines_after_subscribing() {
        let feed = ChatFeed::new();
        feed.publish(line("before"));
        let mut rx = feed.subscribe();
        feed.publish(line("after"));

        assert_eq!(rx.try_recv().unwrap().message, "after");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_subscription_is_pruned() {
        let feed = ChatFeed::new();
        let rx = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 1);

        drop(rx);

        assert_eq!(feed.subscriber_count(), 0);
        assert_eq!(feed.publish(line("anyone?")), 0);
    }
}
