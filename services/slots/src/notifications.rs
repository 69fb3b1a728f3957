use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

/// A message for the display layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    pub emitted_at: DateTime<Utc>,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, NotificationKind::Success)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, NotificationKind::Error)
    }

    fn new(message: impl Into<String>, kind: NotificationKind) -> Self {
        Self {
            message: message.into(),
            kind,
            emitted_at: Utc::now(),
        }
    }
}

/// Fan-out of session notifications. Slow subscribers lose the oldest messages.
#[derive(Clone)]
pub struct NotificationHub {
    sender: broadcast::Sender<Notification>,
}

impl NotificationHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn emit(&self, notification: Notification) {
        tracing::debug!(
            kind = ?notification.kind,
            message = %notification.message,
            "Notification"
        );
        // No subscribers is fine; the notification is simply dropped.
        let _ = self.sender.send(notification);
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_in_order() {
        let hub = NotificationHub::default();
        let mut receiver = hub.subscribe();

        hub.emit(Notification::success("first"));
        hub.emit(Notification::error("second"));

        let first = receiver.recv().await.unwrap();
        assert_eq!(first.message, "first");
        assert_eq!(first.kind, NotificationKind::Success);
        assert_eq!(receiver.recv().await.unwrap().kind, NotificationKind::Error);
    }

    #[test]
    fn test_emit_without_subscribers() {
        NotificationHub::default().emit(Notification::success("nobody listening"));
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        let json = serde_json::to_value(Notification::error("x")).unwrap();
        assert_eq!(json["kind"], "error");
    }
}
