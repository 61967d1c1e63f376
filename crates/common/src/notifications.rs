use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastVariant {
    Default,
    Destructive,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub variant: ToastVariant,
    pub created_at: DateTime<Utc>,
}

impl Toast {
    pub fn new(title: &str, description: Option<String>, variant: ToastVariant) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description,
            variant,
            created_at: Utc::now(),
        }
    }

    pub fn success(title: &str, description: impl Into<String>) -> Self {
        Self::new(title, Some(description.into()), ToastVariant::Default)
    }

    pub fn failure(title: &str, description: impl Into<String>) -> Self {
        Self::new(title, Some(description.into()), ToastVariant::Destructive)
    }
}

/// Fan-out of user-visible notifications to whatever view is listening.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Toast>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Toast> {
        self.tx.subscribe()
    }

    pub fn notify(&self, toast: Toast) {
        // No subscriber is fine: nobody is looking at the screen.
        if self.tx.send(toast).is_err() {
            debug!("Toast dropped, no view subscribed");
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_toasts() {
        let notifier = Notifier::default();
        let mut rx = notifier.subscribe();

        notifier.notify(Toast::failure("Failed to Place Order", "try again"));

        let toast = rx.recv().await.unwrap();
        assert_eq!(toast.title, "Failed to Place Order");
        assert_eq!(toast.variant, ToastVariant::Destructive);
    }

    #[test]
    fn notify_without_subscribers_is_silent() {
        let notifier = Notifier::default();
        notifier.notify(Toast::success("Password Changed", "done"));
    }
}
