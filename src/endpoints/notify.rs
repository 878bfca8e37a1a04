use std::sync::{Mutex, PoisonError};

use crate::domain::notification::{Level, Notification};
use crate::endpoints::Notifier;

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            Level::Error => log::error!("{notification}"),
            Level::Warning => log::warn!("{notification}"),
            Level::Info | Level::Success => log::info!("{notification}"),
        }
    }
}

/// Keeps every notification in memory, oldest first.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drains the collected notifications.
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(
            &mut *self
                .notifications
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    pub fn last(&self) -> Option<Notification> {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_in_order_and_drains() {
        let notifier = CollectingNotifier::new();
        notifier.notify(Notification::info("first"));
        notifier.notify(Notification::error("second"));

        assert_eq!(notifier.last().map(|n| n.message), Some("second".to_string()));
        let drained = notifier.take();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].level, Level::Info);
        assert!(notifier.notifications().is_empty());
    }
}
