//! Operator notifications (the CLI counterpart of toasts).

use kycportal_core::{Notification, NotificationLevel};

/// Sink for transient notifications.
pub trait Notifier {
    fn notify(&mut self, notification: &Notification);
}

/// Prints notifications to stdout and mirrors them into the log.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&mut self, notification: &Notification) {
        match notification.level {
            NotificationLevel::Success => {
                tracing::info!("{}", notification.message);
                println!("✓ {}", notification.message);
            }
            NotificationLevel::Error => {
                tracing::warn!("{}", notification.message);
                println!("✗ {}", notification.message);
            }
        }
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    pub notifications: Vec<Notification>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Notification> {
        self.notifications
            .iter()
            .filter(|n| n.level == NotificationLevel::Error)
    }

    pub fn last(&self) -> Option<&Notification> {
        self.notifications.last()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, notification: &Notification) {
        self.notifications.push(notification.clone());
    }
}
