//! User-facing notifications.
//!
//! Commands push single [`Notification`]s with `updater.send_to::<Notifications>(..)`;
//! the queue appends them. The presentation layer drains the queue.

use std::any::Any;

use chrono::{DateTime, Utc};
use origin_states::State;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Info,
            message: message.into(),
            raised_at: Utc::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
            raised_at: Utc::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NotificationKind::Error
    }
}

#[derive(Debug, Clone, Default)]
pub struct Notifications {
    queue: Vec<Notification>,
}

impl Notifications {
    pub fn push(&mut self, notification: Notification) {
        match notification.kind {
            NotificationKind::Info => log::info!("{}", notification.message),
            NotificationKind::Error => log::warn!("{}", notification.message),
        }
        self.queue.push(notification);
    }

    pub fn pending(&self) -> &[Notification] {
        &self.queue
    }

    pub fn last(&self) -> Option<&Notification> {
        self.queue.last()
    }

    pub fn drain(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.queue)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl State for Notifications {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn assign_box(&mut self, new_self: Box<dyn Any + Send>) {
        match new_self.downcast::<Notification>() {
            Ok(notification) => self.push(*notification),
            Err(other) => match other.downcast::<Self>() {
                Ok(replacement) => *self = *replacement,
                Err(_) => log::warn!("Notifications received an unknown payload"),
            },
        }
    }
}
