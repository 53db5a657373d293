//! Best-effort customer and admin notifications.

pub mod dispatcher;
pub mod notifier;

pub use dispatcher::NotificationDispatcher;
pub use notifier::{
    HttpNotifier, LogNotifier, MockNotifier, Notification, NotificationKind, Notifier,
    NotifyError, Recipients,
};
