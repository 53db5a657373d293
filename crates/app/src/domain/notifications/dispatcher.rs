//! Fire-and-forget notification dispatch.

use std::{fmt, sync::Arc};

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::notifications::notifier::{Notification, Notifier, Recipients};

/// Spawns deliveries so callers never wait on, or fail because of, a notifier.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    admin_emails: Arc<[String]>,
}

impl fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("admin_emails", &self.admin_emails.len())
            .finish_non_exhaustive()
    }
}

impl NotificationDispatcher {
    #[must_use]
    pub fn new(notifier: Arc<dyn Notifier>, admin_emails: Vec<String>) -> Self {
        Self {
            notifier,
            admin_emails: admin_emails.into(),
        }
    }

    fn recipients(&self, notification: &Notification) -> Recipients {
        let mut recipients = Recipients::new();

        recipients.push(notification.customer_email.clone());

        for admin in self.admin_emails.iter() {
            if !recipients.contains(admin) {
                recipients.push(admin.clone());
            }
        }

        recipients
    }

    /// Deliver in the background. Failures are logged, never returned.
    pub fn dispatch(&self, notification: Notification) -> JoinHandle<()> {
        let notifier = Arc::clone(&self.notifier);
        let recipients = self.recipients(&notification);

        tokio::spawn(async move {
            match notifier.notify(&recipients, &notification).await {
                Ok(()) => debug!(
                    kind = notification.kind.as_str(),
                    order = %notification.order,
                    "notification delivered"
                ),
                Err(error) => warn!(
                    kind = notification.kind.as_str(),
                    order = %notification.order,
                    %error,
                    "notification delivery failed"
                ),
            }
        })
    }
}
