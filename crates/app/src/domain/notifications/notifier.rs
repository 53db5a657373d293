//! Notification delivery.

use async_trait::async_trait;
use mockall::automock;
use reqwest::Client;
use serde::Serialize;
use smallvec::SmallVec;
use thiserror::Error;
use tracing::info;

use crate::domain::orders::OrderUuid;

/// Customer plus a handful of admins fits inline.
pub type Recipients = SmallVec<[String; 4]>;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification request failed")]
    Http(#[from] reqwest::Error),

    #[error("notification endpoint rejected the message with status {0}")]
    Rejected(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    OrderCompleted,
    OrderRefunded,
}

impl NotificationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OrderCompleted => "order_completed",
            Self::OrderRefunded => "order_refunded",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub order: OrderUuid,
    pub customer_email: String,
    pub total: u64,
    pub currency: String,
}

#[automock]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one notification to every recipient.
    async fn notify(
        &self,
        recipients: &[String],
        notification: &Notification,
    ) -> Result<(), NotifyError>;
}

/// Posts notifications as JSON to a delivery service.
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    url: String,
    http: Client,
}

impl HttpNotifier {
    #[must_use]
    pub fn new(url: String, http: Client) -> Self {
        Self { url, http }
    }
}

#[derive(Serialize)]
struct DeliveryRequest<'a> {
    recipients: &'a [String],
    #[serde(flatten)]
    notification: &'a Notification,
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(
        &self,
        recipients: &[String],
        notification: &Notification,
    ) -> Result<(), NotifyError> {
        let response = self
            .http
            .post(&self.url)
            .json(&DeliveryRequest {
                recipients,
                notification,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifyError::Rejected(response.status().as_u16()));
        }

        Ok(())
    }
}

/// Logs notifications instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        recipients: &[String],
        notification: &Notification,
    ) -> Result<(), NotifyError> {
        info!(
            kind = notification.kind.as_str(),
            order = %notification.order,
            recipients = recipients.len(),
            "notification (no delivery endpoint configured)"
        );

        Ok(())
    }
}
