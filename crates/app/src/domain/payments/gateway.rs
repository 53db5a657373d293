//! Payment gateway seam.

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

use crate::{
    domain::orders::OrderUuid,
    errors::{Classify, ErrorClass},
};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("payment provider request failed")]
    Http(#[from] reqwest::Error),

    #[error("payment provider returned an unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("payment session has no captured payment to refund")]
    NothingToRefund,
}

impl Classify for GatewayError {
    fn class(&self) -> ErrorClass {
        match self {
            Self::Http(_) | Self::UnexpectedResponse(_) => ErrorClass::Unavailable,
            Self::NothingToRefund => ErrorClass::Conflict,
        }
    }
}

/// Request for a hosted checkout session covering one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    /// Correlation token echoed back on every webhook for this payment.
    pub order: OrderUuid,
    pub amount: u64,
    pub currency: String,
    pub description: String,
    pub customer_email: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// Hosted checkout session handed back to the customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub reference: String,
    pub url: String,
}

/// Provider-side view of a checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub reference: String,
    pub paid: bool,
}

#[automock]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a hosted checkout session for the order total.
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, GatewayError>;

    /// Fetch the current payment state of a session.
    async fn retrieve_session(&self, reference: &str) -> Result<SessionStatus, GatewayError>;

    /// Refund the payment captured by a session in full.
    async fn refund(&self, reference: &str, order: OrderUuid) -> Result<(), GatewayError>;
}
