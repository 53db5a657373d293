//! Payment provider integration: hosted checkout sessions, refunds and
//! signed webhook events.

pub mod events;
pub mod gateway;
pub mod http;
pub mod signature;

pub use events::{EventDecodeError, PaymentEvent, ProviderEvent};
pub use gateway::{
    CheckoutSession, CheckoutSessionRequest, GatewayError, MockPaymentGateway, PaymentGateway,
    SessionStatus,
};
pub use http::{HttpPaymentGateway, HttpPaymentGatewayConfig};
pub use signature::{SignatureError, WebhookVerifier};
