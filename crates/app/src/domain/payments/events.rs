//! Provider webhook events, decoded once at the boundary.

use rustc_hash::FxHashMap;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    domain::orders::OrderUuid,
    errors::{Classify, ErrorClass},
};

#[derive(Debug, Error)]
#[error("malformed payment event")]
pub struct EventDecodeError(#[from] serde_json::Error);

impl Classify for EventDecodeError {
    fn class(&self) -> ErrorClass {
        ErrorClass::Validation
    }
}

/// The subset of provider events the order state machine reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEvent {
    CheckoutCompleted {
        order: OrderUuid,
        payment_reference: String,
    },
    PaymentFailed {
        order: OrderUuid,
    },
    ChargeRefunded {
        order: OrderUuid,
    },
    Ignored {
        kind: String,
    },
}

/// A verified webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEvent {
    pub id: String,
    pub kind: String,
    pub event: PaymentEvent,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    data: EnvelopeData,
}

#[derive(Debug, Deserialize)]
struct EnvelopeData {
    object: EventObject,
}

#[derive(Debug, Deserialize)]
struct EventObject {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    client_reference_id: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
    #[serde(default)]
    metadata: FxHashMap<String, String>,
}

impl EventObject {
    fn order(&self) -> Option<OrderUuid> {
        self.metadata
            .get("order_uuid")
            .or(self.client_reference_id.as_ref())
            .and_then(|value| value.parse().ok())
    }
}

impl PaymentEvent {
    /// Short label for logs and metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::CheckoutCompleted { .. } => "checkout_completed",
            Self::PaymentFailed { .. } => "payment_failed",
            Self::ChargeRefunded { .. } => "charge_refunded",
            Self::Ignored { .. } => "ignored",
        }
    }

    #[must_use]
    pub const fn order(&self) -> Option<OrderUuid> {
        match self {
            Self::CheckoutCompleted { order, .. }
            | Self::PaymentFailed { order }
            | Self::ChargeRefunded { order } => Some(*order),
            Self::Ignored { .. } => None,
        }
    }
}

impl ProviderEvent {
    /// Decode a raw, already verified webhook body.
    ///
    /// Known kinds without an order correlation are foreign to this system
    /// and decode as [`PaymentEvent::Ignored`].
    pub fn decode(payload: &[u8]) -> Result<Self, EventDecodeError> {
        let envelope: Envelope = serde_json::from_slice(payload)?;
        let object = &envelope.data.object;
        let ignored = || PaymentEvent::Ignored {
            kind: envelope.kind.clone(),
        };

        let event = match (envelope.kind.as_str(), object.order()) {
            (
                "checkout.session.completed" | "checkout.session.async_payment_succeeded",
                Some(order),
            ) => match (object.payment_status.as_deref(), &object.id) {
                (Some("paid"), Some(reference)) => PaymentEvent::CheckoutCompleted {
                    order,
                    payment_reference: reference.clone(),
                },
                _ => ignored(),
            },
            (
                "checkout.session.async_payment_failed"
                | "checkout.session.expired"
                | "payment_intent.payment_failed",
                Some(order),
            ) => PaymentEvent::PaymentFailed { order },
            ("charge.refunded", Some(order)) => PaymentEvent::ChargeRefunded { order },
            _ => ignored(),
        };

        Ok(Self {
            id: envelope.id,
            kind: envelope.kind,
            event,
        })
    }
}
