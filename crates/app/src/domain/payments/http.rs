//! HTTP client for a Stripe-compatible payments API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::debug;

use crate::{
    domain::{
        orders::OrderUuid,
        payments::gateway::{
            CheckoutSession, CheckoutSessionRequest, GatewayError, PaymentGateway, SessionStatus,
        },
    },
    secrets::Secret,
};

/// Connection settings for the payments API.
#[derive(Debug, Clone)]
pub struct HttpPaymentGatewayConfig {
    /// API root, e.g. `"https://api.stripe.com"`.
    pub api_base: String,

    pub secret_key: Secret,

    /// Upper bound for every outbound request.
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct HttpPaymentGateway {
    config: HttpPaymentGatewayConfig,
    http: Client,
}

impl HttpPaymentGateway {
    /// Build a client with the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(config: HttpPaymentGatewayConfig) -> Result<Self, GatewayError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { config, http })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_base.trim_end_matches('/'))
    }

    async fn parse<T: for<'de> Deserialize<'de>>(
        response: Response,
        action: &str,
    ) -> Result<T, GatewayError> {
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(GatewayError::UnexpectedResponse(format!(
                "{action} failed with status {status}: {text}"
            )));
        }

        Ok(response.json().await?)
    }

    async fn get_session(&self, reference: &str) -> Result<SessionResponse, GatewayError> {
        let response = self
            .http
            .get(self.url(&format!("/v1/checkout/sessions/{reference}")))
            .bearer_auth(self.config.secret_key.expose())
            .send()
            .await?;

        Self::parse(response, "retrieve session").await
    }
}

/// Form fields for a one-line checkout session carrying the order total.
fn checkout_form(request: &CheckoutSessionRequest) -> Vec<(&'static str, String)> {
    let order = request.order.to_string();

    vec![
        ("mode", "payment".to_string()),
        ("success_url", request.success_url.clone()),
        ("cancel_url", request.cancel_url.clone()),
        ("customer_email", request.customer_email.clone()),
        ("client_reference_id", order.clone()),
        ("metadata[order_uuid]", order.clone()),
        ("payment_intent_data[metadata][order_uuid]", order),
        ("line_items[0][quantity]", "1".to_string()),
        (
            "line_items[0][price_data][currency]",
            request.currency.to_ascii_lowercase(),
        ),
        (
            "line_items[0][price_data][unit_amount]",
            request.amount.to_string(),
        ),
        (
            "line_items[0][price_data][product_data][name]",
            request.description.clone(),
        ),
    ]
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
    #[serde(default)]
    payment_intent: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefundResponse {
    id: String,
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        let response = self
            .http
            .post(self.url("/v1/checkout/sessions"))
            .bearer_auth(self.config.secret_key.expose())
            .form(&checkout_form(request))
            .send()
            .await?;

        let session: SessionResponse = Self::parse(response, "create session").await?;

        let url = session.url.ok_or_else(|| {
            GatewayError::UnexpectedResponse("checkout session has no url".to_string())
        })?;

        debug!(order = %request.order, session = %session.id, "created checkout session");

        Ok(CheckoutSession {
            reference: session.id,
            url,
        })
    }

    async fn retrieve_session(&self, reference: &str) -> Result<SessionStatus, GatewayError> {
        let session = self.get_session(reference).await?;

        Ok(SessionStatus {
            paid: session.payment_status.as_deref() == Some("paid"),
            reference: session.id,
        })
    }

    async fn refund(&self, reference: &str, order: OrderUuid) -> Result<(), GatewayError> {
        let session = self.get_session(reference).await?;

        let payment_intent = session
            .payment_intent
            .ok_or(GatewayError::NothingToRefund)?;

        let order = order.to_string();

        let response = self
            .http
            .post(self.url("/v1/refunds"))
            .bearer_auth(self.config.secret_key.expose())
            .form(&[
                ("payment_intent", payment_intent.as_str()),
                ("metadata[order_uuid]", order.as_str()),
            ])
            .send()
            .await?;

        let refund: RefundResponse = Self::parse(response, "refund").await?;

        debug!(%order, refund = %refund.id, "requested refund");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_form_carries_correlation_and_total() {
        let order = OrderUuid::new();
        let request = CheckoutSessionRequest {
            order,
            amount: 42_50,
            currency: "GBP".to_string(),
            description: "Order".to_string(),
            customer_email: "buyer@example.com".to_string(),
            success_url: "https://shop.test/ok".to_string(),
            cancel_url: "https://shop.test/cancel".to_string(),
        };

        let form = checkout_form(&request);
        let field = |name: &str| {
            form.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.clone())
        };

        assert_eq!(field("client_reference_id"), Some(order.to_string()));
        assert_eq!(field("metadata[order_uuid]"), Some(order.to_string()));
        assert_eq!(field("line_items[0][price_data][unit_amount]").as_deref(), Some("4250"));
        assert_eq!(field("line_items[0][price_data][currency]").as_deref(), Some("gbp"));
    }

    #[test]
    fn url_joins_without_double_slash() -> Result<(), GatewayError> {
        let gateway = HttpPaymentGateway::new(HttpPaymentGatewayConfig {
            api_base: "https://payments.test/".to_string(),
            secret_key: Secret::new("sk_test"),
            timeout: Duration::from_secs(1),
        })?;

        assert_eq!(
            gateway.url("/v1/refunds"),
            "https://payments.test/v1/refunds"
        );

        Ok(())
    }
}
