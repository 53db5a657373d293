//! Application settings shared by the HTTP server and the operator CLI.
//!
//! Each group is a `clap` argument group so binaries can flatten exactly the
//! groups they need; every setting can also come from the environment.

use std::time::Duration;

use clap::Args;

use crate::{
    domain::{
        carts::records::CartsConfig,
        checkout::records::CheckoutConfig,
        downloads::records::DownloadsConfig,
        payments::{HttpPaymentGatewayConfig, WebhookVerifier},
        pricing::TaxPolicy,
    },
    secrets::Secret,
};

/// Database settings.
#[derive(Debug, Clone, Args)]
pub struct DatabaseSettings {
    /// `PostgreSQL` connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,
}

/// Cart store and pricing settings.
#[derive(Debug, Clone, Args)]
pub struct CartSettings {
    /// Redis connection string for cart storage
    #[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    pub redis_url: String,

    /// Cart inactivity expiry in seconds
    #[arg(long, env = "CART_TTL_SECONDS", default_value_t = 604_800)]
    pub cart_ttl_seconds: u64,

    /// Tax rate in basis points applied to cart and order subtotals
    #[arg(long, env = "TAX_RATE_BPS", default_value_t = 0)]
    pub tax_rate_bps: u32,

    /// ISO currency code orders are charged in
    #[arg(long, env = "CURRENCY", default_value = "usd")]
    pub currency: String,
}

impl CartSettings {
    #[must_use]
    pub fn tax(&self) -> TaxPolicy {
        TaxPolicy::new(self.tax_rate_bps)
    }

    #[must_use]
    pub fn carts_config(&self) -> CartsConfig {
        CartsConfig {
            ttl: Duration::from_secs(self.cart_ttl_seconds),
            tax: self.tax(),
        }
    }
}

/// Payment provider settings.
#[derive(Debug, Clone, Args)]
pub struct PaymentSettings {
    /// Payment provider API root
    #[arg(long, env = "PAYMENTS_API_BASE", default_value = "https://api.stripe.com")]
    pub payments_api_base: String,

    /// Payment provider secret API key
    #[arg(long, env = "PAYMENTS_SECRET_KEY", hide_env_values = true)]
    pub payments_secret_key: String,

    /// Shared secret for webhook signatures
    #[arg(long, env = "PAYMENTS_WEBHOOK_SECRET", hide_env_values = true)]
    pub payments_webhook_secret: String,

    /// Maximum webhook timestamp skew in seconds
    #[arg(long, env = "PAYMENTS_WEBHOOK_TOLERANCE_SECONDS", default_value_t = 300)]
    pub payments_webhook_tolerance_seconds: u64,

    /// Timeout for outbound provider calls in seconds
    #[arg(long, env = "PAYMENTS_TIMEOUT_SECONDS", default_value_t = 10)]
    pub payments_timeout_seconds: u64,

    /// Success redirect; `{ORDER_ID}` is replaced with the order UUID
    #[arg(
        long,
        env = "CHECKOUT_SUCCESS_URL",
        default_value = "http://localhost:3000/checkout/success?order={ORDER_ID}"
    )]
    pub checkout_success_url: String,

    /// Cancel redirect; `{ORDER_ID}` is replaced with the order UUID
    #[arg(
        long,
        env = "CHECKOUT_CANCEL_URL",
        default_value = "http://localhost:3000/checkout/cancel?order={ORDER_ID}"
    )]
    pub checkout_cancel_url: String,
}

impl PaymentSettings {
    #[must_use]
    pub fn gateway_config(&self) -> HttpPaymentGatewayConfig {
        HttpPaymentGatewayConfig {
            api_base: self.payments_api_base.clone(),
            secret_key: Secret::new(self.payments_secret_key.clone()),
            timeout: Duration::from_secs(self.payments_timeout_seconds),
        }
    }

    #[must_use]
    pub fn webhook_verifier(&self) -> WebhookVerifier {
        WebhookVerifier::new(
            Secret::new(self.payments_webhook_secret.clone()),
            Duration::from_secs(self.payments_webhook_tolerance_seconds),
        )
    }

    #[must_use]
    pub fn checkout_config(&self, carts: &CartSettings) -> CheckoutConfig {
        CheckoutConfig {
            currency: carts.currency.clone(),
            tax: carts.tax(),
            success_url: self.checkout_success_url.clone(),
            cancel_url: self.checkout_cancel_url.clone(),
        }
    }
}

/// Digital download settings.
#[derive(Debug, Clone, Args)]
pub struct DownloadSettings {
    /// Key used to sign download tokens
    #[arg(long, env = "DOWNLOAD_SIGNING_SECRET", hide_env_values = true)]
    pub download_signing_secret: String,

    /// Download token lifetime in seconds
    #[arg(long, env = "DOWNLOAD_TOKEN_TTL_SECONDS", default_value_t = 3600)]
    pub download_token_ttl_seconds: u64,

    /// Base URL files are served from
    #[arg(long, env = "CONTENT_BASE_URL")]
    pub content_base_url: String,
}

impl DownloadSettings {
    #[must_use]
    pub fn downloads_config(&self) -> DownloadsConfig {
        DownloadsConfig {
            secret: Secret::new(self.download_signing_secret.clone()),
            ttl: Duration::from_secs(self.download_token_ttl_seconds),
            content_base_url: self.content_base_url.clone(),
        }
    }
}

/// Notification delivery settings.
#[derive(Debug, Clone, Args)]
pub struct NotificationSettings {
    /// Delivery endpoint; notifications are only logged when unset
    #[arg(long, env = "NOTIFY_URL")]
    pub notify_url: Option<String>,

    /// Comma-separated addresses copied on every notification
    #[arg(long, env = "ADMIN_EMAILS", value_delimiter = ',')]
    pub admin_emails: Vec<String>,
}

/// Every setting the application services need.
#[derive(Debug, Clone, Args)]
pub struct AppSettings {
    #[command(flatten)]
    pub database: DatabaseSettings,

    #[command(flatten)]
    pub carts: CartSettings,

    #[command(flatten)]
    pub payments: PaymentSettings,

    #[command(flatten)]
    pub downloads: DownloadSettings,

    #[command(flatten)]
    pub notifications: NotificationSettings,
}
