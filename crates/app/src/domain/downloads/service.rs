//! Download entitlement service.

use std::time::Duration;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::{info, warn};

use crate::{
    database::Db,
    domain::downloads::{
        errors::DownloadError,
        records::{DownloadGrant, DownloadRequest, DownloadsConfig, Entitlement},
        repository::PgDownloadsRepository,
        token::DownloadSigner,
    },
};

#[derive(Debug)]
pub struct PgDownloadsService {
    db: Db,
    repository: PgDownloadsRepository,
    signer: DownloadSigner,
    ttl: Duration,
    content_base_url: String,
}

impl PgDownloadsService {
    #[must_use]
    pub fn new(db: Db, config: DownloadsConfig) -> Self {
        Self {
            db,
            repository: PgDownloadsRepository::new(),
            signer: DownloadSigner::new(config.secret),
            ttl: config.ttl,
            content_base_url: config.content_base_url,
        }
    }

    fn content_location(&self, file_key: &str) -> String {
        format!(
            "{}/{}",
            self.content_base_url.trim_end_matches('/'),
            file_key.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl DownloadsService for PgDownloadsService {
    async fn authorize(&self, entitlement: Entitlement) -> Result<DownloadGrant, DownloadError> {
        let mut tx = self.db.begin().await?;

        self.repository
            .get_entitlement(&mut tx, &entitlement)
            .await?
            .ok_or(DownloadError::NotEntitled)?;

        tx.commit().await?;

        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let expires = Timestamp::now().as_second().saturating_add(ttl);
        let token = self.signer.sign(&entitlement, expires)?;

        let download_path = format!(
            "/downloads/{}?orderId={}&token={token}&expires={expires}",
            entitlement.product, entitlement.order
        );

        Ok(DownloadGrant {
            token,
            expires,
            download_path,
        })
    }

    async fn check_download_limit(&self, entitlement: Entitlement) -> Result<bool, DownloadError> {
        let mut tx = self.db.begin().await?;

        let record = self
            .repository
            .get_entitlement(&mut tx, &entitlement)
            .await?
            .ok_or(DownloadError::NotEntitled)?;

        let count = self.repository.count_downloads(&mut tx, &entitlement).await?;

        tx.commit().await?;

        Ok(count >= u64::from(record.download_limit))
    }

    async fn download(&self, request: DownloadRequest) -> Result<String, DownloadError> {
        let entitlement = request.entitlement;

        if !self
            .signer
            .verify(&entitlement, &request.token, request.expires, Timestamp::now())
        {
            return Err(DownloadError::InvalidToken);
        }

        let mut tx = self.db.begin().await?;

        let record = self
            .repository
            .lock_entitlement(&mut tx, &entitlement)
            .await?
            .ok_or(DownloadError::NotEntitled)?;

        let count = self.repository.count_downloads(&mut tx, &entitlement).await?;

        if count >= u64::from(record.download_limit) {
            warn!(
                user = %entitlement.user,
                product = %entitlement.product,
                order = %entitlement.order,
                count,
                limit = record.download_limit,
                "download limit reached"
            );

            return Err(DownloadError::LimitExceeded);
        }

        let log = self.repository.log_download(&mut tx, &entitlement).await?;

        tx.commit().await?;

        info!(
            %log,
            user = %entitlement.user,
            product = %entitlement.product,
            order = %entitlement.order,
            "download granted"
        );

        Ok(self.content_location(&record.file_key))
    }
}

#[automock]
#[async_trait]
/// Signed, rate-limited access to purchased digital products.
pub trait DownloadsService: Send + Sync {
    /// Issue a time-limited token for a product on a completed order of the user.
    async fn authorize(&self, entitlement: Entitlement) -> Result<DownloadGrant, DownloadError>;

    /// Whether the user has used up the product's downloads for this order.
    async fn check_download_limit(&self, entitlement: Entitlement) -> Result<bool, DownloadError>;

    /// Verify, count and log a download, returning the content location.
    ///
    /// The log is written before the location is returned, so a retried
    /// download consumes the limit.
    async fn download(&self, request: DownloadRequest) -> Result<String, DownloadError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        domain::{catalog::records::ItemRef, orders::OrderStatus},
        identity::UserUuid,
        secrets::Secret,
        test::{
            TestContext,
            helpers::{self, PlaceOrder},
        },
    };

    use super::*;

    fn service(ctx: &TestContext) -> PgDownloadsService {
        PgDownloadsService::new(
            Db::new(ctx.db.pool().clone()),
            DownloadsConfig {
                secret: Secret::new("download-secret"),
                ttl: Duration::from_secs(600),
                content_base_url: "https://cdn.example.test/".to_string(),
            },
        )
    }

    async fn purchase(ctx: &TestContext, limit: u32, status: &str) -> TestResult<Entitlement> {
        let user = UserUuid::new();
        let product = helpers::create_digital_product(ctx, "E-book", 9_99, limit).await?;
        let order = helpers::place_order(
            ctx,
            PlaceOrder {
                user: Some(user),
                session_key: None,
                lines: vec![(ItemRef::DigitalProduct(product), 1)],
            },
        )
        .await?;

        helpers::set_order_status(ctx, order, status).await?;

        Ok(Entitlement {
            user,
            product,
            order,
        })
    }

    async fn authorize_and_download(
        service: &PgDownloadsService,
        entitlement: Entitlement,
    ) -> Result<String, DownloadError> {
        let grant = service.authorize(entitlement).await?;

        service
            .download(DownloadRequest {
                entitlement,
                token: grant.token,
                expires: grant.expires,
            })
            .await
    }

    #[tokio::test]
    async fn authorize_issues_grant_for_completed_purchase() -> TestResult {
        let ctx = TestContext::new().await;
        let entitlement = purchase(&ctx, 3, OrderStatus::Completed.as_str()).await?;

        let grant = service(&ctx).authorize(entitlement).await?;

        assert_eq!(grant.token.len(), 64);
        assert!(grant.expires > Timestamp::now().as_second());
        assert!(
            grant
                .download_path
                .starts_with(&format!("/downloads/{}?", entitlement.product))
        );

        Ok(())
    }

    #[tokio::test]
    async fn authorize_refuses_unpaid_or_foreign_orders() -> TestResult {
        let ctx = TestContext::new().await;
        let pending = purchase(&ctx, 3, OrderStatus::Pending.as_str()).await?;
        let completed = purchase(&ctx, 3, OrderStatus::Completed.as_str()).await?;
        let service = service(&ctx);

        let unpaid = service.authorize(pending).await;
        let foreign = service
            .authorize(Entitlement {
                user: UserUuid::new(),
                ..completed
            })
            .await;

        assert!(matches!(unpaid, Err(DownloadError::NotEntitled)), "got {unpaid:?}");
        assert!(matches!(foreign, Err(DownloadError::NotEntitled)), "got {foreign:?}");

        Ok(())
    }

    #[tokio::test]
    async fn fourth_download_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let entitlement = purchase(&ctx, 3, OrderStatus::Completed.as_str()).await?;
        let service = service(&ctx);

        for _ in 0..3 {
            let location = authorize_and_download(&service, entitlement).await?;

            assert_eq!(location, "https://cdn.example.test/files/e-book.pdf");
        }

        let fourth = authorize_and_download(&service, entitlement).await;

        assert!(
            matches!(fourth, Err(DownloadError::LimitExceeded)),
            "expected LimitExceeded, got {fourth:?}"
        );
        assert!(service.check_download_limit(entitlement).await?);

        Ok(())
    }

    #[tokio::test]
    async fn limit_counts_logged_downloads() -> TestResult {
        let ctx = TestContext::new().await;
        let entitlement = purchase(&ctx, 2, OrderStatus::Completed.as_str()).await?;
        let service = service(&ctx);

        authorize_and_download(&service, entitlement).await?;

        assert!(!service.check_download_limit(entitlement).await?);

        authorize_and_download(&service, entitlement).await?;

        assert!(service.check_download_limit(entitlement).await?);

        Ok(())
    }

    #[tokio::test]
    async fn tampered_token_is_refused_without_logging() -> TestResult {
        let ctx = TestContext::new().await;
        let entitlement = purchase(&ctx, 1, OrderStatus::Completed.as_str()).await?;
        let service = service(&ctx);
        let grant = service.authorize(entitlement).await?;

        let result = service
            .download(DownloadRequest {
                entitlement,
                token: grant.token.replace(|c: char| c != '0', "0"),
                expires: grant.expires,
            })
            .await;

        assert!(matches!(result, Err(DownloadError::InvalidToken)), "got {result:?}");
        assert!(!service.check_download_limit(entitlement).await?);

        Ok(())
    }

    #[tokio::test]
    async fn refunded_order_loses_download_access() -> TestResult {
        let ctx = TestContext::new().await;
        let entitlement = purchase(&ctx, 3, OrderStatus::Completed.as_str()).await?;
        let service = service(&ctx);
        let grant = service.authorize(entitlement).await?;

        helpers::set_order_status(&ctx, entitlement.order, OrderStatus::Refunded.as_str()).await?;

        let result = service
            .download(DownloadRequest {
                entitlement,
                token: grant.token,
                expires: grant.expires,
            })
            .await;

        assert!(matches!(result, Err(DownloadError::NotEntitled)), "got {result:?}");

        Ok(())
    }
}
