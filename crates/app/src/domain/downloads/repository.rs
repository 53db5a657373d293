//! Downloads Repository

use sqlx::{Postgres, Row, Transaction, postgres::PgRow, query, query_scalar};

use crate::{
    database::try_get_count,
    domain::downloads::records::{DownloadLogUuid, Entitlement, EntitlementRecord},
};

const GET_ENTITLEMENT_SQL: &str = include_str!("sql/get_entitlement.sql");
const LOCK_ENTITLEMENT_SQL: &str = include_str!("sql/lock_entitlement.sql");
const COUNT_DOWNLOADS_SQL: &str = include_str!("sql/count_downloads.sql");
const LOG_DOWNLOAD_SQL: &str = include_str!("sql/log_download.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgDownloadsRepository;

impl PgDownloadsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn get_entitlement(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entitlement: &Entitlement,
    ) -> Result<Option<EntitlementRecord>, sqlx::Error> {
        fetch_entitlement(tx, GET_ENTITLEMENT_SQL, entitlement).await
    }

    /// Same as [`Self::get_entitlement`], holding the order row lock until
    /// the transaction ends so concurrent downloads count serially.
    pub(crate) async fn lock_entitlement(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entitlement: &Entitlement,
    ) -> Result<Option<EntitlementRecord>, sqlx::Error> {
        fetch_entitlement(tx, LOCK_ENTITLEMENT_SQL, entitlement).await
    }

    pub(crate) async fn count_downloads(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entitlement: &Entitlement,
    ) -> Result<u64, sqlx::Error> {
        let count: i64 = query_scalar(COUNT_DOWNLOADS_SQL)
            .bind(entitlement.user.into_uuid())
            .bind(entitlement.product.into_uuid())
            .bind(entitlement.order.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        u64::try_from(count).map_err(|e| sqlx::Error::ColumnDecode {
            index: "count".to_string(),
            source: Box::new(e),
        })
    }

    pub(crate) async fn log_download(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entitlement: &Entitlement,
    ) -> Result<DownloadLogUuid, sqlx::Error> {
        let uuid = DownloadLogUuid::new();

        query(LOG_DOWNLOAD_SQL)
            .bind(uuid.into_uuid())
            .bind(entitlement.user.into_uuid())
            .bind(entitlement.product.into_uuid())
            .bind(entitlement.order.into_uuid())
            .execute(&mut **tx)
            .await?;

        Ok(uuid)
    }
}

async fn fetch_entitlement(
    tx: &mut Transaction<'_, Postgres>,
    sql: &'static str,
    entitlement: &Entitlement,
) -> Result<Option<EntitlementRecord>, sqlx::Error> {
    query(sql)
        .bind(entitlement.user.into_uuid())
        .bind(entitlement.product.into_uuid())
        .bind(entitlement.order.into_uuid())
        .fetch_optional(&mut **tx)
        .await?
        .map(|row| decode_entitlement(&row))
        .transpose()
}

fn decode_entitlement(row: &PgRow) -> Result<EntitlementRecord, sqlx::Error> {
    Ok(EntitlementRecord {
        download_limit: try_get_count(row, "download_limit")?,
        file_key: row.try_get("file_key")?,
    })
}
