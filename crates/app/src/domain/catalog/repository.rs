//! Catalog Repository

use sqlx::{PgConnection, Postgres, Row, postgres::PgRow, query};
use uuid::Uuid;

use crate::{
    database::{try_get_amount, try_get_optional_count},
    domain::catalog::records::{CatalogItemRecord, ItemRef},
};

const GET_COURSE_SQL: &str = include_str!("sql/get_course.sql");
const GET_EVENT_SQL: &str = include_str!("sql/get_event.sql");
const GET_DIGITAL_PRODUCT_SQL: &str = include_str!("sql/get_digital_product.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCatalogRepository;

impl PgCatalogRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Fetch a published catalog item. Unpublished items read as missing.
    pub(crate) async fn get_item(
        &self,
        conn: &mut PgConnection,
        item: ItemRef,
    ) -> Result<CatalogItemRecord, sqlx::Error> {
        let sql = match item {
            ItemRef::Course(_) => GET_COURSE_SQL,
            ItemRef::Event(_) => GET_EVENT_SQL,
            ItemRef::DigitalProduct(_) => GET_DIGITAL_PRODUCT_SQL,
        };

        let row = query::<Postgres>(sql)
            .bind(item.uuid())
            .fetch_one(&mut *conn)
            .await?;

        decode_item(&row, item)
    }
}

fn decode_item(row: &PgRow, item: ItemRef) -> Result<CatalogItemRecord, sqlx::Error> {
    let uuid: Uuid = row.try_get("uuid")?;

    Ok(CatalogItemRecord {
        item: ItemRef::new(item.item_type(), uuid),
        title: row.try_get("title")?,
        price: try_get_amount(row, "price")?,
        capacity: try_get_optional_count(row, "capacity")?,
        available_spots: try_get_optional_count(row, "available_spots")?,
        download_limit: try_get_optional_count(row, "download_limit")?,
        file_key: row.try_get("file_key")?,
    })
}
