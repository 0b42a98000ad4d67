//! Catalog items repository

use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::item::{CatalogItem, CatalogItemRow},
};

#[derive(Clone)]
pub struct ItemsRepository {
    pool: Pool<Postgres>,
}

impl ItemsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Find an item by barcode, with availability derived from open loans
    pub async fn find_by_barcode(&self, barcode: &str) -> AppResult<Option<CatalogItem>> {
        let row = sqlx::query_as::<_, CatalogItemRow>(
            r#"
            SELECT i.id, i.barcode, i.title,
                   EXISTS (
                       SELECT 1 FROM loans l
                       WHERE l.item_id = i.id AND NOT l.returned
                   ) AS borrowed
            FROM catalog_items i
            WHERE i.barcode = $1
            "#,
        )
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CatalogItem::from))
    }
}
