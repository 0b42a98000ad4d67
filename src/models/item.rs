//! Catalog item model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Availability of a single-copy catalog item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ItemStatus {
    Available,
    Borrowed,
}

/// Physical library item identified by its barcode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CatalogItem {
    pub id: i32,
    pub barcode: String,
    pub title: String,
    pub status: ItemStatus,
}

/// Catalog row with availability computed from open loans
#[derive(Debug, FromRow)]
pub struct CatalogItemRow {
    pub id: i32,
    pub barcode: String,
    pub title: String,
    pub borrowed: bool,
}

impl From<CatalogItemRow> for CatalogItem {
    fn from(row: CatalogItemRow) -> Self {
        Self {
            id: row.id,
            barcode: row.barcode,
            title: row.title,
            status: if row.borrowed {
                ItemStatus::Borrowed
            } else {
                ItemStatus::Available
            },
        }
    }
}
