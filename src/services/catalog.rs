//! Scan classification against members and the catalog

use async_trait::async_trait;

use crate::{
    kiosk::{Classification, CodeClassifier},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl CodeClassifier for CatalogService {
    /// Look the code up as a member card and as an item barcode at once
    async fn classify(&self, code: &str) -> Classification {
        let (member, item) = tokio::join!(
            self.repository.members.find_by_card_code(code),
            self.repository.items.find_by_barcode(code),
        );

        match (member, item) {
            (Ok(member), Ok(item)) => Classification::from_lookups(member, item),
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!(error = %e, "Code lookup failed, treating scan as unrecognized");
                Classification::Unrecognized
            }
        }
    }
}
