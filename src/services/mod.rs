//! Business logic services

pub mod catalog;
pub mod loans;
pub mod visits;

use std::sync::Arc;

use crate::{kiosk::Collaborators, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub repository: Repository,
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub visits: visits::VisitsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, terminal_id: &str) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            loans: loans::LoansService::new(repository.clone()),
            visits: visits::VisitsService::new(repository.clone(), terminal_id),
            repository,
        }
    }

    /// Database-backed collaborators for the kiosk machine
    pub fn collaborators(&self) -> Collaborators {
        Collaborators::new(
            Arc::new(self.catalog.clone()),
            Arc::new(self.loans.clone()),
            Arc::new(self.visits.clone()),
        )
    }
}
