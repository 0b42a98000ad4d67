//! Visit log service

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{error::AppResult, kiosk::VisitLog, repository::Repository};

#[derive(Clone)]
pub struct VisitsService {
    repository: Repository,
    terminal_id: String,
}

impl VisitsService {
    pub fn new(repository: Repository, terminal_id: &str) -> Self {
        Self {
            repository,
            terminal_id: terminal_id.to_string(),
        }
    }

    /// Get total visit count, optionally for a date range
    pub async fn total(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> AppResult<i64> {
        self.repository.visits.total(start_date, end_date).await
    }
}

#[async_trait]
impl VisitLog for VisitsService {
    async fn record_visit(&self, member_id: i32) -> AppResult<()> {
        self.repository
            .visits
            .create(member_id, &self.terminal_id)
            .await?;
        Ok(())
    }
}
