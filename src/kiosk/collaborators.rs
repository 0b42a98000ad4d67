//! Interfaces the kiosk consumes
//!
//! Lookup, loan persistence and visit logging live outside the state machine.
//! The PostgreSQL-backed implementations are in [`crate::services`]; the
//! in-memory ones in [`super::memory`].

use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{CatalogItem, Loan, Member},
};

/// What a scanned code identifies
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Member(Member),
    Item(CatalogItem),
    Unrecognized,
}

impl Classification {
    /// Combine the member and catalog lookups for one code.
    ///
    /// A code found in both namespaces is ambiguous and fails closed.
    pub fn from_lookups(member: Option<Member>, item: Option<CatalogItem>) -> Self {
        match (member, item) {
            (Some(member), None) => Classification::Member(member),
            (None, Some(item)) => Classification::Item(item),
            (Some(member), Some(item)) => {
                tracing::warn!(
                    member_id = member.id,
                    item_id = item.id,
                    "Scanned code matches both a member and an item"
                );
                Classification::Unrecognized
            }
            (None, None) => Classification::Unrecognized,
        }
    }
}

/// Strip the end-of-scan marker and surrounding whitespace; `None` for blank scans
pub fn normalize_code(raw: &str) -> Option<&str> {
    let code = raw.trim();
    if code.is_empty() {
        None
    } else {
        Some(code)
    }
}

/// Resolves a scanned code. Total: failures classify as [`Classification::Unrecognized`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CodeClassifier: Send + Sync {
    async fn classify(&self, code: &str) -> Classification;
}

/// Authoritative store of loans
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoanLedger: Send + Sync {
    /// Open loans held by a member
    async fn active_loans(&self, member_id: i32) -> AppResult<Vec<Loan>>;

    /// The open loan on an item, whoever holds it
    async fn open_loan_for_item(&self, item_id: i32) -> AppResult<Option<Loan>>;

    /// Fails with a conflict when the item already has an open loan
    async fn create_loan(&self, member_id: i32, item_id: i32) -> AppResult<Loan>;

    /// Fails when the loan is already closed
    async fn close_loan(&self, loan_id: i32) -> AppResult<Loan>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VisitLog: Send + Sync {
    async fn record_visit(&self, member_id: i32) -> AppResult<()>;
}

/// Everything the state machine talks to
#[derive(Clone)]
pub struct Collaborators {
    pub classifier: Arc<dyn CodeClassifier>,
    pub ledger: Arc<dyn LoanLedger>,
    pub visits: Arc<dyn VisitLog>,
}

impl Collaborators {
    pub fn new(
        classifier: Arc<dyn CodeClassifier>,
        ledger: Arc<dyn LoanLedger>,
        visits: Arc<dyn VisitLog>,
    ) -> Self {
        Self {
            classifier,
            ledger,
            visits,
        }
    }

    /// Record a visit without waiting for the log
    pub fn record_visit(&self, member_id: i32) {
        let visits = Arc::clone(&self.visits);
        tokio::spawn(async move {
            if let Err(e) = visits.record_visit(member_id).await {
                tracing::warn!(member_id, error = %e, "Failed to record visit");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemStatus;

    fn member() -> Member {
        Member {
            id: 1,
            card_code: "X-1".to_string(),
            display_name: "Ada".to_string(),
            group_label: None,
            max_loans: 3,
        }
    }

    fn item() -> CatalogItem {
        CatalogItem {
            id: 9,
            barcode: "X-1".to_string(),
            title: "Dune".to_string(),
            status: ItemStatus::Available,
        }
    }

    #[test]
    fn test_from_lookups() {
        assert_eq!(
            Classification::from_lookups(Some(member()), None),
            Classification::Member(member())
        );
        assert_eq!(
            Classification::from_lookups(None, Some(item())),
            Classification::Item(item())
        );
        assert_eq!(Classification::from_lookups(None, None), Classification::Unrecognized);
    }

    #[test]
    fn test_ambiguous_code_fails_closed() {
        assert_eq!(
            Classification::from_lookups(Some(member()), Some(item())),
            Classification::Unrecognized
        );
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("M-0001\r\n"), Some("M-0001"));
        assert_eq!(normalize_code("  B-42 "), Some("B-42"));
        assert_eq!(normalize_code("\n"), None);
        assert_eq!(normalize_code(""), None);
    }

    #[tokio::test]
    async fn test_visit_failure_is_swallowed() {
        let mut visits = MockVisitLog::new();
        visits
            .expect_record_visit()
            .times(1)
            .returning(|_| Err(crate::error::AppError::Database(sqlx::Error::PoolTimedOut)));

        let collaborators = Collaborators::new(
            Arc::new(MockCodeClassifier::new()),
            Arc::new(MockLoanLedger::new()),
            Arc::new(visits),
        );
        collaborators.record_visit(1);

        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }
}
