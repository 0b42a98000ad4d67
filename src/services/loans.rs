//! Loan ledger over the loans table

use async_trait::async_trait;

use crate::{error::AppResult, kiosk::LoanLedger, models::Loan, repository::Repository};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl LoanLedger for LoansService {
    async fn active_loans(&self, member_id: i32) -> AppResult<Vec<Loan>> {
        self.repository.loans.get_member_loans(member_id).await
    }

    async fn open_loan_for_item(&self, item_id: i32) -> AppResult<Option<Loan>> {
        self.repository.loans.get_open_loan_for_item(item_id).await
    }

    async fn create_loan(&self, member_id: i32, item_id: i32) -> AppResult<Loan> {
        self.repository.loans.create(member_id, item_id).await
    }

    async fn close_loan(&self, loan_id: i32) -> AppResult<Loan> {
        self.repository.loans.return_loan(loan_id).await
    }
}
