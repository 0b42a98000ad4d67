//! In-memory library, test support
//!
//! Implements every collaborator trait over plain vectors so unit tests, the
//! scenario suite and the API tests can drive the kiosk without a database.
//! The server binary never uses it; production collaborators come from
//! [`crate::services::Services::collaborators`].

use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{
    error::{AppError, AppResult},
    models::{CatalogItem, ItemStatus, Loan, Member},
};

use super::collaborators::{Classification, CodeClassifier, LoanLedger, VisitLog};

#[derive(Default)]
struct Inner {
    members: Vec<Member>,
    items: Vec<(i32, String, String)>,
    loans: Vec<Loan>,
    visits: Vec<i32>,
}

impl Inner {
    fn item(&self, id: i32, barcode: &str, title: &str) -> CatalogItem {
        let borrowed = self.loans.iter().any(|l| l.item_id == id && l.is_open());
        CatalogItem {
            id,
            barcode: barcode.to_string(),
            title: title.to_string(),
            status: if borrowed {
                ItemStatus::Borrowed
            } else {
                ItemStatus::Available
            },
        }
    }
}

#[derive(Default)]
pub struct MemoryLibrary {
    inner: Mutex<Inner>,
}

impl MemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_member(&self, card_code: &str, display_name: &str, max_loans: i16) -> Member {
        let mut inner = self.lock();
        let member = Member {
            id: inner.members.len() as i32 + 1,
            card_code: card_code.to_string(),
            display_name: display_name.to_string(),
            group_label: None,
            max_loans,
        };
        inner.members.push(member.clone());
        member
    }

    pub fn add_item(&self, barcode: &str, title: &str) -> CatalogItem {
        let mut inner = self.lock();
        let id = inner.items.len() as i32 + 1;
        inner
            .items
            .push((id, barcode.to_string(), title.to_string()));
        inner.item(id, barcode, title)
    }

    /// Open a loan directly, bypassing the kiosk
    pub fn lend(&self, member_id: i32, item_id: i32) -> AppResult<Loan> {
        let mut inner = self.lock();
        open_loan(&mut inner, member_id, item_id)
    }

    /// Every loan ever recorded, open or closed
    pub fn loans(&self) -> Vec<Loan> {
        self.lock().loans.clone()
    }

    pub fn open_loans(&self, member_id: i32) -> Vec<Loan> {
        self.lock()
            .loans
            .iter()
            .filter(|l| l.member_id == member_id && l.is_open())
            .cloned()
            .collect()
    }

    /// Member ids in the order their visits were recorded
    pub fn visits(&self) -> Vec<i32> {
        self.lock().visits.clone()
    }
}

fn open_loan(inner: &mut Inner, member_id: i32, item_id: i32) -> AppResult<Loan> {
    if inner.loans.iter().any(|l| l.item_id == item_id && l.is_open()) {
        return Err(AppError::Conflict("Item is already borrowed".to_string()));
    }
    if !inner.items.iter().any(|(id, _, _)| *id == item_id) {
        return Err(AppError::NotFound(format!("Item with id {} not found", item_id)));
    }

    let loan = Loan {
        id: inner.loans.len() as i32 + 1,
        member_id,
        item_id,
        returned: false,
        borrowed_at: Utc::now(),
        returned_at: None,
    };
    inner.loans.push(loan.clone());
    Ok(loan)
}

#[async_trait]
impl CodeClassifier for MemoryLibrary {
    async fn classify(&self, code: &str) -> Classification {
        let inner = self.lock();
        let member = inner.members.iter().find(|m| m.card_code == code).cloned();
        let item = inner
            .items
            .iter()
            .find(|(_, barcode, _)| barcode == code)
            .map(|(id, barcode, title)| inner.item(*id, barcode, title));
        Classification::from_lookups(member, item)
    }
}

#[async_trait]
impl LoanLedger for MemoryLibrary {
    async fn active_loans(&self, member_id: i32) -> AppResult<Vec<Loan>> {
        Ok(self.open_loans(member_id))
    }

    async fn open_loan_for_item(&self, item_id: i32) -> AppResult<Option<Loan>> {
        Ok(self
            .lock()
            .loans
            .iter()
            .find(|l| l.item_id == item_id && l.is_open())
            .cloned())
    }

    async fn create_loan(&self, member_id: i32, item_id: i32) -> AppResult<Loan> {
        let mut inner = self.lock();
        open_loan(&mut inner, member_id, item_id)
    }

    async fn close_loan(&self, loan_id: i32) -> AppResult<Loan> {
        let mut inner = self.lock();
        let loan = inner
            .loans
            .iter_mut()
            .find(|l| l.id == loan_id)
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))?;

        if loan.returned {
            return Err(AppError::BusinessRule("Loan already returned".to_string()));
        }
        loan.returned = true;
        loan.returned_at = Some(Utc::now());
        Ok(loan.clone())
    }
}

#[async_trait]
impl VisitLog for MemoryLibrary {
    async fn record_visit(&self, member_id: i32) -> AppResult<()> {
        self.lock().visits.push(member_id);
        Ok(())
    }
}
