//! Loans repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::loan::Loan,
};

const LOAN_COLUMNS: &str = "id, member_id, item_id, returned, borrowed_at, returned_at";

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>(&format!("SELECT {} FROM loans WHERE id = $1", LOAN_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Open loans held by a member, oldest first
    pub async fn get_member_loans(&self, member_id: i32) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(&format!(
            "SELECT {} FROM loans WHERE member_id = $1 AND NOT returned ORDER BY borrowed_at, id",
            LOAN_COLUMNS
        ))
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }

    /// The open loan on an item, if any
    pub async fn get_open_loan_for_item(&self, item_id: i32) -> AppResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>(&format!(
            "SELECT {} FROM loans WHERE item_id = $1 AND NOT returned",
            LOAN_COLUMNS
        ))
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(loan)
    }

    /// Create a new loan
    ///
    /// The partial unique index on open loans rejects a second open loan for
    /// the same item, which surfaces as [`AppError::Conflict`].
    pub async fn create(&self, member_id: i32, item_id: i32) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>(&format!(
            r#"
            INSERT INTO loans (member_id, item_id, returned, borrowed_at)
            VALUES ($1, $2, FALSE, NOW())
            RETURNING {}
            "#,
            LOAN_COLUMNS
        ))
        .bind(member_id)
        .bind(item_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_sqlx(e, "Item is already borrowed"))
    }

    /// Mark a loan as returned
    pub async fn return_loan(&self, loan_id: i32) -> AppResult<Loan> {
        let closed = sqlx::query_as::<_, Loan>(&format!(
            r#"
            UPDATE loans SET returned = TRUE, returned_at = NOW()
            WHERE id = $1 AND NOT returned
            RETURNING {}
            "#,
            LOAN_COLUMNS
        ))
        .bind(loan_id)
        .fetch_optional(&self.pool)
        .await?;

        match closed {
            Some(loan) => Ok(loan),
            None => {
                // Either missing or already closed; tell them apart for the caller
                self.get_by_id(loan_id).await?;
                Err(AppError::BusinessRule("Loan already returned".to_string()))
            }
        }
    }
}
