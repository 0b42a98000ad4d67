//! Repository layer for database operations

pub mod items;
pub mod loans;
pub mod members;
pub mod visits;

use sqlx::{Pool, Postgres};

use crate::error::AppResult;

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub members: members::MembersRepository,
    pub items: items::ItemsRepository,
    pub loans: loans::LoansRepository,
    pub visits: visits::VisitsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            members: members::MembersRepository::new(pool.clone()),
            items: items::ItemsRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            visits: visits::VisitsRepository::new(pool.clone()),
            pool,
        }
    }

    /// Round-trip to the database, used by the readiness probe
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
