//! Visits repository

use chrono::NaiveDate;
use sqlx::{Pool, Postgres};

use crate::{error::AppResult, models::visit::Visit};

#[derive(Clone)]
pub struct VisitsRepository {
    pool: Pool<Postgres>,
}

impl VisitsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Record a member visit at a terminal
    pub async fn create(&self, member_id: i32, terminal_id: &str) -> AppResult<Visit> {
        let visit = sqlx::query_as::<_, Visit>(
            r#"
            INSERT INTO visits (member_id, terminal_id, visited_at)
            VALUES ($1, $2, NOW())
            RETURNING id, member_id, terminal_id, visited_at
            "#,
        )
        .bind(member_id)
        .bind(terminal_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(visit)
    }

    /// Count visits, optionally filtered by an inclusive date range
    pub async fn total(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> AppResult<i64> {
        let mut conditions = Vec::new();
        let mut idx = 1;

        if start_date.is_some() {
            conditions.push(format!("visited_at::date >= ${}", idx));
            idx += 1;
        }
        if end_date.is_some() {
            conditions.push(format!("visited_at::date <= ${}", idx));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!("SELECT COUNT(*) FROM visits {}", where_clause);

        let mut builder = sqlx::query_scalar::<_, i64>(&query);
        if let Some(sd) = start_date {
            builder = builder.bind(sd);
        }
        if let Some(ed) = end_date {
            builder = builder.bind(ed);
        }

        let total = builder.fetch_one(&self.pool).await?;
        Ok(total)
    }
}
