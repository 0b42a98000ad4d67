//! Members repository

use sqlx::{Pool, Postgres};

use crate::{error::AppResult, models::member::Member};

#[derive(Clone)]
pub struct MembersRepository {
    pool: Pool<Postgres>,
}

impl MembersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Find the member whose card carries this code
    pub async fn find_by_card_code(&self, code: &str) -> AppResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(
            "SELECT id, card_code, display_name, group_label, max_loans FROM members WHERE card_code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }
}
