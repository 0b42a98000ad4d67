//! Kiosk visit model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

/// A member identifying themselves at a terminal
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Visit {
    pub id: i32,
    pub member_id: i32,
    pub terminal_id: String,
    pub visited_at: DateTime<Utc>,
}

/// Query parameters for visit totals
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct VisitQuery {
    /// Start date (YYYY-MM-DD), inclusive
    pub start_date: Option<String>,
    /// End date (YYYY-MM-DD), inclusive
    pub end_date: Option<String>,
}

/// Visit total for a date range
#[derive(Debug, Serialize, ToSchema)]
pub struct VisitTotal {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub total: i64,
}
