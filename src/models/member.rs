//! Member (patron) model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A patron allowed to use the kiosk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Member {
    pub id: i32,
    /// Code printed on the member card
    pub card_code: String,
    pub display_name: String,
    /// Class or group, e.g. "5B"
    pub group_label: Option<String>,
    /// Maximum number of loans the member may hold at once
    pub max_loans: i16,
}

impl Member {
    /// Borrow limit as a count, never below one
    pub fn borrow_limit(&self) -> usize {
        self.max_loans.max(1) as usize
    }
}
