//! Visit statistics endpoint

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;

use crate::{
    error::{AppError, AppResult},
    models::visit::{VisitQuery, VisitTotal},
    AppState,
};

fn parse_date(value: Option<&String>, field: &str) -> AppResult<Option<NaiveDate>> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
                AppError::Validation(format!("Invalid {}: expected YYYY-MM-DD", field))
            })
        })
        .transpose()
}

/// Get the number of member visits for a date range
#[utoipa::path(
    get,
    path = "/visits",
    tag = "visits",
    params(VisitQuery),
    responses(
        (status = 200, description = "Visit total", body = VisitTotal),
        (status = 400, description = "Invalid date", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_total(
    State(state): State<AppState>,
    Query(query): Query<VisitQuery>,
) -> AppResult<Json<VisitTotal>> {
    let start = parse_date(query.start_date.as_ref(), "start_date")?;
    let end = parse_date(query.end_date.as_ref(), "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(AppError::Validation(
                "start_date must not be after end_date".to_string(),
            ));
        }
    }

    let total = state.services.visits.total(start, end).await?;

    Ok(Json(VisitTotal {
        start_date: query.start_date,
        end_date: query.end_date,
        total,
    }))
}
