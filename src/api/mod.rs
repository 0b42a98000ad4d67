//! API handlers for the kiosk REST endpoints

pub mod health;
pub mod kiosk;
pub mod openapi;
pub mod visits;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

/// API v1 routes, to be nested under `/api/v1`
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Kiosk
        .route("/kiosk/state", get(kiosk::get_state))
        .route("/kiosk/scans", post(kiosk::submit_scan))
        .route("/kiosk/sign-off", post(kiosk::sign_off))
        .route("/kiosk/events", get(kiosk::events))
        // Visits
        .route("/visits", get(visits::get_total))
        .with_state(state)
}
