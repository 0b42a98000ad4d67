//! Kiosk endpoints
//!
//! Remote scanners and displays drive the same machine as the local scanner
//! input. Every scan goes through [`KioskHandle::submit_scan`], so the one
//! at-a-time rule holds across all inputs.

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use serde::{Deserialize, Serialize};
use tokio_stream::{wrappers::WatchStream, Stream, StreamExt};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    kiosk::{KioskHandle, ScanReceipt, TerminalState},
    AppState,
};

/// Current terminal state
#[derive(Serialize, ToSchema)]
pub struct StateResponse {
    /// Tagged by `state`: idle, resolving, member_identified, borrow_mode or outcome
    #[schema(value_type = Object)]
    pub state: TerminalState,
}

#[derive(Deserialize, ToSchema)]
pub struct ScanRequest {
    /// Raw scanned code, trailing newline allowed
    pub code: String,
}

#[derive(Serialize, ToSchema)]
pub struct ScanResponse {
    /// False when the scan was dropped because another was still resolving
    pub accepted: bool,
    #[schema(value_type = Object)]
    pub state: TerminalState,
}

/// Get the terminal state
#[utoipa::path(
    get,
    path = "/kiosk/state",
    tag = "kiosk",
    responses(
        (status = 200, description = "Current terminal state", body = StateResponse)
    )
)]
pub async fn get_state(State(state): State<AppState>) -> Json<StateResponse> {
    Json(StateResponse {
        state: state.kiosk.current_state(),
    })
}

/// Submit a scanned code
#[utoipa::path(
    post,
    path = "/kiosk/scans",
    tag = "kiosk",
    request_body = ScanRequest,
    responses(
        (status = 200, description = "Scan processed or dropped", body = ScanResponse),
        (status = 400, description = "Empty code", body = crate::error::ErrorResponse),
        (status = 503, description = "Kiosk stopped", body = crate::error::ErrorResponse)
    )
)]
pub async fn submit_scan(
    State(state): State<AppState>,
    Json(request): Json<ScanRequest>,
) -> AppResult<Json<ScanResponse>> {
    if request.code.trim().is_empty() {
        return Err(AppError::Validation("Scanned code is empty".to_string()));
    }

    let response = match state.kiosk.submit_scan(&request.code).await? {
        ScanReceipt::Processed(next) => ScanResponse {
            accepted: true,
            state: next,
        },
        ScanReceipt::Dropped => ScanResponse {
            accepted: false,
            state: state.kiosk.current_state(),
        },
    };

    Ok(Json(response))
}

/// End the patron's session
#[utoipa::path(
    post,
    path = "/kiosk/sign-off",
    tag = "kiosk",
    responses(
        (status = 200, description = "Terminal returned to idle", body = StateResponse),
        (status = 503, description = "Kiosk stopped", body = crate::error::ErrorResponse)
    )
)]
pub async fn sign_off(State(state): State<AppState>) -> AppResult<Json<StateResponse>> {
    let next = state.kiosk.sign_off().await?;
    Ok(Json(StateResponse { state: next }))
}

/// Stream of terminal states, one `state` event per change
#[utoipa::path(
    get,
    path = "/kiosk/events",
    tag = "kiosk",
    responses(
        (status = 200, description = "Server-sent events", content_type = "text/event-stream", body = String)
    )
)]
pub async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    Sse::new(state_events(&state.kiosk)).keep_alive(KeepAlive::default())
}

fn state_events(kiosk: &KioskHandle) -> impl Stream<Item = Result<Event, axum::Error>> {
    WatchStream::new(kiosk.subscribe())
        .map(|terminal| Event::default().event("state").json_data(terminal))
}
