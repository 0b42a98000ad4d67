//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{health, kiosk, visits};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library Kiosk API",
        version = "1.0.0",
        description = "Self-service borrowing and return terminal"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Kiosk
        kiosk::get_state,
        kiosk::submit_scan,
        kiosk::sign_off,
        kiosk::events,
        // Visits
        visits::get_total,
    ),
    components(
        schemas(
            // Kiosk
            kiosk::StateResponse,
            kiosk::ScanRequest,
            kiosk::ScanResponse,
            crate::models::Member,
            crate::models::Loan,
            crate::models::CatalogItem,
            crate::models::ItemStatus,
            // Visits
            crate::models::visit::VisitQuery,
            crate::models::visit::VisitTotal,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "kiosk", description = "Terminal state and scan input"),
        (name = "visits", description = "Member visit statistics")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
