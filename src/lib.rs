//! Library self-service kiosk
//!
//! Drives a borrowing and return terminal from a stream of scanned codes and
//! exposes its state over a REST JSON API.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod kiosk;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    pub kiosk: kiosk::KioskHandle,
}
