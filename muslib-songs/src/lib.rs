//! muslib-songs library - song catalogue service
//!
//! Stores songs and their lyric verses, enriching new songs from an external
//! song details API.

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod pagination;
pub mod segmenter;
pub mod services;
pub mod validation;

pub use crate::error::{ApiError, ApiResult};

use crate::db::SongStore;
use crate::services::{SongDetailsFetcher, SongService};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Song workflow (store + details API)
    pub songs: Arc<SongService>,
}

impl AppState {
    /// Create new application state
    pub fn new(store: SongStore, details: Arc<dyn SongDetailsFetcher>) -> Self {
        Self {
            songs: Arc::new(SongService::new(store, details)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::song_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
