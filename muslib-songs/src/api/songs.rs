//! Song catalogue endpoints
//!
//! - `GET    /api/songs?group=&song=&page=&limit=`
//! - `POST   /api/songs`
//! - `PATCH  /api/songs/:id`
//! - `DELETE /api/songs/:id`
//! - `GET    /api/songs/:id/verses?page=&limit=`

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    EditSongRequest, MessageResponse, NewSongRequest, NewSongResponse, SongsResponse,
    VersesResponse,
};
use crate::pagination::PageRequest;
use crate::services::songs::{SONG_DELETED_MESSAGE, SONG_UPDATED_MESSAGE};
use crate::AppState;

/// Query parameters for song listing
///
/// Kept as raw strings so that a bad `page` or `limit` falls back to the
/// default instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListSongsQuery {
    pub group: Option<String>,
    pub song: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Query parameters for verse listing
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageQuery {
    fn page_request(&self) -> PageRequest {
        PageRequest::from_query(self.page.as_deref(), self.limit.as_deref())
    }
}

/// Build song routes
pub fn song_routes() -> Router<AppState> {
    Router::new()
        .route("/api/songs", get(list_songs).post(add_song))
        .route("/api/songs/:id", patch(edit_song).delete(delete_song))
        .route("/api/songs/:id/verses", get(list_verses))
}

/// GET /api/songs
pub async fn list_songs(
    State(state): State<AppState>,
    query: Option<Query<ListSongsQuery>>,
) -> ApiResult<Json<SongsResponse>> {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let page = PageRequest::from_query(query.page.as_deref(), query.limit.as_deref());

    let response = state
        .songs
        .list_songs(query.group.as_deref(), query.song.as_deref(), page)
        .await?;

    Ok(Json(response))
}

/// POST /api/songs
pub async fn add_song(
    State(state): State<AppState>,
    body: Result<Json<NewSongRequest>, JsonRejection>,
) -> ApiResult<Json<NewSongResponse>> {
    let Json(request) = body.map_err(invalid_body)?;

    let response = state.songs.add(request).await?;
    Ok(Json(response))
}

/// PATCH /api/songs/:id
pub async fn edit_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<EditSongRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(request) = body.map_err(invalid_body)?;

    state.songs.edit(&id, request).await?;
    Ok(Json(MessageResponse {
        message: SONG_UPDATED_MESSAGE.to_string(),
    }))
}

/// DELETE /api/songs/:id
pub async fn delete_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<&'static str>> {
    state.songs.delete(&id).await?;
    Ok(Json(SONG_DELETED_MESSAGE))
}

/// GET /api/songs/:id/verses
pub async fn list_verses(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Option<Query<PageQuery>>,
) -> ApiResult<Json<VersesResponse>> {
    let query = query.map(|Query(q)| q).unwrap_or_default();

    let response = state.songs.list_verses(&id, query.page_request()).await?;
    Ok(Json(response))
}

fn invalid_body(rejection: JsonRejection) -> ApiError {
    info!("Rejected request body: {}", rejection.body_text());
    ApiError::BadRequest("invalid request body".to_string())
}
