//! Song workflow
//!
//! One method per API operation: validate and sanitize input, call the
//! details API when adding, delegate persistence to [`SongStore`] and turn
//! every failure into an [`ApiError`].

use std::sync::Arc;
use tracing::{info, warn};

use crate::db::{SongPatch, SongStore};
use crate::error::{ApiError, ApiResult};
use crate::models::{
    EditSongRequest, NewSong, NewSongRequest, NewSongResponse, SongFilter, SongsResponse,
    VersesResponse,
};
use crate::pagination::PageRequest;
use crate::segmenter::split_verses;
use crate::services::song_details::SongDetailsFetcher;
use crate::validation::{sanitize, validate_edit};

pub const SONG_ADDED_MESSAGE: &str = "Song successfully added";
pub const SONG_UPDATED_MESSAGE: &str = "Song successfully updated";
pub const SONG_DELETED_MESSAGE: &str = "Successfully deleted";

/// Song catalogue operations
pub struct SongService {
    store: SongStore,
    details: Arc<dyn SongDetailsFetcher>,
}

impl SongService {
    pub fn new(store: SongStore, details: Arc<dyn SongDetailsFetcher>) -> Self {
        Self { store, details }
    }

    pub fn store(&self) -> &SongStore {
        &self.store
    }

    /// Add a song, enriched with release date, link and lyrics from the details API
    pub async fn add(&self, request: NewSongRequest) -> ApiResult<NewSongResponse> {
        let group = sanitize(request.group.trim());
        let song = sanitize(request.song.trim());
        if group.trim().is_empty() || song.trim().is_empty() {
            info!("songs.add: missing group or song name");
            return Err(ApiError::BadRequest(
                "group and song are required".to_string(),
            ));
        }

        let details = self.details.fetch(&group, &song).await.map_err(|e| {
            warn!(group = %group, song = %song, "songs.add: fetch song details failed: {}", e);
            ApiError::internal()
        })?;

        let verses = split_verses(&details.text);
        let new_song = NewSong {
            group_name: group,
            song_name: song,
            release_date: details.release_date,
            link: details.link,
        };

        let song_id = self.store.add(&new_song, &verses).await.map_err(|e| {
            info!("songs.add: {}", e);
            ApiError::from(e)
        })?;

        info!(
            song_id,
            verses = verses.len(),
            "Added song {} - {}",
            new_song.group_name,
            new_song.song_name
        );

        Ok(NewSongResponse {
            message: SONG_ADDED_MESSAGE.to_string(),
            song_id,
        })
    }

    /// Delete a song and its verses
    pub async fn delete(&self, raw_id: &str) -> ApiResult<()> {
        let song_id = parse_song_id(raw_id)?;
        self.ensure_song_exists(song_id).await?;

        self.store.delete(song_id).await?;

        info!(song_id, "Deleted song");
        Ok(())
    }

    /// Apply a partial update to a song and at most one verse
    pub async fn edit(&self, raw_id: &str, mut request: EditSongRequest) -> ApiResult<()> {
        let song_id = parse_song_id(raw_id)?;

        let failures = validate_edit(&mut request);
        if !failures.is_empty() {
            let message = failures.join("; ");
            info!(song_id, "songs.edit: validation failed: {}", message);
            return Err(ApiError::BadRequest(message));
        }

        self.ensure_song_exists(song_id).await?;

        let patch = SongPatch::from(request);
        self.store.edit(song_id, &patch).await.map_err(|e| {
            info!(song_id, "songs.edit: {}", e);
            ApiError::from(e)
        })?;

        info!(
            song_id,
            fields = patch.fields.len(),
            verse = patch.verse.is_some(),
            "Updated song"
        );
        Ok(())
    }

    /// Page through songs, optionally filtered by exact group and/or song name
    pub async fn list_songs(
        &self,
        group: Option<&str>,
        song: Option<&str>,
        page: PageRequest,
    ) -> ApiResult<SongsResponse> {
        let filter = SongFilter {
            group_name: sanitize(group.unwrap_or_default()),
            song_name: sanitize(song.unwrap_or_default()),
        };

        let (songs, total_song_count) = self.store.list_songs(&filter, page).await?;

        Ok(SongsResponse {
            songs,
            total_song_count,
            page: page.page,
        })
    }

    /// Page through a song's verses
    pub async fn list_verses(&self, raw_id: &str, page: PageRequest) -> ApiResult<VersesResponse> {
        let song_id = parse_song_id(raw_id)?;
        self.ensure_song_exists(song_id).await?;

        let (verses, total_verse_count) = self.store.list_verses(song_id, page).await?;

        Ok(VersesResponse {
            verses,
            total_verse_count,
            page: page.page,
        })
    }

    async fn ensure_song_exists(&self, song_id: i64) -> ApiResult<()> {
        if self.store.song_exists(song_id).await? {
            Ok(())
        } else {
            Err(ApiError::NotFound("song does not exist".to_string()))
        }
    }
}

/// Song ids are positive integers
pub fn parse_song_id(raw: &str) -> ApiResult<i64> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => {
            info!(id = %raw, "Rejected song id");
            Err(ApiError::BadRequest("invalid song id".to_string()))
        }
    }
}
