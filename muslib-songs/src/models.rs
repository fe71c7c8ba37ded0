//! Song and verse records plus HTTP request/response bodies

use serde::{Deserialize, Serialize};

/// Page used when the request omits or mangles `page`
pub const DEFAULT_PAGE: i64 = 1;
/// Page size used when the request omits or mangles `limit`
pub const DEFAULT_PAGE_SIZE: i64 = 3;

/// Stored song
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: i64,
    pub group_name: String,
    pub song_name: String,
    /// `DD.MM.YYYY`
    pub release_date: String,
    pub link: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Song about to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewSong {
    pub group_name: String,
    pub song_name: String,
    pub release_date: String,
    pub link: String,
}

/// Stored verse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verse {
    pub id: i64,
    pub song_id: i64,
    pub index: i64,
    pub text: String,
}

/// Verse about to be inserted, produced by the segmenter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVerse {
    pub index: i64,
    pub text: String,
}

/// Metadata returned by the external song details API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongDetails {
    #[serde(alias = "releaseDate")]
    pub release_date: String,
    pub link: String,
    /// Full lyrics, verses separated by blank lines
    pub text: String,
}

/// POST /api/songs
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewSongRequest {
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub song: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewSongResponse {
    pub message: String,
    pub song_id: i64,
}

/// Replacement text for one verse
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VerseUpdate {
    pub index: i64,
    pub text: String,
}

/// PATCH /api/songs/{id}
///
/// Absent fields are left untouched; a present field, even an empty string,
/// is written.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EditSongRequest {
    pub group: Option<String>,
    pub song: Option<String>,
    pub release_date: Option<String>,
    pub link: Option<String>,
    pub verse: Option<VerseUpdate>,
}

/// Body for operations that only report success
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// GET /api/songs
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SongsResponse {
    pub songs: Vec<Song>,
    pub total_song_count: i64,
    pub page: i64,
}

/// GET /api/songs/{id}/verses
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VersesResponse {
    pub verses: Vec<Verse>,
    pub total_verse_count: i64,
    pub page: i64,
}

/// Optional equality filters for song listing; empty strings mean "no filter"
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SongFilter {
    pub group_name: String,
    pub song_name: String,
}
