//! Song workflow and external collaborators

pub mod song_details;
pub mod songs;

pub use song_details::{HttpSongDetailsClient, SongDetailsError, SongDetailsFetcher};
pub use songs::SongService;
