//! Database access layer for muslib-songs

mod songs;

pub use songs::{SongField, SongPatch, SongStore};
