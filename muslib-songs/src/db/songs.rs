//! Song and verse persistence
//!
//! Every value reaches SQLite as a bound parameter. Only column names taken
//! from [`SongField::column`] and placeholders are assembled dynamically.

use muslib_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::debug;

use crate::models::{EditSongRequest, NewSong, NewVerse, Song, SongFilter, Verse, VerseUpdate};
use crate::pagination::PageRequest;

const SONG_COLUMNS: &str =
    "SELECT id, group_name, song_name, release_date, link, created_at, updated_at FROM songs";

/// Song column that a partial update may rewrite
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SongField {
    GroupName(String),
    SongName(String),
    ReleaseDate(String),
    Link(String),
}

impl SongField {
    pub fn column(&self) -> &'static str {
        match self {
            SongField::GroupName(_) => "group_name",
            SongField::SongName(_) => "song_name",
            SongField::ReleaseDate(_) => "release_date",
            SongField::Link(_) => "link",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            SongField::GroupName(v)
            | SongField::SongName(v)
            | SongField::ReleaseDate(v)
            | SongField::Link(v) => v,
        }
    }
}

/// Fields present in an edit request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SongPatch {
    pub fields: Vec<SongField>,
    pub verse: Option<VerseUpdate>,
}

impl SongPatch {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.verse.is_none()
    }
}

impl From<EditSongRequest> for SongPatch {
    fn from(request: EditSongRequest) -> Self {
        let fields = [
            request.group.map(SongField::GroupName),
            request.song.map(SongField::SongName),
            request.release_date.map(SongField::ReleaseDate),
            request.link.map(SongField::Link),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self {
            fields,
            verse: request.verse,
        }
    }
}

/// Song catalogue backed by SQLite
#[derive(Debug, Clone)]
pub struct SongStore {
    pool: SqlitePool,
}

impl SongStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// True if a song with this (group, song) pair is stored
    pub async fn exists(&self, group_name: &str, song_name: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM songs WHERE group_name = ? AND song_name = ?)",
        )
        .bind(group_name)
        .bind(song_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn song_exists(&self, id: i64) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM songs WHERE id = ?)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn verse_exists(&self, song_id: i64, index: i64) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM song_verses WHERE song_id = ? AND verse_index = ?)",
        )
        .bind(song_id)
        .bind(index)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Insert a song together with all of its verses
    ///
    /// Runs in one transaction: a duplicate (group, song) pair or any failed
    /// insert rolls everything back. The UNIQUE constraint is the duplicate
    /// check and surfaces as [`Error::Conflict`].
    ///
    /// The transaction opens with a write so that concurrent writers queue on
    /// the busy timeout instead of failing a read-to-write lock upgrade.
    pub async fn add(&self, song: &NewSong, verses: &[NewVerse]) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        let song_id = sqlx::query(
            "INSERT INTO songs (group_name, song_name, release_date, link) VALUES (?, ?, ?, ?)",
        )
        .bind(&song.group_name)
        .bind(&song.song_name)
        .bind(&song.release_date)
        .bind(&song.link)
        .execute(&mut *tx)
        .await
        .map_err(conflict_on_unique)?
        .last_insert_rowid();

        for verse in verses {
            sqlx::query("INSERT INTO song_verses (song_id, verse_index, text) VALUES (?, ?, ?)")
                .bind(song_id)
                .bind(verse.index)
                .bind(&verse.text)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        debug!(song_id, verses = verses.len(), "Song stored");
        Ok(song_id)
    }

    /// Remove a song and its verses
    pub async fn delete(&self, id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM song_verses WHERE song_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM songs WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Apply a partial update
    ///
    /// Only present song fields are written. A verse update must address an
    /// existing index, otherwise [`Error::NotFound`] is returned and the
    /// transaction is dropped unwritten. An empty patch is a no-op.
    ///
    /// Every statement is a write, so the transaction never upgrades a read
    /// lock.
    pub async fn edit(&self, id: i64, patch: &SongPatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        if let Some(verse) = &patch.verse {
            let updated = sqlx::query(
                "UPDATE song_verses SET text = ? WHERE song_id = ? AND verse_index = ?",
            )
            .bind(&verse.text)
            .bind(id)
            .bind(verse.index)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if updated == 0 {
                return Err(Error::NotFound(format!(
                    "no verse found with index {}",
                    verse.index
                )));
            }
        }

        if !patch.fields.is_empty() {
            let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE songs SET ");
            for field in &patch.fields {
                query.push(field.column());
                query.push(" = ");
                query.push_bind(field.value());
                query.push(", ");
            }
            query.push("updated_at = CURRENT_TIMESTAMP WHERE id = ");
            query.push_bind(id);

            query
                .build()
                .execute(&mut *tx)
                .await
                .map_err(conflict_on_unique)?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// One page of songs ordered by id, plus the total matching the filter
    pub async fn list_songs(
        &self,
        filter: &SongFilter,
        page: PageRequest,
    ) -> Result<(Vec<Song>, i64)> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(SONG_COLUMNS);
        push_song_filter(&mut query, filter);
        query.push(" ORDER BY id LIMIT ");
        query.push_bind(page.limit);
        query.push(" OFFSET ");
        query.push_bind(page.offset());

        let songs = query
            .build()
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(song_from_row)
            .collect();

        let mut count: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM songs");
        push_song_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        Ok((songs, total))
    }

    /// One page of a song's verses ordered by index, plus the song's verse total
    pub async fn list_verses(&self, song_id: i64, page: PageRequest) -> Result<(Vec<Verse>, i64)> {
        let verses = sqlx::query(
            r#"
            SELECT id, song_id, verse_index, text
            FROM song_verses
            WHERE song_id = ?
            ORDER BY verse_index
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(song_id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(|row| Verse {
            id: row.get("id"),
            song_id: row.get("song_id"),
            index: row.get("verse_index"),
            text: row.get("text"),
        })
        .collect();

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM song_verses WHERE song_id = ?")
            .bind(song_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((verses, total))
    }
}

fn push_song_filter<'a>(query: &mut QueryBuilder<'a, Sqlite>, filter: &'a SongFilter) {
    let mut keyword = " WHERE ";
    for (column, value) in [
        ("group_name", &filter.group_name),
        ("song_name", &filter.song_name),
    ] {
        if value.is_empty() {
            continue;
        }
        query.push(keyword);
        query.push(column);
        query.push(" = ");
        query.push_bind(value.as_str());
        keyword = " AND ";
    }
}

fn song_from_row(row: &SqliteRow) -> Song {
    Song {
        id: row.get("id"),
        group_name: row.get("group_name"),
        song_name: row.get("song_name"),
        release_date: row.get("release_date"),
        link: row.get("link"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn duplicate_song() -> Error {
    Error::Conflict("song already exists".to_string())
}

fn conflict_on_unique(e: sqlx::Error) -> Error {
    let err = Error::from(e);
    if err.is_unique_violation() {
        duplicate_song()
    } else {
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use muslib_common::db::init_in_memory_database;

    async fn store() -> SongStore {
        SongStore::new(init_in_memory_database().await.expect("in-memory database"))
    }

    fn new_song(group: &str, song: &str) -> NewSong {
        NewSong {
            group_name: group.to_string(),
            song_name: song.to_string(),
            release_date: "16.07.2009".to_string(),
            link: "https://example.com".to_string(),
        }
    }

    fn verses(texts: &[&str]) -> Vec<NewVerse> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| NewVerse {
                index: i as i64 + 1,
                text: t.to_string(),
            })
            .collect()
    }

    async fn verse_count(store: &SongStore) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM song_verses")
            .fetch_one(store.pool())
            .await
            .unwrap()
    }

    async fn verse_texts(store: &SongStore, song_id: i64) -> Vec<String> {
        let (verses, _) = store
            .list_verses(song_id, PageRequest { page: 1, limit: 100 })
            .await
            .unwrap();
        verses.into_iter().map(|v| v.text).collect()
    }

    #[tokio::test]
    async fn test_add_stores_song_and_verses() {
        let store = store().await;

        let id = store
            .add(&new_song("Muse", "Uprising"), &verses(&["one", "two"]))
            .await
            .unwrap();

        assert!(id > 0);
        assert!(store.song_exists(id).await.unwrap());
        assert!(store.exists("Muse", "Uprising").await.unwrap());
        assert!(!store.exists("Muse", "Starlight").await.unwrap());
        assert_eq!(verse_texts(&store, id).await, vec!["one", "two"]);
        assert!(store.verse_exists(id, 2).await.unwrap());
        assert!(!store.verse_exists(id, 3).await.unwrap());
    }

    #[tokio::test]
    async fn test_add_duplicate_is_conflict_and_writes_nothing() {
        let store = store().await;

        store
            .add(&new_song("Muse", "Uprising"), &verses(&["one", "two"]))
            .await
            .unwrap();

        let err = store
            .add(&new_song("Muse", "Uprising"), &verses(&["x", "y", "z"]))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Conflict(_)));
        let (songs, total) = store
            .list_songs(&SongFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(songs.len(), 1);
        assert_eq!(verse_count(&store).await, 2);
    }

    #[tokio::test]
    async fn test_add_failing_verse_rolls_back_song() {
        let store = store().await;

        // Index 0 violates the verse_index CHECK constraint
        let bad = vec![
            NewVerse { index: 1, text: "ok".to_string() },
            NewVerse { index: 0, text: "bad".to_string() },
        ];

        let result = store.add(&new_song("Muse", "Uprising"), &bad).await;

        assert!(matches!(result, Err(Error::Database(_))));
        assert!(!store.exists("Muse", "Uprising").await.unwrap());
        assert_eq!(verse_count(&store).await, 0);
    }

    #[tokio::test]
    async fn test_delete_removes_verses() {
        let store = store().await;
        let keep = store
            .add(&new_song("Muse", "Starlight"), &verses(&["a"]))
            .await
            .unwrap();
        let id = store
            .add(&new_song("Muse", "Uprising"), &verses(&["one", "two"]))
            .await
            .unwrap();

        store.delete(id).await.unwrap();

        assert!(!store.song_exists(id).await.unwrap());
        assert_eq!(verse_count(&store).await, 1);
        assert_eq!(verse_texts(&store, keep).await, vec!["a"]);
    }

    #[tokio::test]
    async fn test_edit_only_present_fields() {
        let store = store().await;
        let id = store
            .add(&new_song("Muse", "Uprising"), &verses(&["one"]))
            .await
            .unwrap();

        let patch = SongPatch::from(EditSongRequest {
            release_date: Some("01.01.2010".to_string()),
            ..Default::default()
        });
        store.edit(id, &patch).await.unwrap();

        let (songs, _) = store
            .list_songs(&SongFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(songs[0].release_date, "01.01.2010");
        assert_eq!(songs[0].group_name, "Muse");
        assert_eq!(songs[0].song_name, "Uprising");
        assert_eq!(songs[0].link, "https://example.com");
    }

    #[tokio::test]
    async fn test_edit_song_fields_and_verse() {
        let store = store().await;
        let id = store
            .add(&new_song("Muse", "Uprising"), &verses(&["one", "two"]))
            .await
            .unwrap();

        let patch = SongPatch::from(EditSongRequest {
            group: Some("MUSE".to_string()),
            link: Some("https://muse.mu".to_string()),
            verse: Some(VerseUpdate { index: 2, text: "TWO".to_string() }),
            ..Default::default()
        });
        store.edit(id, &patch).await.unwrap();

        assert!(store.exists("MUSE", "Uprising").await.unwrap());
        assert_eq!(verse_texts(&store, id).await, vec!["one", "TWO"]);
    }

    #[tokio::test]
    async fn test_edit_empty_patch_is_noop() {
        let store = store().await;
        let id = store
            .add(&new_song("Muse", "Uprising"), &verses(&["one"]))
            .await
            .unwrap();

        store.edit(id, &SongPatch::default()).await.unwrap();

        assert!(store.exists("Muse", "Uprising").await.unwrap());
    }

    #[tokio::test]
    async fn test_edit_missing_verse_leaves_rows_unchanged() {
        let store = store().await;
        let id = store
            .add(&new_song("Muse", "Uprising"), &verses(&["one", "two"]))
            .await
            .unwrap();

        let patch = SongPatch::from(EditSongRequest {
            song: Some("Renamed".to_string()),
            verse: Some(VerseUpdate { index: 3, text: "three".to_string() }),
            ..Default::default()
        });
        let err = store.edit(id, &patch).await.unwrap_err();

        assert!(matches!(err, Error::NotFound(_)));
        assert!(store.exists("Muse", "Uprising").await.unwrap());
        assert!(!store.exists("Muse", "Renamed").await.unwrap());
        assert_eq!(verse_texts(&store, id).await, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_edit_rename_onto_existing_pair_is_conflict() {
        let store = store().await;
        store
            .add(&new_song("Muse", "Uprising"), &verses(&["one"]))
            .await
            .unwrap();
        let id = store
            .add(&new_song("Muse", "Starlight"), &verses(&["one"]))
            .await
            .unwrap();

        let patch = SongPatch::from(EditSongRequest {
            song: Some("Uprising".to_string()),
            ..Default::default()
        });
        let err = store.edit(id, &patch).await.unwrap_err();

        assert!(matches!(err, Error::Conflict(_)));
        assert!(store.exists("Muse", "Starlight").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_songs_pagination() {
        let store = store().await;
        for i in 1..=7 {
            store
                .add(&new_song("Band", &format!("Song {}", i)), &verses(&["v"]))
                .await
                .unwrap();
        }

        let n = 7i64;
        let limit = 3i64;
        for page in 1..=4i64 {
            let (songs, total) = store
                .list_songs(&SongFilter::default(), PageRequest { page, limit })
                .await
                .unwrap();
            let expected = limit.min((n - (page - 1) * limit).max(0));
            assert_eq!(songs.len() as i64, expected, "page {}", page);
            assert_eq!(total, n);
        }

        let (songs, _) = store
            .list_songs(&SongFilter::default(), PageRequest { page: 2, limit: 3 })
            .await
            .unwrap();
        let names: Vec<&str> = songs.iter().map(|s| s.song_name.as_str()).collect();
        assert_eq!(names, vec!["Song 4", "Song 5", "Song 6"]);
    }

    #[tokio::test]
    async fn test_list_songs_filters_and_filtered_total() {
        let store = store().await;
        store.add(&new_song("Muse", "Uprising"), &[]).await.unwrap();
        store.add(&new_song("Muse", "Starlight"), &[]).await.unwrap();
        store.add(&new_song("Queen", "Innuendo"), &[]).await.unwrap();

        let by_group = SongFilter {
            group_name: "Muse".to_string(),
            ..Default::default()
        };
        let (songs, total) = store
            .list_songs(&by_group, PageRequest { page: 1, limit: 1 })
            .await
            .unwrap();
        assert_eq!(songs.len(), 1);
        assert_eq!(total, 2);

        let both = SongFilter {
            group_name: "Muse".to_string(),
            song_name: "Starlight".to_string(),
        };
        let (songs, total) = store
            .list_songs(&both, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(songs[0].song_name, "Starlight");

        let by_song = SongFilter {
            song_name: "Innuendo".to_string(),
            ..Default::default()
        };
        let (songs, total) = store
            .list_songs(&by_song, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(songs[0].group_name, "Queen");
    }

    #[tokio::test]
    async fn test_list_verses_pagination() {
        let store = store().await;
        let id = store
            .add(&new_song("Muse", "Uprising"), &verses(&["1", "2", "3", "4", "5"]))
            .await
            .unwrap();
        store.add(&new_song("Muse", "Starlight"), &verses(&["x"])).await.unwrap();

        let (page2, total) = store
            .list_verses(id, PageRequest { page: 2, limit: 2 })
            .await
            .unwrap();
        assert_eq!(total, 5);
        let indices: Vec<i64> = page2.iter().map(|v| v.index).collect();
        assert_eq!(indices, vec![3, 4]);
        assert!(page2.iter().all(|v| v.song_id == id));

        let (past_end, total) = store
            .list_verses(id, PageRequest { page: 9, limit: 2 })
            .await
            .unwrap();
        assert!(past_end.is_empty());
        assert_eq!(total, 5);
    }

    async fn file_store() -> (SongStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let pool = muslib_common::db::init_database(&dir.path().join("muslib.db"))
            .await
            .expect("file database");
        (SongStore::new(pool), dir)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_of_distinct_songs_all_succeed() {
        let (store, _dir) = file_store().await;

        let tasks: Vec<_> = (0..40)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .add(&new_song("Band", &format!("Song {}", i)), &verses(&["a", "b"]))
                        .await
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().expect("distinct add");
        }

        let (_, total) = store
            .list_songs(&SongFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(total, 40);
        assert_eq!(verse_count(&store).await, 80);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_of_same_pair_yield_one_song() {
        let (store, _dir) = file_store().await;

        let tasks: Vec<_> = (0..10)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .add(&new_song("Muse", "Uprising"), &verses(&["one", "two"]))
                        .await
                })
            })
            .collect();

        let mut added = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => added += 1,
                Err(Error::Conflict(_)) => {}
                Err(other) => panic!("unexpected error: {}", other),
            }
        }

        assert_eq!(added, 1);
        assert_eq!(verse_count(&store).await, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_edits_of_distinct_songs_all_succeed() {
        let (store, _dir) = file_store().await;

        let mut ids = Vec::new();
        for i in 0..20 {
            let id = store
                .add(&new_song("Band", &format!("Song {}", i)), &verses(&["one", "two"]))
                .await
                .unwrap();
            ids.push(id);
        }

        let tasks: Vec<_> = ids
            .iter()
            .map(|&id| {
                let store = store.clone();
                tokio::spawn(async move {
                    let patch = SongPatch::from(EditSongRequest {
                        link: Some(format!("https://example.com/{}", id)),
                        verse: Some(VerseUpdate { index: 2, text: format!("edited {}", id) }),
                        ..Default::default()
                    });
                    store.edit(id, &patch).await
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().expect("distinct edit");
        }

        for id in ids {
            assert_eq!(
                verse_texts(&store, id).await,
                vec!["one".to_string(), format!("edited {}", id)]
            );
        }
    }
}
