//! Lyric segmentation into verses

use crate::models::NewVerse;

/// Blank line separating two verses
pub const VERSE_DELIMITER: &str = "\n\n";

/// Split raw lyrics into 1-based, ordered verses
///
/// Every chunk between delimiters becomes a verse, empty chunks included.
/// Text is kept byte-for-byte; nothing is trimmed or merged.
///
/// # Examples
/// ```
/// use muslib_songs::segmenter::split_verses;
///
/// let verses = split_verses("verse one\n\nverse two");
/// assert_eq!(verses.len(), 2);
/// assert_eq!(verses[1].index, 2);
/// assert_eq!(verses[1].text, "verse two");
/// ```
pub fn split_verses(text: &str) -> Vec<NewVerse> {
    text.split(VERSE_DELIMITER)
        .enumerate()
        .map(|(i, chunk)| NewVerse {
            index: i as i64 + 1,
            text: chunk.to_string(),
        })
        .collect()
}
