//! Input sanitizing and edit request validation

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::models::EditSongRequest;

/// Release date layout (`31.12.2023`)
pub const RELEASE_DATE_FORMAT: &str = "%d.%m.%Y";

// Anything that is not a word character, whitespace or Cyrillic
static DISALLOWED_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s\p{Cyrillic}]").expect("static regex"));

// chrono accepts single-digit days and months, so the shape is checked first
static RELEASE_DATE_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{2}\.[0-9]{2}\.[0-9]{4}$").expect("static regex"));

/// Strip every character outside {word characters, whitespace, Cyrillic}
///
/// Applied to free text before it reaches the store. Queries are still
/// parameterized; this only keeps stored text plain.
pub fn sanitize(input: &str) -> String {
    DISALLOWED_CHARS.replace_all(input, "").into_owned()
}

/// `DD.MM.YYYY` and a real calendar date
pub fn is_valid_release_date(value: &str) -> bool {
    RELEASE_DATE_SHAPE.is_match(value)
        && NaiveDate::parse_from_str(value, RELEASE_DATE_FORMAT).is_ok()
}

/// Absolute URL with an `http` or `https` scheme and a host
pub fn is_valid_link(value: &str) -> bool {
    match Url::parse(value) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

/// Sanitize text fields in place and collect every validation failure
///
/// An empty result means the request is valid.
pub fn validate_edit(request: &mut EditSongRequest) -> Vec<String> {
    let mut errors = Vec::new();

    if let Some(group) = request.group.as_mut() {
        *group = sanitize(group);
    }

    if let Some(song) = request.song.as_mut() {
        *song = sanitize(song);
    }

    if let Some(date) = &request.release_date {
        if !is_valid_release_date(date) {
            errors.push("invalid release date".to_string());
        }
    }

    if let Some(link) = &request.link {
        if !is_valid_link(link) {
            errors.push("invalid link".to_string());
        }
    }

    if let Some(verse) = request.verse.as_mut() {
        if verse.index <= 0 {
            errors.push("invalid verse index".to_string());
        }
        verse.text = sanitize(&verse.text);
    }

    errors
}
