use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use rand::{Rng, distr::Alphanumeric};

use crate::types::{Song, SongTableRow};

pub const STATE_LENGTH: usize = 16;

const EXPIRY_WRITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
// `%.f` also accepts timestamps written without a fractional part
const EXPIRY_READ_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Fresh anti-forgery state token for one authorization attempt.
pub fn generate_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LENGTH)
        .map(char::from)
        .collect()
}

/// `Authorization` header value for the token endpoint.
pub fn basic_auth_header(client_id: &str, client_secret: &str) -> String {
    let credentials = format!("{}:{}", client_id, client_secret);
    format!("Basic {}", STANDARD.encode(credentials))
}

/// `issued_at + expires_in` seconds, or `None` when the lifetime does not fit
/// a timestamp.
pub fn expiry_from(issued_at: DateTime<Utc>, expires_in: i64) -> Option<DateTime<Utc>> {
    TimeDelta::try_seconds(expires_in).and_then(|lifetime| issued_at.checked_add_signed(lifetime))
}

pub fn format_expiry(expires_at: &DateTime<Utc>) -> String {
    expires_at.format(EXPIRY_WRITE_FORMAT).to_string()
}

pub fn parse_expiry(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), EXPIRY_READ_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

pub fn format_duration(duration_ms: u64) -> String {
    let seconds = duration_ms / 1000;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

pub fn song_table_rows(songs: &[Song]) -> Vec<SongTableRow> {
    songs
        .iter()
        .map(|song| SongTableRow {
            name: song.name.clone(),
            artists: song
                .artists
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            album: song.album.name.clone(),
            duration: format_duration(song.duration_ms),
        })
        .collect()
}

pub fn filter_songs(songs: Vec<Song>, search: Option<&str>) -> Vec<Song> {
    let Some(search) = search else {
        return songs;
    };
    let needle = search.to_lowercase();

    songs
        .into_iter()
        .filter(|song| {
            song.name.to_lowercase().contains(&needle)
                || song.album.name.to_lowercase().contains(&needle)
                || song
                    .artists
                    .iter()
                    .any(|a| a.name.to_lowercase().contains(&needle))
        })
        .collect()
}
