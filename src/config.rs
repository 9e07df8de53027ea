//! Configuration management for streamlib.
//!
//! This module handles loading and accessing configuration values from environment
//! variables and `.env` files. It provides a centralized way to manage the Spotify
//! application credentials, endpoint locations, the callback listener address and
//! the location of the credential cache.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (where applicable)

use dotenv;
use std::{env, io::ErrorKind, path::PathBuf};

use crate::{
    error::AuthError,
    types::{ClientIdentity, ScopeSet},
};

pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8888";

/// Every scope the Spotify Web API accepts.
pub const ALL_SCOPES: [&str; 19] = [
    "ugc-image-upload",
    "user-read-playback-state",
    "user-modify-playback-state",
    "user-read-currently-playing",
    "app-remote-control",
    "streaming",
    "playlist-read-private",
    "playlist-read-collaborative",
    "playlist-modify-private",
    "playlist-modify-public",
    "user-follow-modify",
    "user-follow-read",
    "user-read-playback-position",
    "user-top-read",
    "user-read-recently-played",
    "user-library-modify",
    "user-library-read",
    "user-read-email",
    "user-read-private",
];

/// Loads environment variables from a `.env` file in the local data directory.
///
/// Creates the directory if it doesn't exist and loads variables from
/// `streamlib/.env` under the platform-specific local data directory:
/// - Linux: `~/.local/share/streamlib/.env`
/// - macOS: `~/Library/Application Support/streamlib/.env`
/// - Windows: `%LOCALAPPDATA%/streamlib/.env`
///
/// A missing `.env` file is not an error; variables already present in the
/// environment are never overridden.
///
/// # Errors
///
/// Returns an error string if the directory cannot be created or the `.env`
/// file exists but cannot be parsed.
pub async fn load_env() -> Result<(), String> {
    let mut path = data_dir();
    path.push(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    match dotenv::from_path(&path) {
        Ok(()) => Ok(()),
        Err(dotenv::Error::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(format!("{}: {}", path.display(), e)),
    }
}

fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("streamlib");
    path
}

fn required(key: &str) -> Result<String, AuthError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AuthError::Config(format!("{} must be set", key))),
    }
}

fn optional(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Address the local OAuth callback listener binds to (`SERVER_ADDRESS`).
///
/// Must agree with the host and port of the registered redirect URI.
pub fn server_addr() -> String {
    optional("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS)
}

/// Client ID of the registered Spotify application (`SPOTIFY_API_AUTH_CLIENT_ID`).
pub fn client_id() -> Result<String, AuthError> {
    required("SPOTIFY_API_AUTH_CLIENT_ID")
}

/// Client secret of the registered Spotify application
/// (`SPOTIFY_API_AUTH_CLIENT_SECRET`).
///
/// # Security Note
///
/// The client secret is written to the credential cache as part of the
/// identity key. Keep the cache directory private.
pub fn client_secret() -> Result<String, AuthError> {
    required("SPOTIFY_API_AUTH_CLIENT_SECRET")
}

/// OAuth redirect URI (`SPOTIFY_API_REDIRECT_URI`). Must match the URI
/// registered in the Spotify application settings.
pub fn redirect_uri() -> Result<String, AuthError> {
    required("SPOTIFY_API_REDIRECT_URI")
}

/// Requested scopes (`SPOTIFY_API_AUTH_SCOPE`, space separated). Falls back to
/// [`ALL_SCOPES`] when unset or empty.
pub fn scope() -> ScopeSet {
    match env::var("SPOTIFY_API_AUTH_SCOPE") {
        Ok(value) if !value.trim().is_empty() => ScopeSet::parse(&value),
        _ => ALL_SCOPES.iter().copied().collect(),
    }
}

pub fn auth_url() -> String {
    optional("SPOTIFY_API_AUTH_URL", DEFAULT_AUTH_URL)
}

pub fn token_url() -> String {
    optional("SPOTIFY_API_TOKEN_URL", DEFAULT_TOKEN_URL)
}

pub fn api_url() -> String {
    optional("SPOTIFY_API_URL", DEFAULT_API_URL)
}

/// Directory of the credential cache (`STREAMLIB_CACHE_DIR`), by default
/// `streamlib/cache` under the local data directory.
pub fn cache_dir() -> PathBuf {
    match env::var("STREAMLIB_CACHE_DIR") {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => {
            let mut path = data_dir();
            path.push("cache");
            path
        }
    }
}

/// Assembles the client identity from the configured credentials and scope.
pub fn client_identity() -> Result<ClientIdentity, AuthError> {
    Ok(ClientIdentity::new(
        client_id()?,
        client_secret()?,
        redirect_uri()?,
        scope(),
    ))
}
