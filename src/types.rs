use std::{collections::BTreeSet, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabled::Tabled;

/// A set of OAuth scopes.
///
/// Scopes travel over the wire as a single space separated string. Two sets
/// are equal regardless of the order in which the scopes were written, so
/// `"a b"` and `"b a"` describe the same grant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ScopeSet(BTreeSet<String>);

impl ScopeSet {
    pub fn parse(scope: &str) -> Self {
        scope.split_whitespace().collect()
    }

    /// Space separated form, sorted.
    pub fn to_scope_string(&self) -> String {
        self.iter().collect::<Vec<_>>().join(" ")
    }

    pub fn contains(&self, scope: &str) -> bool {
        self.0.contains(scope)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ScopeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        ScopeSet(
            iter.into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty())
                .collect(),
        )
    }
}

impl fmt::Display for ScopeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_scope_string())
    }
}

/// The registered application plus the scopes it asks for.
///
/// Equality compares all four fields, the scope as a set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIdentity {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scope: ScopeSet,
}

impl ClientIdentity {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
        scope: ScopeSet,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            scope,
        }
    }

    pub fn with_scope(&self, scope: ScopeSet) -> Self {
        Self {
            scope,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    /// Usable strictly before `expires_at`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// One row of the credential cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreRecord {
    pub identity: ClientIdentity,
    pub credential: Credential,
}

/// Controls how a session uses the credential cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Look for a cached credential before asking the user to log in.
    pub check_cache: bool,
    /// Write the credential back after every exchange or refresh.
    pub update_cache: bool,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            check_cache: true,
            update_cache: true,
        }
    }
}

/// The provider granted a different scope set than the one requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeMismatch {
    pub requested: ScopeSet,
    pub granted: ScopeSet,
}

impl fmt::Display for ScopeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "requested [{}] but the provider granted [{}]",
            self.requested, self.granted
        )
    }
}

/// Outcome of a successful code exchange or refresh.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub credential: Credential,
    pub granted_scope: ScopeSet,
    pub scope_mismatch: Option<ScopeMismatch>,
}

/// Body of a successful token endpoint answer.
#[derive(Debug, Clone, Deserialize)]
pub struct GrantedToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Error object of the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub error: String,
    pub error_description: Option<String>,
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(description) => write!(f, "{} ({})", self.error, description),
            None => f.write_str(&self.error),
        }
    }
}

#[derive(Debug, Clone)]
pub enum TokenResponse {
    Granted(GrantedToken),
    Rejected(ProviderError),
}

impl TokenResponse {
    /// Classifies a token endpoint body. An `error` field always wins; a
    /// success body missing one of its required fields is an error.
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        if let Some(error) = value.get("error") {
            let error = match error {
                Value::String(code) => code.clone(),
                other => other.to_string(),
            };
            let error_description = value
                .get("error_description")
                .and_then(Value::as_str)
                .map(str::to_string);
            return Ok(TokenResponse::Rejected(ProviderError {
                error,
                error_description,
            }));
        }

        serde_json::from_value(value).map(TokenResponse::Granted)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    pub album_type: String,
    pub release_date: String,
    pub release_date_precision: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    pub name: String,
    pub duration_ms: u64,
    pub explicit: bool,
    pub album: Album,
    pub artists: Vec<Artist>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeveralTracksResponse {
    // unknown ids come back as null
    pub tracks: Vec<Option<Song>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedTracksResponse {
    pub items: Vec<SavedTrack>,
    pub next: Option<String>,
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedTrack {
    pub added_at: String,
    pub track: Song,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub status: u16,
    pub message: String,
}

#[derive(Tabled)]
pub struct SongTableRow {
    pub name: String,
    pub artists: String,
    pub album: String,
    pub duration: String,
}

#[derive(Tabled)]
pub struct CacheTableRow {
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: String,
    pub expires_at: String,
}
