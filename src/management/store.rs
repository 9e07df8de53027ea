use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};

use crate::{
    error::AuthError,
    types::{ClientIdentity, Credential, ScopeSet, StoreRecord},
    utils, warning,
};

const FIELD_COUNT: usize = 7;

/// Durable mapping from a client identity to its last issued credential.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Credential cached for an equivalent identity. Unreadable storage is a
    /// miss, not an error.
    async fn get(&self, identity: &ClientIdentity) -> Option<Credential>;

    /// Inserts or replaces the credential of `identity`.
    async fn put(&self, identity: &ClientIdentity, credential: &Credential)
    -> Result<(), AuthError>;
}

/// File backed [`TokenStore`].
///
/// Each record is one CSV row of seven fields: client id, client secret,
/// redirect URI, space separated scope, access token, refresh token and the
/// UTC expiry timestamp. Rows that cannot be decoded are ignored on lookup and
/// kept untouched when the file is rewritten.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

enum Row {
    Record(StoreRecord),
    Raw(String),
}

impl CredentialStore {
    pub const FILE_NAME: &'static str = "credentials.csv";

    /// Store living in `dir`, which is created if absent.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, AuthError> {
        let dir = dir.into();
        async_fs::create_dir_all(&dir)
            .await
            .map_err(|e| AuthError::StoreUnavailable(format!("{}: {}", dir.display(), e)))?;
        Ok(Self {
            path: dir.join(Self::FILE_NAME),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every decodable record, in file order.
    pub async fn records(&self) -> Result<Vec<StoreRecord>, AuthError> {
        let rows = self.load_rows().await.map_err(|e| self.unavailable(e))?;
        Ok(rows
            .into_iter()
            .filter_map(|row| match row {
                Row::Record(record) => Some(record),
                Row::Raw(_) => None,
            })
            .collect())
    }

    async fn load_rows(&self) -> std::io::Result<Vec<Row>> {
        let content = match async_fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        Ok(parse_rows(&content)
            .into_iter()
            .filter(|(text, _)| !text.trim().is_empty())
            .map(|(text, fields)| match decode_record(&fields) {
                Some(record) => Row::Record(record),
                None => Row::Raw(text),
            })
            .collect())
    }

    async fn persist(&self, rows: &[Row]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let mut content = String::new();
        for row in rows {
            match row {
                Row::Record(record) => content.push_str(&encode_record(record)?),
                Row::Raw(text) => {
                    content.push_str(text);
                    content.push('\n');
                }
            }
        }
        async_fs::write(&self.path, content).await
    }

    fn unavailable(&self, e: std::io::Error) -> AuthError {
        AuthError::StoreUnavailable(format!("{}: {}", self.path.display(), e))
    }
}

#[async_trait]
impl TokenStore for CredentialStore {
    async fn get(&self, identity: &ClientIdentity) -> Option<Credential> {
        let rows = match self.load_rows().await {
            Ok(rows) => rows,
            Err(e) => {
                warning!(
                    "Credential cache {} is unreadable, ignoring it: {}",
                    self.path.display(),
                    e
                );
                return None;
            }
        };

        rows.into_iter().find_map(|row| match row {
            Row::Record(record) if record.identity == *identity => Some(record.credential),
            _ => None,
        })
    }

    async fn put(
        &self,
        identity: &ClientIdentity,
        credential: &Credential,
    ) -> Result<(), AuthError> {
        let rows = self.load_rows().await.map_err(|e| self.unavailable(e))?;

        let record = StoreRecord {
            identity: identity.clone(),
            credential: credential.clone(),
        };

        // replace the first equivalent record in place and drop any later
        // duplicate left behind by older append-only writers
        let mut replaced = false;
        let mut updated = Vec::with_capacity(rows.len() + 1);
        for row in rows {
            match row {
                Row::Record(existing) if existing.identity == *identity => {
                    if !replaced {
                        updated.push(Row::Record(record.clone()));
                        replaced = true;
                    }
                }
                other => updated.push(other),
            }
        }
        if !replaced {
            updated.push(Row::Record(record));
        }

        self.persist(&updated).await.map_err(|e| self.unavailable(e))
    }
}

fn decode_record(fields: &StringRecord) -> Option<StoreRecord> {
    if fields.len() != FIELD_COUNT {
        return None;
    }

    let expires_at = utils::parse_expiry(fields.get(6)?)?;
    Some(StoreRecord {
        identity: ClientIdentity::new(
            fields.get(0)?,
            fields.get(1)?,
            fields.get(2)?,
            ScopeSet::parse(fields.get(3)?),
        ),
        credential: Credential {
            access_token: fields.get(4)?.to_string(),
            refresh_token: fields.get(5)?.to_string(),
            expires_at,
        },
    })
}

/// One CSV line, newline terminated.
fn encode_record(record: &StoreRecord) -> io::Result<String> {
    let identity = &record.identity;
    let credential = &record.credential;
    let scope = identity.scope.to_scope_string();
    let expires_at = utils::format_expiry(&credential.expires_at);

    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record([
        identity.client_id.as_str(),
        identity.client_secret.as_str(),
        identity.redirect_uri.as_str(),
        scope.as_str(),
        credential.access_token.as_str(),
        credential.refresh_token.as_str(),
        expires_at.as_str(),
    ])?;
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| io::Error::new(ErrorKind::InvalidData, e))
}

/// Splits CSV content into rows, returning each row's raw text with its
/// decoded fields. Quoted fields may contain separators and line breaks.
fn parse_rows(content: &str) -> Vec<(String, StringRecord)> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    let mut fields = StringRecord::new();
    loop {
        let start = reader.position().byte() as usize;
        let read = reader.read_record(&mut fields);
        let end = (reader.position().byte() as usize).min(content.len());
        let text = content
            .get(start..end)
            .unwrap_or_default()
            .trim_matches(['\r', '\n'])
            .to_string();

        match read {
            Ok(true) => rows.push((text, fields.clone())),
            Ok(false) => break,
            // keep whatever could not be parsed as a single raw row
            Err(_) => {
                let rest = content.get(start..).unwrap_or_default().trim_matches(['\r', '\n']);
                if !rest.is_empty() {
                    rows.push((rest.to_string(), StringRecord::new()));
                }
                break;
            }
        }
    }

    rows
}
