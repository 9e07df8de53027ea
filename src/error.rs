//! Error taxonomy for the credential lifecycle and the Web API facade.
//!
//! Lookups that can legitimately miss (the credential cache) return `Option`
//! and never produce one of these errors; everything here is a genuine
//! failure that the caller has to act on.

use thiserror::Error;

/// Failures of the OAuth credential lifecycle.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The provider denied the request, or the callback did not carry the
    /// state token issued for this attempt. The flow has to be restarted.
    #[error("authorization failed: {0}")]
    Authorization(String),

    /// Exchanging the authorization code for tokens failed.
    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    /// Refreshing an expired access token failed. The session that raised it
    /// will not refresh again; log in anew.
    #[error("token refresh failed: {0}")]
    Refresh(String),

    /// The credential cache could not be written (or rewritten).
    #[error("credential store unavailable: {0}")]
    StoreUnavailable(String),

    /// The authorization prompt could not deliver a callback URI.
    #[error("authorization prompt failed: {0}")]
    Prompt(String),

    /// A required configuration value is missing.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Failures of the REST wrappers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The Web API answered with an error object.
    #[error("provider answered {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
}
