//! # Spotify Integration Module
//!
//! This module implements the OAuth 2.0 Authorization Code flow against the
//! Spotify accounts service and a thin wrapper around the Web API endpoints
//! that deal with songs. It is the only part of the crate that talks HTTP to
//! the provider.
//!
//! ## Architecture
//!
//! ```text
//! Application Layer (CLI, TokenSession)
//!          ↓
//! Spotify Integration Layer
//!     ├── Authorization (flow driver, token endpoint)
//!     ├── Prompts (manual paste-back, local callback listener)
//!     └── Web API facade (songs, saved songs)
//!          ↓
//! HTTP Layer (reqwest, JSON)
//! ```
//!
//! ## Core Modules
//!
//! ### Authorization
//!
//! [`auth`] drives one login through the states
//! `Idle → AwaitingUserRedirect → TokenExchange → Complete | Failed`:
//! 1. **State Generation**: A fresh 16 character alphanumeric state token
//! 2. **Authorization Request**: Directs the user to Spotify with client id,
//!    redirect URI, scopes and the state token
//! 3. **Callback Validation**: A reported `error` fails first; a missing or
//!    different `state` always fails
//! 4. **Token Exchange**: Exchanges the code at the token endpoint using HTTP
//!    Basic client authentication
//! 5. **Scope Reconciliation**: The granted scope set is compared with the
//!    requested one; a difference is reported but not fatal
//!
//! ### Prompts
//!
//! [`prompt`] provides the pluggable way the user reaches the authorization
//! URL and the redirect comes back: [`ManualPrompt`] prints the URL and reads
//! the pasted redirect URI, [`LocalServerPrompt`] opens the browser and runs a
//! temporary listener on the redirect address.
//!
//! ### Songs
//!
//! [`tracks`] maps the Web API track objects into [`crate::types::Song`]:
//! - `GET /tracks/{id}` - A single song
//! - `GET /tracks?ids=` - Several songs, 50 ids per request
//! - `GET /me/tracks` - The user's saved songs, following `next` pages
//! - `PUT /me/tracks?ids=` - Save songs to the user's library
//!
//! ## Error Types
//!
//! - **[`crate::AuthError`]** - Everything in the credential lifecycle
//! - **[`crate::ApiError`]** - Transport failures, provider error objects and
//!   unexpected bodies from the Web API
//!
//! Failed requests are surfaced immediately; nothing is retried.

pub mod auth;
pub mod prompt;
pub mod tracks;

pub use auth::{
    AuthorizationFlow, AuthorizationRequest, FlowState, HttpTokenEndpoint, TokenEndpoint,
    TokenGrant, authorization_url, issue_credential, validate_callback,
};
pub use prompt::{AuthorizationPrompt, LocalServerPrompt, ManualPrompt};

use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;

use crate::{
    config,
    error::ApiError,
    management::AccessTokenProvider,
    types::ApiErrorResponse,
};

/// Web API client attaching a fresh bearer token to every request.
pub struct SpotifyApi<P> {
    client: Client,
    base_url: String,
    tokens: P,
}

impl<P: AccessTokenProvider> SpotifyApi<P> {
    pub fn new(tokens: P) -> Self {
        Self::with_base_url(tokens, config::api_url())
    }

    pub fn with_base_url(tokens: P, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    pub fn tokens(&self) -> &P {
        &self.tokens
    }

    fn url(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, ApiError> {
        request_url(&self.base_url, segments, query)
    }

    async fn get_json<T: DeserializeOwned>(&mut self, url: Url) -> Result<T, ApiError> {
        let token = self.tokens.access_token().await?;
        let res = self.client.get(url).bearer_auth(token).send().await?;
        let res = check_status(res).await?;

        let body = res.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn put_empty(&mut self, url: Url) -> Result<(), ApiError> {
        let token = self.tokens.access_token().await?;
        let res = self
            .client
            .put(url)
            .bearer_auth(token)
            .body("")
            .send()
            .await?;
        check_status(res).await?;
        Ok(())
    }
}

/// `base` extended by percent-encoded path segments and query pairs.
fn request_url(base: &str, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, ApiError> {
    let invalid = || ApiError::InvalidUrl(base.to_string());
    let mut url = Url::parse(base).map_err(|_| invalid())?;

    url.path_segments_mut()
        .map_err(|_| invalid())?
        .pop_if_empty()
        .extend(segments);
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
}

async fn check_status(res: Response) -> Result<Response, ApiError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body = res.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
        Ok(parsed) => parsed.error.message,
        Err(_) if body.is_empty() => status.to_string(),
        Err(_) => body,
    };

    Err(ApiError::Provider {
        status: status.as_u16(),
        message,
    })
}
