//! # CLI Module
//!
//! Command implementations of the `streamlib` binary. Each command loads the
//! client identity from the configuration, starts a [`TokenSession`] and
//! either reports on the credential itself or hands the session to the Web
//! API facade.
//!
//! ## Commands
//!
//! ### Authentication
//!
//! - [`auth`] - Logs in interactively (or adopts a cached credential) and
//!   writes the result to the credential cache
//! - [`token`] - Prints a valid access token, refreshing it if needed
//! - [`cache`] - Lists the identities held in the credential cache
//!
//! ### Songs
//!
//! - [`track`] - Shows songs by id
//! - [`saved`] - Lists the songs saved in the user's library
//! - [`save`] - Saves songs to the user's library
//!
//! ## Usage Patterns
//!
//! ```bash
//! streamlib auth                  # log in through the browser
//! streamlib auth --manual         # paste the redirect URI instead
//! streamlib token                 # print a valid access token
//! streamlib saved --search bowie  # filter saved songs
//! ```
//!
//! Fatal problems are reported with the crate's `error!` macro, which ends
//! the process.

mod auth;
mod cache;
mod token;
mod tracks;

pub use auth::auth;
pub use cache::cache;
pub use token::token;
pub use tracks::save;
pub use tracks::saved;
pub use tracks::track;

use std::{sync::Arc, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    config, error,
    management::{CredentialStore, TokenSession},
    spotify::{AuthorizationPrompt, LocalServerPrompt, ManualPrompt},
    types::CachePolicy,
    warning,
};

/// Starts a session from the configured identity, reusing the credential
/// cache according to `policy`.
pub(crate) async fn start_session(manual: bool, policy: CachePolicy) -> TokenSession {
    let identity = match config::client_identity() {
        Ok(identity) => identity,
        Err(e) => error!("{}. Check the .env file of streamlib.", e),
    };

    let mut builder = TokenSession::builder(identity).cache_policy(policy);
    match CredentialStore::open(config::cache_dir()).await {
        Ok(store) => builder = builder.store(Arc::new(store)),
        Err(e) => warning!("Continuing without credential cache: {}", e),
    }

    let mut prompt: Box<dyn AuthorizationPrompt> = if manual {
        Box::new(ManualPrompt::stdin())
    } else {
        Box::new(LocalServerPrompt::from_env())
    };

    match builder.initialize(prompt.as_mut()).await {
        Ok(session) => {
            if let Some(mismatch) = session.scope_mismatch() {
                warning!("Continuing with the granted scope: {}", mismatch);
            }
            session
        }
        Err(e) => error!("Authentication failed: {}", e),
    }
}

pub(crate) fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}
