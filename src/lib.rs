//! Streaming service client library
//!
//! This library authenticates against the Spotify Web API using the OAuth
//! Authorization Code flow, keeps the issued credentials in a local cache and
//! maps JSON API responses into typed songs, artists and albums.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints of the local OAuth callback listener
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `error` - Error taxonomy of the credential lifecycle and the Web API facade
//! - `management` - Credential store and token session management
//! - `server` - Local HTTP server for OAuth callbacks
//! - `spotify` - Authorization flow, token endpoint and Web API facade
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use streamlib::{config, management::{CredentialStore, TokenSession}, spotify::ManualPrompt};
//!
//! #[tokio::main]
//! async fn main() -> streamlib::Res<()> {
//!     config::load_env().await?;
//!     let store = CredentialStore::open(config::cache_dir()).await?;
//!     let mut session = TokenSession::builder(config::client_identity()?)
//!         .store(Arc::new(store))
//!         .initialize(&mut ManualPrompt::stdin())
//!         .await?;
//!     let token = session.access_token().await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

pub use error::{ApiError, AuthError};

/// Boxed-error result used at the pluggable seams and in the binary. The
/// credential lifecycle itself reports through [`AuthError`].
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// `[o] message` on stdout.
///
/// ```rust,ignore
/// info!("Waiting for the authorization in your browser...");
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// `[✓] message` on stdout, for a finished command.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Reports a fatal problem on stderr and exits with status 1.
///
/// Only the command-line layer may call this; library code returns an error
/// instead.
///
/// ```rust,ignore
/// let identity = match config::client_identity() {
///     Ok(identity) => identity,
///     Err(e) => error!("{}", e),
/// };
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Recoverable anomaly on stderr: an unreadable credential cache, a granted
/// scope that differs from the requested one, a browser that would not open.
/// Stdout stays clean for `streamlib token`.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
