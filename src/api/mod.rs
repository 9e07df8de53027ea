//! # API Module
//!
//! HTTP endpoints of the temporary listener that captures the OAuth redirect
//! during an interactive login.
//!
//! ## Endpoints
//!
//! - [`callback`] - Receives the provider's redirect and hands the complete
//!   callback URI to the waiting authorization flow. The flow, not this
//!   handler, validates the state token and exchanges the code, so a manual
//!   paste-back and the listener go through identical checks.
//! - [`health`] - Returns application status and version information.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use axum::{Extension, Router, routing::get};
//! use streamlib::api::{callback, health};
//!
//! let app = Router::new()
//!     .route("/health", get(health))
//!     .route("/callback", get(callback))
//!     .layer(Extension(slot));
//! ```
//!
//! ## Related Modules
//!
//! - [`crate::server`] - Binds and shuts down the listener
//! - [`crate::spotify`] - Authorization flow consuming the callback

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
