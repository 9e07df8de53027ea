mod auth;
mod store;

pub use auth::AccessTokenProvider;
pub use auth::SessionBuilder;
pub use auth::TokenSession;
pub use store::CredentialStore;
pub use store::TokenStore;
