use crate::{cli, error, types::CachePolicy};

/// Prints nothing but the token on stdout so it can be captured by scripts.
pub async fn token(manual: bool) {
    let mut session = cli::start_session(manual, CachePolicy::default()).await;

    match session.access_token().await {
        Ok(token) => println!("{}", token),
        Err(e) => error!("{}. Run streamlib auth --no-cache to log in again.", e),
    }
}
