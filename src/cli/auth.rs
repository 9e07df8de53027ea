use crate::{cli, info, success, types::CachePolicy, warning};

pub async fn auth(manual: bool, check_cache: bool, update_cache: bool) {
    let policy = CachePolicy {
        check_cache,
        update_cache,
    };
    let session = cli::start_session(manual, policy).await;

    let scope = session.granted_scope();
    if scope.is_empty() {
        warning!("The provider granted no scopes; most API calls will be refused.");
    }

    success!(
        "Authenticated as client {} with {} scopes, access token valid until {}.",
        session.identity().client_id,
        scope.len(),
        session.expires_at().format("%Y-%m-%d %H:%M:%S UTC")
    );

    if !session.cache_policy().update_cache {
        info!("The credential was not written to the cache.");
    }
}
