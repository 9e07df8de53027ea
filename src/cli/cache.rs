use tabled::Table;

use crate::{
    config, error,
    management::CredentialStore,
    success,
    types::CacheTableRow,
    utils,
};

pub async fn cache() {
    let store = match CredentialStore::open(config::cache_dir()).await {
        Ok(store) => store,
        Err(e) => error!("{}", e),
    };

    let records = match store.records().await {
        Ok(records) => records,
        Err(e) => error!("{}", e),
    };

    if records.is_empty() {
        success!("No cached credentials in {}.", store.path().display());
        return;
    }

    let rows: Vec<CacheTableRow> = records
        .into_iter()
        .map(|r| CacheTableRow {
            client_id: r.identity.client_id,
            redirect_uri: r.identity.redirect_uri,
            scope: r.identity.scope.to_scope_string(),
            expires_at: utils::format_expiry(&r.credential.expires_at),
        })
        .collect();

    println!("{}", Table::new(rows));
}
