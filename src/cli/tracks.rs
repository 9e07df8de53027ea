use tabled::Table;

use crate::{
    cli, error,
    management::TokenSession,
    spotify::SpotifyApi,
    success,
    types::{CachePolicy, Song},
    utils, warning,
};

const LIBRARY_READ: &str = "user-library-read";
const LIBRARY_MODIFY: &str = "user-library-modify";

fn print_songs(songs: &[Song]) {
    println!("{}", Table::new(utils::song_table_rows(songs)));
}

fn warn_missing_scope(session: &TokenSession, scope: &str) {
    if !session.granted_scope().contains(scope) {
        warning!("Scope {} was not granted, the provider will likely refuse.", scope);
    }
}

pub async fn track(ids: Vec<String>, manual: bool) {
    let session = cli::start_session(manual, CachePolicy::default()).await;
    let mut api = SpotifyApi::new(session);

    let pb = cli::spinner("Fetching songs...");
    let result = match ids.as_slice() {
        [id] => api.song(id).await.map(|song| vec![song]),
        _ => api.songs(&ids).await,
    };
    pb.finish_and_clear();

    match result {
        Ok(songs) => print_songs(&songs),
        Err(e) => error!("Failed to fetch songs: {}", e),
    }
}

pub async fn saved(search: Option<String>, manual: bool) {
    let session = cli::start_session(manual, CachePolicy::default()).await;
    warn_missing_scope(&session, LIBRARY_READ);
    let mut api = SpotifyApi::new(session);

    let pb = cli::spinner("Fetching saved songs...");
    let result = api.saved_songs().await;
    pb.finish_and_clear();

    match result {
        Ok(songs) => {
            let songs = utils::filter_songs(songs, search.as_deref());
            print_songs(&songs);
            success!("{} songs", songs.len());
        }
        Err(e) => error!("Failed to fetch saved songs: {}", e),
    }
}

pub async fn save(ids: Vec<String>, manual: bool) {
    let session = cli::start_session(manual, CachePolicy::default()).await;
    warn_missing_scope(&session, LIBRARY_MODIFY);
    let mut api = SpotifyApi::new(session);

    match api.save_songs(&ids).await {
        Ok(()) => success!("Saved {} songs to your library.", ids.len()),
        Err(e) => error!("Failed to save songs: {}", e),
    }
}
