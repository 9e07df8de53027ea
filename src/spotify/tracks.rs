use reqwest::Url;

use crate::{
    error::ApiError,
    management::AccessTokenProvider,
    spotify::SpotifyApi,
    types::{SavedTracksResponse, SeveralTracksResponse, Song},
};

/// Largest number of ids the tracks endpoints accept per request.
const IDS_PER_REQUEST: usize = 50;
/// Upper bound on the capacity reserved from a page's reported `total`.
const MAX_RESERVED_SONGS: u64 = 10_000;

impl<P: AccessTokenProvider> SpotifyApi<P> {
    /// Retrieves a single song by its Spotify id.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let song = api.song("11dFghVXANMlKmJXsNCbNl").await?;
    /// println!("{} ({} ms)", song.name, song.duration_ms);
    /// ```
    pub async fn song(&mut self, id: &str) -> Result<Song, ApiError> {
        let url = self.url(&["tracks", id], &[])?;
        self.get_json(url).await
    }

    /// Retrieves several songs, in the order of `ids`. Ids the provider does
    /// not know are skipped. No request is made for an empty list.
    pub async fn songs(&mut self, ids: &[String]) -> Result<Vec<Song>, ApiError> {
        let mut songs = Vec::with_capacity(ids.len());

        for chunk in ids.chunks(IDS_PER_REQUEST) {
            let ids = chunk.join(",");
            let url = self.url(&["tracks"], &[("ids", ids.as_str())])?;
            let res: SeveralTracksResponse = self.get_json(url).await?;
            songs.extend(res.tracks.into_iter().flatten());
        }

        Ok(songs)
    }

    /// Retrieves every song saved in the user's library, following the
    /// `next` links until the last page.
    pub async fn saved_songs(&mut self) -> Result<Vec<Song>, ApiError> {
        let limit = IDS_PER_REQUEST.to_string();
        let mut url = self.url(&["me", "tracks"], &[("limit", limit.as_str())])?;
        let mut songs = Vec::new();

        loop {
            let page: SavedTracksResponse = self.get_json(url).await?;
            if songs.is_empty() {
                songs.reserve(page.total.unwrap_or_default().min(MAX_RESERVED_SONGS) as usize);
            }
            songs.extend(page.items.into_iter().map(|item| item.track));

            match page.next {
                Some(next) => {
                    url = Url::parse(&next).map_err(|_| ApiError::InvalidUrl(next))?;
                }
                None => break,
            }
        }

        Ok(songs)
    }

    /// Saves songs to the user's library. No request is made for an empty
    /// list.
    pub async fn save_songs(&mut self, ids: &[String]) -> Result<(), ApiError> {
        for chunk in ids.chunks(IDS_PER_REQUEST) {
            let ids = chunk.join(",");
            let url = self.url(&["me", "tracks"], &[("ids", ids.as_str())])?;
            self.put_empty(url).await?;
        }
        Ok(())
    }
}
