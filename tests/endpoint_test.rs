use async_trait::async_trait;
use httpmock::{Method::GET, Method::POST, Method::PUT, MockServer};
use serde_json::{Value, json};
use streamlib::{
    ApiError, AuthError,
    management::AccessTokenProvider,
    spotify::{HttpTokenEndpoint, SpotifyApi, TokenEndpoint, TokenGrant},
    types::{ClientIdentity, ScopeSet, TokenResponse},
};

fn identity() -> ClientIdentity {
    ClientIdentity::new("x", "y", "http://localhost/cb", ScopeSet::parse("read"))
}

/// Hands out the same token and counts how often it was asked for.
struct StaticToken {
    token: &'static str,
    requests: usize,
}

impl StaticToken {
    fn new(token: &'static str) -> Self {
        Self { token, requests: 0 }
    }
}

#[async_trait]
impl AccessTokenProvider for StaticToken {
    async fn access_token(&mut self) -> Result<String, AuthError> {
        self.requests += 1;
        Ok(self.token.to_string())
    }
}

struct NoToken;

#[async_trait]
impl AccessTokenProvider for NoToken {
    async fn access_token(&mut self) -> Result<String, AuthError> {
        Err(AuthError::Refresh("invalid_grant".to_string()))
    }
}

fn song_json(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "duration_ms": 215000,
        "explicit": false,
        "popularity": 61,
        "album": {
            "id": "album1",
            "name": "Low",
            "album_type": "album",
            "release_date": "1977-01-14",
            "release_date_precision": "day"
        },
        "artists": [{ "id": "artist1", "name": "David Bowie" }]
    })
}

#[tokio::test]
async fn test_code_exchange_request() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/token")
                .header("authorization", "Basic eDp5")
                .body_contains("grant_type=authorization_code")
                .body_contains("code=abc")
                .body_contains("redirect_uri=http%3A%2F%2Flocalhost%2Fcb");
            then.status(200).json_body(json!({
                "access_token": "A1",
                "token_type": "Bearer",
                "expires_in": 3600,
                "refresh_token": "R1",
                "scope": "read"
            }));
        })
        .await;

    let endpoint = HttpTokenEndpoint::new(server.url("/api/token"));
    let response = endpoint
        .request(
            &identity(),
            TokenGrant::AuthorizationCode {
                code: "abc",
                redirect_uri: "http://localhost/cb",
            },
        )
        .await
        .unwrap();

    mock.assert_async().await;
    match response {
        TokenResponse::Granted(granted) => {
            assert_eq!(granted.access_token, "A1");
            assert_eq!(granted.refresh_token.as_deref(), Some("R1"));
            assert_eq!(granted.scope.as_deref(), Some("read"));
        }
        TokenResponse::Rejected(e) => panic!("unexpected rejection: {}", e),
    }
}

#[tokio::test]
async fn test_refresh_request() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/token")
                .header("authorization", "Basic eDp5")
                .body_contains("grant_type=refresh_token")
                .body_contains("refresh_token=R1");
            then.status(200).json_body(json!({
                "access_token": "A2",
                "token_type": "Bearer",
                "expires_in": 3600
            }));
        })
        .await;

    let endpoint = HttpTokenEndpoint::new(server.url("/api/token"));
    let response = endpoint
        .request(&identity(), TokenGrant::RefreshToken { refresh_token: "R1" })
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(matches!(response, TokenResponse::Granted(g) if g.refresh_token.is_none()));
}

#[tokio::test]
async fn test_error_body_is_rejected() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/token");
            then.status(400).json_body(json!({
                "error": "invalid_grant",
                "error_description": "Invalid authorization code"
            }));
        })
        .await;

    let endpoint = HttpTokenEndpoint::new(server.url("/api/token"));
    let response = endpoint
        .request(&identity(), TokenGrant::RefreshToken { refresh_token: "R1" })
        .await
        .unwrap();

    match response {
        TokenResponse::Rejected(e) => assert_eq!(e.error, "invalid_grant"),
        TokenResponse::Granted(_) => panic!("error body classified as granted"),
    }
}

#[tokio::test]
async fn test_unreadable_body_is_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/token");
            then.status(502).body("<html>Bad Gateway</html>");
        })
        .await;

    let endpoint = HttpTokenEndpoint::new(server.url("/api/token"));
    let err = endpoint
        .request(&identity(), TokenGrant::RefreshToken { refresh_token: "R1" })
        .await
        .unwrap_err();

    assert!(err.to_string().contains("502"));
}

#[tokio::test]
async fn test_song() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/tracks/song1")
                .header("authorization", "Bearer T");
            then.status(200).json_body(song_json("song1", "Sound and Vision"));
        })
        .await;

    let mut api = SpotifyApi::with_base_url(StaticToken::new("T"), server.url("/v1/"));
    let song = api.song("song1").await.unwrap();

    mock.assert_async().await;
    assert_eq!(song.name, "Sound and Vision");
    assert_eq!(song.album.name, "Low");
    assert_eq!(song.artists[0].name, "David Bowie");
    assert!(song.artists[0].genres.is_empty());
    assert_eq!(api.tokens().requests, 1);
}

#[tokio::test]
async fn test_songs_skips_unknown_ids() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/tracks")
                .query_param("ids", "song1,missing,song2");
            then.status(200).json_body(json!({
                "tracks": [song_json("song1", "Sound and Vision"), null, song_json("song2", "Warszawa")]
            }));
        })
        .await;

    let mut api = SpotifyApi::with_base_url(StaticToken::new("T"), server.url("/v1"));
    let ids = vec!["song1".to_string(), "missing".to_string(), "song2".to_string()];
    let songs = api.songs(&ids).await.unwrap();

    mock.assert_async().await;
    let names: Vec<_> = songs.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Sound and Vision", "Warszawa"]);
}

#[tokio::test]
async fn test_songs_empty_makes_no_request() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/tracks");
            then.status(200).json_body(json!({ "tracks": [] }));
        })
        .await;

    let mut api = SpotifyApi::with_base_url(StaticToken::new("T"), server.url("/v1"));
    assert!(api.songs(&[]).await.unwrap().is_empty());
    api.save_songs(&[]).await.unwrap();

    mock.assert_hits_async(0).await;
    assert_eq!(api.tokens().requests, 0);
}

#[tokio::test]
async fn test_saved_songs_follows_pages() {
    let server = MockServer::start_async().await;
    let next = server.url("/v1/me/tracks?offset=50");
    let first = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/me/tracks")
                .query_param("limit", "50");
            then.status(200).json_body(json!({
                "items": [{ "added_at": "2024-01-01T00:00:00Z", "track": song_json("song1", "Heroes") }],
                "next": next,
                "total": 2
            }));
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/me/tracks")
                .query_param("offset", "50");
            then.status(200).json_body(json!({
                "items": [{ "added_at": "2024-01-02T00:00:00Z", "track": song_json("song2", "Warszawa") }],
                "next": null,
                "total": 2
            }));
        })
        .await;

    let mut api = SpotifyApi::with_base_url(StaticToken::new("T"), server.url("/v1"));
    let songs = api.saved_songs().await.unwrap();

    first.assert_async().await;
    second.assert_async().await;
    assert_eq!(songs.len(), 2);
    assert_eq!(songs[1].id, "song2");
}

#[tokio::test]
async fn test_save_songs() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/v1/me/tracks")
                .query_param("ids", "song1,song2")
                .header("authorization", "Bearer T");
            then.status(200);
        })
        .await;

    let mut api = SpotifyApi::with_base_url(StaticToken::new("T"), server.url("/v1"));
    api.save_songs(&["song1".to_string(), "song2".to_string()])
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_provider_error_object() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/tracks/song1");
            then.status(401).json_body(json!({
                "error": { "status": 401, "message": "The access token expired" }
            }));
        })
        .await;

    let mut api = SpotifyApi::with_base_url(StaticToken::new("T"), server.url("/v1"));
    let err = api.song("song1").await.unwrap_err();

    match err {
        ApiError::Provider { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "The access token expired");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_unexpected_body_is_decode_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/tracks/song1");
            then.status(200).json_body(json!({ "id": "song1" }));
        })
        .await;

    let mut api = SpotifyApi::with_base_url(StaticToken::new("T"), server.url("/v1"));
    assert!(matches!(
        api.song("song1").await.unwrap_err(),
        ApiError::Decode(_)
    ));
}

#[tokio::test]
async fn test_token_failure_makes_no_request() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/tracks/song1");
            then.status(200).json_body(song_json("song1", "Heroes"));
        })
        .await;

    let mut api = SpotifyApi::with_base_url(NoToken, server.url("/v1"));
    let err = api.song("song1").await.unwrap_err();

    assert!(matches!(err, ApiError::Auth(AuthError::Refresh(_))));
    mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_save_songs_encodes_ids() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/v1/me/tracks")
                .query_param("ids", "a&b=c,song2");
            then.status(200);
        })
        .await;

    let mut api = SpotifyApi::with_base_url(StaticToken::new("T"), server.url("/v1"));
    api.save_songs(&["a&b=c".to_string(), "song2".to_string()])
        .await
        .unwrap();

    // the id stays a single query value instead of adding parameters
    mock.assert_async().await;
}
