//! TVmaze API client tests
//!
//! Tests endpoint paths, payload decoding and error mapping.

use mockito::{Matcher, Server};
use showdeck::api::TvMazeClient;
use showdeck::net::{NetworkError, RequestCtx, TransportError};
use tokio_util::sync::CancellationToken;

// =============================================================================
// Decoding
// =============================================================================

#[tokio::test]
async fn test_shows_page_parses_results() {
    let mut server = Server::new_async().await;

    let body = r#"[
        {
            "id": 1,
            "url": "https://www.tvmaze.com/shows/1/under-the-dome",
            "name": "Under the Dome",
            "type": "Scripted",
            "language": "English",
            "genres": ["Drama", "Science-Fiction", "Thriller"],
            "status": "Ended",
            "runtime": 60,
            "premiered": "2013-06-24",
            "rating": {"average": 6.5},
            "weight": 99,
            "network": {"id": 2, "name": "CBS", "country": {"name": "United States", "code": "US", "timezone": "America/New_York"}},
            "webChannel": null,
            "externals": {"tvrage": 25988, "thetvdb": 264492, "imdb": "tt1553656"},
            "image": {"medium": "https://static.tvmaze.com/1.jpg", "original": "https://static.tvmaze.com/1o.jpg"},
            "summary": "<p>Under the Dome</p>",
            "updated": 1704794065,
            "_links": {"self": {"href": "https://api.tvmaze.com/shows/1"}}
        },
        {
            "id": 2,
            "name": "Person of Interest",
            "genres": ["Action", "Crime"],
            "rating": {"average": null}
        }
    ]"#;

    let mock = server
        .mock("GET", "/shows")
        .match_query(Matcher::UrlEncoded("page".into(), "0".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await;

    let client = TvMazeClient::with_base_url(server.url());
    let res = client.shows_page(0, &RequestCtx::new()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(res.status, Some(200));
    assert_eq!(res.data.len(), 2);

    let dome = &res.data[0];
    assert_eq!(dome.name, "Under the Dome");
    assert_eq!(dome.kind, "Scripted");
    assert_eq!(dome.year(), Some(2013));
    assert_eq!(dome.channel_name(), Some("CBS"));
    assert_eq!(dome.externals.imdb.as_deref(), Some("tt1553656"));
    assert!(dome.has_genre("Thriller"));

    // Sparse records still decode
    assert_eq!(res.data[1].score(), 0.0);
    assert!(res.data[1].network.is_none());
}

#[tokio::test]
async fn test_search_encodes_query() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/search/shows")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), "law & order".into()),
            Matcher::UrlEncoded("page".into(), "0".into()),
        ]))
        .with_status(200)
        .with_body(r#"[{"score": 0.91, "show": {"id": 180, "name": "Law & Order"}}]"#)
        .create_async()
        .await;

    let client = TvMazeClient::with_base_url(server.url());
    let res = client
        .search_shows("law & order", 0, &RequestCtx::new())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(res.data.len(), 1);
    assert_eq!(res.data[0].show.id, 180);
    assert!((res.data[0].score - 0.91).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_cast_and_crew() {
    let mut server = Server::new_async().await;

    let cast = server
        .mock("GET", "/shows/82/cast")
        .with_status(200)
        .with_body(
            r#"[{"person": {"id": 14, "name": "Peter Dinklage"},
                 "character": {"id": 3, "name": "Tyrion Lannister"},
                 "self": false, "voice": false}]"#,
        )
        .create_async()
        .await;
    let crew = server
        .mock("GET", "/shows/82/crew")
        .with_status(200)
        .with_body(r#"[{"type": "Creator", "person": {"id": 1, "name": "David Benioff"}}]"#)
        .create_async()
        .await;

    let client = TvMazeClient::with_base_url(server.url());
    let ctx = RequestCtx::new();

    let members = client.cast(82, &ctx).await.unwrap().data;
    assert_eq!(members[0].to_string(), "Peter Dinklage as Tyrion Lannister");

    let credits = client.crew(82, &ctx).await.unwrap().data;
    assert_eq!(credits[0].kind, "Creator");

    cast.assert_async().await;
    crew.assert_async().await;
}

#[tokio::test]
async fn test_season_episodes_path() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/seasons/731/episodes")
        .with_status(200)
        .with_body(r#"[{"id": 1, "name": "Pilot", "season": 1, "number": 1}, {"id": 2, "name": "Special", "season": 1, "number": null, "type": "significant_special"}]"#)
        .create_async()
        .await;

    let client = TvMazeClient::with_base_url(server.url());
    let episodes = client
        .season_episodes(731, &RequestCtx::new())
        .await
        .unwrap()
        .data;

    mock.assert_async().await;
    assert_eq!(episodes[0].to_string(), "S01E01 - Pilot");
    assert_eq!(episodes[1].number, None);
}

#[tokio::test]
async fn test_sends_bearer_token_and_ctx_headers() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/shows/1")
        .match_header("authorization", "Bearer secret")
        .match_header("x-trace", "abc")
        .with_status(200)
        .with_body(r#"{"id": 1, "name": "Under the Dome"}"#)
        .create_async()
        .await;

    let client = TvMazeClient::with_base_url(server.url()).with_token("secret");
    let ctx = RequestCtx::new().with_header("x-trace", "abc");
    let show = client.show(1, &ctx).await.unwrap().data;

    mock.assert_async().await;
    assert_eq!(show.id, 1);
}

// =============================================================================
// Errors
// =============================================================================

#[tokio::test]
async fn test_not_found_maps_status() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/shows/999999")
        .with_status(404)
        .create_async()
        .await;

    let client = TvMazeClient::with_base_url(server.url());
    let err = client.show(999_999, &RequestCtx::new()).await.unwrap_err();

    match err.downcast_ref::<TransportError>() {
        Some(TransportError::Status { status, .. }) => assert_eq!(*status, 404),
        other => panic!("Expected status error, got {:?}", other),
    }

    let normalized = NetworkError::from_anyhow(err);
    assert_eq!(normalized.status, Some(404));
    assert_eq!(normalized.code.as_deref(), Some("ERR_BAD_RESPONSE"));
}

#[tokio::test]
async fn test_rate_limit_status() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/shows")
        .match_query(Matcher::Any)
        .with_status(429)
        .create_async()
        .await;

    let client = TvMazeClient::with_base_url(server.url());
    let err = client.shows_page(3, &RequestCtx::new()).await.unwrap_err();
    assert_eq!(NetworkError::from_anyhow(err).status, Some(429));
}

#[tokio::test]
async fn test_invalid_json() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/shows/1/seasons")
        .with_status(200)
        .with_body("<html>not json</html>")
        .create_async()
        .await;

    let client = TvMazeClient::with_base_url(server.url());
    let err = client.seasons(1, &RequestCtx::new()).await.unwrap_err();
    let normalized = NetworkError::from_anyhow(err);
    assert_eq!(normalized.code.as_deref(), Some("ERR_INVALID_RESPONSE"));
    assert!(normalized.message.contains("JSON parse error"));
}

#[tokio::test]
async fn test_cancelled_ctx_aborts() {
    let server = Server::new_async().await;
    let token = CancellationToken::new();
    token.cancel();

    let client = TvMazeClient::with_base_url(server.url());
    let err = client
        .show(1, &RequestCtx::new().with_cancel(token))
        .await
        .unwrap_err();
    assert!(NetworkError::from_anyhow(err).is_abort());
}
