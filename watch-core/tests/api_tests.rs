use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::time::timeout;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use watch_core::{
    ApiError, CacheMarker, ClientConfig, MediaApi, MediaKey, RemoteClient, Source, Stores,
    UpdateBus,
};

async fn api_against(server: &MockServer) -> (MediaApi, Arc<CacheMarker>) {
    let config = ClientConfig {
        base_url: format!("{}/", server.uri()),
        request_timeout_secs: 2,
        max_retries: 1,
        retry_backoff_ms: 10,
        page_limit: 10,
    };
    let marker = Arc::new(CacheMarker::new());
    let remote = RemoteClient::new(reqwest::Client::new(), config, Arc::clone(&marker))
        .expect("client against mock server");
    let api = MediaApi::new(remote, Stores::new(), UpdateBus::new(), Arc::clone(&marker));
    (api, marker)
}

fn watchlist_json() -> serde_json::Value {
    json!([
        {
            "key": { "kind": "show", "id": 1 },
            "title": "Severed",
            "added_at": "2025-01-15T12:00:00Z"
        },
        {
            "key": { "kind": "show", "id": 2 },
            "title": "The Long Dark",
            "added_at": "2025-01-16T09:30:00Z"
        }
    ])
}

#[tokio::test]
async fn watchlist_fetch_mutate_refetch() {
    let server = MockServer::start().await;
    let (api, _marker) = api_against(&server).await;

    Mock::given(method("GET"))
        .and(path("/sync/watchlist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(watchlist_json()))
        .mount(&server)
        .await;

    let entries = api.refresh_watchlist().await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(api.stores().watchlist.len().await, 2);

    let mut sub = api.subscribe(Source::Watchlist);
    // Consume the buffered refresh notice.
    assert!(sub.recv().await.is_some());

    Mock::given(method("DELETE"))
        .and(path("/sync/watchlist/show:1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    api.remove_from_watchlist(MediaKey::show(1)).await.unwrap();

    let remaining = api.stores().watchlist.get_all().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].key, MediaKey::show(2));

    let notice = timeout(Duration::from_secs(1), sub.recv())
        .await
        .expect("a notice must follow the removal")
        .unwrap();
    assert_eq!(notice.changed, Some(MediaKey::show(1)));
}

#[tokio::test]
async fn failed_mutation_leaves_cache_marker_and_bus_untouched() {
    let server = MockServer::start().await;
    let (api, marker) = api_against(&server).await;

    Mock::given(method("GET"))
        .and(path("/sync/ratings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "key": { "kind": "show", "id": 1 },
                "value": 7,
                "rated_at": "2025-01-10T08:00:00Z"
            }
        ])))
        .mount(&server)
        .await;

    api.refresh_ratings().await.unwrap();

    let mut sub = api.subscribe(Source::Ratings);
    assert!(sub.recv().await.is_some());

    Mock::given(method("POST"))
        .and(path("/sync/ratings"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let before = api.stores().ratings.get_all().await;
    let marker_before = marker.get();

    let err = api.rate(MediaKey::show(2), 9).await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 503, .. }));

    assert_eq!(api.stores().ratings.get_all().await, before);
    assert_eq!(marker.get(), marker_before);

    let waited = timeout(Duration::from_millis(200), sub.recv()).await;
    assert!(waited.is_err(), "a failed mutation must not notify");
}

#[tokio::test]
async fn get_requests_carry_the_cache_marker() {
    let server = MockServer::start().await;
    let (api, marker) = api_against(&server).await;

    Mock::given(method("GET"))
        .and(path("/shows/popular"))
        .and(query_param("cb", marker.get().to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    // A request without the current marker would miss the mock and fail.
    api.refresh_popular_shows().await.unwrap();
    server.verify().await;
}

#[tokio::test]
async fn marker_advances_after_a_mutation() {
    let server = MockServer::start().await;
    let (api, marker) = api_against(&server).await;

    Mock::given(method("POST"))
        .and(path("/sync/watchlist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "key": { "kind": "movie", "id": 9 },
            "title": "Arrival of a Train",
            "added_at": "2025-02-01T18:00:00Z"
        })))
        .mount(&server)
        .await;

    let before = marker.get();
    api.add_to_watchlist(MediaKey::movie(9), "Arrival of a Train")
        .await
        .unwrap();
    assert!(marker.get() > before);
}

#[tokio::test]
async fn reads_retry_once_on_server_error() {
    let server = MockServer::start().await;
    let (api, _marker) = api_against(&server).await;

    Mock::given(method("GET"))
        .and(path("/movies/trending"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/movies/trending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 3,
                "title": "Night Train",
                "year": 2024,
                "overview": null,
                "released": null,
                "watchers": 812
            }
        ])))
        .mount(&server)
        .await;

    let movies = api.refresh_trending_movies().await.unwrap();
    assert_eq!(movies.len(), 1);
    assert_eq!(api.stores().movies.get(&3).await.unwrap().title, "Night Train");
}

#[tokio::test]
async fn missing_resource_status_propagates_without_store_writes() {
    let server = MockServer::start().await;
    let (api, _marker) = api_against(&server).await;

    Mock::given(method("GET"))
        .and(path("/shows/999"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = api.show_details(999).await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 404, .. }));
    assert!(api.stores().shows.is_empty().await);
}

#[tokio::test]
async fn out_of_range_rating_is_rejected_before_any_request() {
    let server = MockServer::start().await;
    let (api, marker) = api_against(&server).await;

    let before = marker.get();
    let err = api.rate(MediaKey::show(1), 11).await.unwrap_err();
    assert!(matches!(err, ApiError::RatingOutOfRange(11)));
    assert_eq!(marker.get(), before);
    // No mock was mounted: reaching the network would have errored as Status.
}

#[tokio::test]
async fn marking_the_last_episode_drops_the_show_from_up_next() {
    let server = MockServer::start().await;
    let (api, _marker) = api_against(&server).await;

    Mock::given(method("GET"))
        .and(path("/sync/up-next"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "show_id": 5,
                "show_title": "Severed",
                "episode": {
                    "id": 42,
                    "show_id": 5,
                    "season": 2,
                    "number": 10,
                    "title": "Finale",
                    "aired": "2025-03-01T02:00:00Z"
                },
                "remaining": 1
            }
        ])))
        .mount(&server)
        .await;

    api.refresh_up_next().await.unwrap();
    assert_eq!(api.stores().up_next.len().await, 1);

    let mut sub = api.subscribe(Source::UpNext);
    assert!(sub.recv().await.is_some());

    Mock::given(method("POST"))
        .and(path("/shows/5/progress"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "show_id": 5,
            "show_title": "Severed",
            "episode": null,
            "remaining": 0
        })))
        .mount(&server)
        .await;

    api.mark_watched(5, 42).await.unwrap();
    assert!(api.stores().up_next.is_empty().await);

    let notice = timeout(Duration::from_secs(1), sub.recv())
        .await
        .expect("up-next notice after progress")
        .unwrap();
    assert_eq!(notice.changed, Some(MediaKey::show(5)));
}

#[tokio::test]
async fn clear_session_blanks_stores_and_bus() {
    let server = MockServer::start().await;
    let (api, marker) = api_against(&server).await;

    Mock::given(method("GET"))
        .and(path("/sync/watchlist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(watchlist_json()))
        .mount(&server)
        .await;

    api.refresh_watchlist().await.unwrap();
    assert!(!api.stores().watchlist.is_empty().await);

    let before = marker.get();
    api.clear_session().await;

    assert!(api.stores().watchlist.is_empty().await);
    assert!(marker.get() > before);

    // A fresh subscriber must not replay pre-logout notices.
    let mut sub = api.subscribe(Source::Watchlist);
    let waited = timeout(Duration::from_millis(200), sub.recv()).await;
    assert!(waited.is_err());
}
