//! End-to-end tests of the pipelines against a mocked TMDB HTTP API.

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use flixrecom::banner::{BannerMode, BannerSelector};
use flixrecom::catalog::{CatalogClient, ListEndpoint};
use flixrecom::discovery::{aggregate, DiscoverFilters};
use flixrecom::{ApiError, Category, ContentKind, Locale, MediaType, TmdbClient};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> TmdbClient {
    TmdbClient::new("test-key".to_string(), server.uri(), "pt-BR".to_string())
}

async fn mount_json(server: &MockServer, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .and(query_param("api_key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn banner_cycle_enriches_recent_series() {
    let server = MockServer::start().await;
    mount_json(&server, "/movie/upcoming", json!({"results": []})).await;
    mount_json(&server, "/tv/popular", json!({"results": []})).await;
    mount_json(&server, "/discover/movie", json!({"results": []})).await;
    mount_json(
        &server,
        "/tv/on_the_air",
        json!({"results": [
            {"id": 1399, "name": "Crown Saga", "first_air_date": "2024-06-01", "backdrop_path": "/crown.jpg"},
            {"id": 1400, "name": "No Backdrop", "first_air_date": "2024-06-02"}
        ]}),
    )
    .await;
    mount_json(
        &server,
        "/tv/1399/videos",
        json!({"results": [
            {"key": "teaser", "site": "YouTube", "type": "Teaser"},
            {"key": "trailer", "site": "YouTube", "type": "Trailer"}
        ]}),
    )
    .await;
    mount_json(
        &server,
        "/tv/1399/credits",
        json!({"cast": [{"name": "A"}, {"name": "B"}, {"name": "C"}, {"name": "D"}, {"name": "E"}, {"name": "F"}]}),
    )
    .await;
    mount_json(
        &server,
        "/tv/1399/watch/providers",
        json!({"results": {"BR": {
            "flatrate": [{"provider_name": "Max"}],
            "ads": [{"provider_name": "Max"}],
            "free": [{"provider_name": "Globoplay"}],
            "rent": [{"provider_name": "Apple TV"}]
        }}}),
    )
    .await;
    mount_json(
        &server,
        "/tv/1399",
        json!({"id": 1399, "seasons": [
            {"season_number": 1, "air_date": "2022-01-01"},
            {"season_number": 2, "air_date": "2024-06-01"}
        ]}),
    )
    .await;

    let mut selector = BannerSelector::with_rng(
        Arc::new(client(&server)),
        Locale::default(),
        StdRng::seed_from_u64(3),
    );
    let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
    let published = selector
        .run_cycle(BannerMode::RecentlyReleased, today)
        .await
        .unwrap();
    assert!(published);

    let item = selector.state().current.clone().unwrap();
    assert_eq!(item.id, "1399");
    assert_eq!(item.kind, ContentKind::Series);
    let enrichment = item.enrichment.unwrap();
    assert_eq!(enrichment.trailer_key.as_deref(), Some("trailer"));
    assert_eq!(enrichment.cast, vec!["A", "B", "C", "D", "E"]);
    assert_eq!(
        enrichment.streaming_platforms.into_iter().collect::<Vec<_>>(),
        vec!["Globoplay", "Max"]
    );
    assert_eq!(enrichment.latest_season.unwrap().season_number, 2);
    assert!(enrichment.has_new_episodes_this_year);
}

#[tokio::test]
async fn anime_grid_sends_expected_discover_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/discover/tv"))
        .and(query_param("with_genres", "35,16"))
        .and(query_param("primary_release_year", "2023"))
        .and(query_param("first_air_date_year", "2023"))
        .and(query_param("language", "pt-BR"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": [
            {"id": 7, "name": "Comedy Anime", "overview": "Listing", "genre_ids": [35, 16], "first_air_date": "2023-04-01"},
            {"id": 8, "overview": "Missing every title"}
        ]})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tv/7"))
        .and(query_param("append_to_response", "credits,videos,watch/providers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "name": "Comedy Anime",
            "overview": "Detail",
            "genres": [{"id": 35, "name": "Comédia"}, {"id": 16, "name": "Animação"}],
            "vote_average": 8.1,
            "credits": {"cast": [{"name": "Seiyuu"}]},
            "videos": {"results": [{"key": "yt7", "site": "YouTube", "type": "Trailer"}]},
            "watch/providers": {"results": {"BR": {"flatrate": [{"provider_name": "Crunchyroll"}]}}}
        })))
        .mount(&server)
        .await;
    mount_json(
        &server,
        "/tv/7/translations",
        json!({"translations": [
            {"iso_639_1": "pt", "iso_3166_1": "BR", "data": {"name": "Anime de Comédia", "overview": ""}}
        ]}),
    )
    .await;

    let items = aggregate(
        &client(&server),
        Category::Anime,
        DiscoverFilters {
            genre: Some(35),
            year: Some(2023),
        },
        &Locale::default(),
    )
    .await
    .unwrap();

    assert_eq!(items.len(), 1);
    let item = &items[0];
    assert_eq!(item.title, "Anime de Comédia");
    assert_eq!(item.overview, "Detail");
    assert_eq!(item.genres.len(), 2);
    assert_eq!(item.trailer_key(), Some("yt7"));
    assert!(item
        .enrichment
        .as_ref()
        .unwrap()
        .streaming_platforms
        .contains("Crunchyroll"));
}

#[tokio::test]
async fn http_status_maps_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/upcoming"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tv/popular"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tv/on_the_air"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = client(&server);
    assert_matches!(
        client
            .list_by_endpoint(&ListEndpoint::upcoming_movies(), "pt-BR")
            .await,
        Err(ApiError::Unauthorized)
    );
    assert_matches!(
        client.list_by_endpoint(&ListEndpoint::tv_popular(), "pt-BR").await,
        Err(ApiError::RateLimit)
    );
    assert_matches!(
        client
            .list_by_endpoint(&ListEndpoint::tv_on_the_air(), "pt-BR")
            .await,
        Err(ApiError::Parse(_))
    );
    assert_matches!(
        client
            .item_detail("1", MediaType::Movie, None, Default::default())
            .await,
        Err(ApiError::NotFound)
    );
}

#[tokio::test]
async fn genre_lists_are_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/genre/tv/list"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"genres": [{"id": 16, "name": "Animação"}]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let first = client.genres(MediaType::Tv, "pt-BR").await.unwrap();
    let second = client.genres(MediaType::Tv, "pt-BR").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first[0].name, "Animação");
}
