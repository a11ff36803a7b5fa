//! TMDB API client tests
//!
//! Tests search, listings, details, top-rated pagination and error handling.

use mockito::{Matcher, Server};
use serde_json::json;

use cinelog::api::tmdb::{CatalogOp, Credentials, TmdbClient, TmdbError};
use cinelog::models::{QueryError, TopRatedQuery};

fn api_key_client(url: String) -> TmdbClient {
    TmdbClient::with_base_url(Credentials::ApiKey("test_key".into()), url)
}

/// A discover page of movies with ids starting at `first_id`
fn movie_page(page: u32, total_pages: u32, first_id: u64, len: usize) -> String {
    let results: Vec<_> = (0..len as u64)
        .map(|i| {
            json!({
                "id": first_id + i,
                "title": format!("Movie {}", first_id + i),
                "release_date": "2020-05-01",
                "overview": "",
                "poster_path": null,
                "vote_average": 8.0,
                "vote_count": 500
            })
        })
        .collect();
    json!({
        "page": page,
        "results": results,
        "total_pages": total_pages,
        "total_results": total_pages * 20
    })
    .to_string()
}

// =============================================================================
// Search Tests
// =============================================================================

#[tokio::test]
async fn test_search_movies_sends_query_language_and_key() {
    let mut server = Server::new_async().await;

    let mock_response = r#"{
        "page": 1,
        "results": [
            {
                "id": 550,
                "title": "El club de la lucha",
                "original_title": "Fight Club",
                "release_date": "1999-10-15",
                "overview": "Un joven sin ilusiones...",
                "poster_path": "/pB8BM7pdSp6B6Ih7QZ4DrQ3PmJK.jpg",
                "backdrop_path": null,
                "vote_average": 8.4,
                "vote_count": 28000,
                "genre_ids": [18],
                "original_language": "en",
                "popularity": 61.4
            }
        ],
        "total_pages": 1,
        "total_results": 1
    }"#;

    let mock = server
        .mock("GET", "/search/movie")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("query".into(), "club de la lucha".into()),
            Matcher::UrlEncoded("page".into(), "1".into()),
            Matcher::UrlEncoded("language".into(), "es-ES".into()),
            Matcher::UrlEncoded("api_key".into(), "test_key".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(mock_response)
        .create_async()
        .await;

    let client = api_key_client(server.url());
    let page = client.search_movies("club de la lucha", 1).await.unwrap();

    mock.assert_async().await;

    assert_eq!(page.results.len(), 1);
    let movie = &page.results[0];
    assert_eq!(movie.id, 550);
    assert_eq!(movie.title, "El club de la lucha");
    assert_eq!(movie.year(), Some(1999));
    assert_eq!(movie.vote_count, 28000);
    assert!(!page.has_more());
}

#[tokio::test]
async fn test_search_tv_with_bearer_token() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/search/tv")
        .match_query(Matcher::UrlEncoded("query".into(), "breaking bad".into()))
        .match_header("authorization", "Bearer test_token")
        .with_status(200)
        .with_body(
            r#"{
                "page": 1,
                "results": [
                    {
                        "id": 1396,
                        "name": "Breaking Bad",
                        "first_air_date": "2008-01-20",
                        "poster_path": "/ggFHVNu6YYI5L9pCfOacjizRGt.jpg",
                        "vote_average": 8.9,
                        "vote_count": 14000,
                        "origin_country": ["US"]
                    }
                ],
                "total_pages": 1,
                "total_results": 1
            }"#,
        )
        .create_async()
        .await;

    let client = TmdbClient::with_base_url(Credentials::Bearer("test_token".into()), server.url());
    let page = client.search_tv("breaking bad", 1).await.unwrap();

    mock.assert_async().await;

    assert_eq!(page.results[0].name, "Breaking Bad");
    assert_eq!(page.results[0].origin_country, vec!["US".to_string()]);
    assert_eq!(page.results[0].year(), Some(2008));
}

#[tokio::test]
async fn test_search_tolerates_missing_dates() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("GET", "/search/movie")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            r#"{
                "page": 1,
                "results": [
                    { "id": 1, "title": "No Date", "release_date": null },
                    { "id": 2, "title": "Empty Date", "release_date": "" },
                    { "id": 3, "title": "Missing Date" }
                ],
                "total_pages": 1,
                "total_results": 3
            }"#,
        )
        .create_async()
        .await;

    let client = api_key_client(server.url());
    let page = client.search_movies("x", 1).await.unwrap();

    assert_eq!(page.results.len(), 3);
    assert!(page.results.iter().all(|m| m.year().is_none()));
}

// =============================================================================
// Listing / Detail Tests
// =============================================================================

#[tokio::test]
async fn test_popular_tv_page_param() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/tv/popular")
        .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
        .with_status(200)
        .with_body(r#"{"page": 2, "results": [], "total_pages": 40, "total_results": 800}"#)
        .create_async()
        .await;

    let client = api_key_client(server.url());
    let page = client.popular_tv(2).await.unwrap();

    mock.assert_async().await;
    assert_eq!(page.page, 2);
    assert!(page.has_more());
}

#[tokio::test]
async fn test_movie_details() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("GET", "/movie/550")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            r#"{
                "id": 550,
                "title": "El club de la lucha",
                "overview": "...",
                "poster_path": "/p.jpg",
                "backdrop_path": "/b.jpg",
                "release_date": "1999-10-15",
                "runtime": 139,
                "genres": [{"id": 18, "name": "Drama"}],
                "vote_average": 8.4,
                "vote_count": 28000,
                "imdb_id": "tt0137523",
                "tagline": "La travesura de la semana"
            }"#,
        )
        .create_async()
        .await;

    let client = api_key_client(server.url());
    let detail = client.movie_details(550).await.unwrap();

    assert_eq!(detail.title, "El club de la lucha");
    assert_eq!(detail.runtime, Some(139));
    assert_eq!(detail.genres[0].name, "Drama");
    assert_eq!(detail.poster_path.as_deref(), Some("/p.jpg"));
}

#[tokio::test]
async fn test_tv_details_not_found() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("GET", "/tv/999999999")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(r#"{"status_code": 34, "status_message": "Not found"}"#)
        .create_async()
        .await;

    let client = api_key_client(server.url());
    let err = client.tv_details(999999999).await.unwrap_err();

    assert!(matches!(err, TmdbError::NotFound));
    assert_eq!(
        err.user_message(CatalogOp::TvDetails),
        "No se pudieron cargar los detalles de la serie"
    );
}

#[tokio::test]
async fn test_unauthorized() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("GET", "/movie/popular")
        .match_query(Matcher::Any)
        .with_status(401)
        .create_async()
        .await;

    let client = api_key_client(server.url());
    let err = client.popular_movies(1).await.unwrap_err();
    assert!(matches!(err, TmdbError::Unauthorized));
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/movie/popular")
        .match_query(Matcher::Any)
        .with_status(429)
        .expect(1)
        .create_async()
        .await;

    let client = api_key_client(server.url());
    let err = client.popular_movies(1).await.unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, TmdbError::ServerError(429)));
}

#[tokio::test]
async fn test_invalid_json() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("GET", "/movie/popular")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html>oops</html>")
        .create_async()
        .await;

    let client = api_key_client(server.url());
    let err = client.popular_movies(1).await.unwrap_err();
    assert!(matches!(err, TmdbError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_genres_and_countries() {
    let mut server = Server::new_async().await;

    let _genres = server
        .mock("GET", "/genre/tv/list")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"genres": [{"id": 18, "name": "Drama"}, {"id": 35, "name": "Comedia"}]}"#)
        .create_async()
        .await;

    let _countries = server
        .mock("GET", "/configuration/countries")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            r#"[
                {"iso_3166_1": "ES", "english_name": "Spain", "native_name": "España"},
                {"iso_3166_1": "AR", "english_name": "Argentina", "native_name": "Argentina"},
                {"iso_3166_1": "KR", "english_name": "South Korea"}
            ]"#,
        )
        .create_async()
        .await;

    let client = api_key_client(server.url());

    let genres = client.tv_genres().await.unwrap();
    assert_eq!(genres.len(), 2);
    assert_eq!(genres[1].name, "Comedia");

    let countries = client.countries().await.unwrap();
    let names: Vec<_> = countries.iter().map(|c| c.english_name.as_str()).collect();
    assert_eq!(names, vec!["Argentina", "South Korea", "Spain"]);
}

// =============================================================================
// Top Rated Tests
// =============================================================================

#[tokio::test]
async fn test_top_rated_accumulates_pages_and_truncates() {
    let mut server = Server::new_async().await;

    let page1 = server
        .mock("GET", "/discover/movie")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("primary_release_year".into(), "2020".into()),
            Matcher::UrlEncoded("sort_by".into(), "vote_average.desc".into()),
            Matcher::UrlEncoded("vote_count.gte".into(), "100".into()),
            Matcher::UrlEncoded("page".into(), "1".into()),
        ]))
        .with_status(200)
        .with_body(movie_page(1, 5, 1, 20))
        .expect(1)
        .create_async()
        .await;

    let page2 = server
        .mock("GET", "/discover/movie")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("primary_release_year".into(), "2020".into()),
            Matcher::UrlEncoded("page".into(), "2".into()),
        ]))
        .with_status(200)
        .with_body(movie_page(2, 5, 21, 20))
        .expect(1)
        .create_async()
        .await;

    let client = api_key_client(server.url());
    let movies = client
        .top_rated_movies(&TopRatedQuery::new(2020, 25))
        .await
        .unwrap();

    page1.assert_async().await;
    page2.assert_async().await;

    assert_eq!(movies.len(), 25);
    assert_eq!(movies[0].id, 1);
    assert_eq!(movies[24].id, 25);
    assert!(movies.iter().all(|m| m.vote_count >= 100));
}

#[tokio::test]
async fn test_top_rated_stops_when_provider_exhausted() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/discover/movie")
        .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
        .with_status(200)
        .with_body(movie_page(1, 1, 1, 7))
        .expect(1)
        .create_async()
        .await;

    let client = api_key_client(server.url());
    let movies = client
        .top_rated_movies(&TopRatedQuery::new(2020, 25))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(movies.len(), 7);
}

#[tokio::test]
async fn test_top_rated_drops_low_vote_titles() {
    let mut server = Server::new_async().await;

    let body = json!({
        "page": 1,
        "results": [
            {"id": 1, "title": "Popular", "vote_average": 9.0, "vote_count": 1200},
            {"id": 2, "title": "Obscure", "vote_average": 10.0, "vote_count": 12},
            {"id": 3, "title": "Borderline", "vote_average": 8.0, "vote_count": 100}
        ],
        "total_pages": 1,
        "total_results": 3
    });

    let _mock = server
        .mock("GET", "/discover/movie")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;

    let client = api_key_client(server.url());
    let movies = client
        .top_rated_movies(&TopRatedQuery::new(2020, 10))
        .await
        .unwrap();

    let ids: Vec<u64> = movies.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![1, 3]);
}

#[tokio::test]
async fn test_top_rated_tv_with_country() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/discover/tv")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("first_air_date_year".into(), "2019".into()),
            Matcher::UrlEncoded("with_origin_country".into(), "ES".into()),
            Matcher::UrlEncoded("page".into(), "1".into()),
        ]))
        .with_status(200)
        .with_body(
            r#"{
                "page": 1,
                "results": [
                    {"id": 71446, "name": "La casa de papel", "first_air_date": "2017-05-02",
                     "vote_average": 8.2, "vote_count": 19000, "origin_country": ["ES"]}
                ],
                "total_pages": 1,
                "total_results": 1
            }"#,
        )
        .create_async()
        .await;

    let client = api_key_client(server.url());
    let shows = client
        .top_rated_tv(&TopRatedQuery::new(2019, 5).with_country("ES"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(shows.len(), 1);
    assert_eq!(shows[0].name, "La casa de papel");
}

#[tokio::test]
async fn test_top_rated_mid_pagination_error_aborts() {
    let mut server = Server::new_async().await;

    let _page1 = server
        .mock("GET", "/discover/movie")
        .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
        .with_status(200)
        .with_body(movie_page(1, 3, 1, 20))
        .create_async()
        .await;

    let _page2 = server
        .mock("GET", "/discover/movie")
        .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
        .with_status(500)
        .create_async()
        .await;

    let client = api_key_client(server.url());
    let err = client
        .top_rated_movies(&TopRatedQuery::new(2020, 30))
        .await
        .unwrap_err();

    assert!(matches!(err, TmdbError::ServerError(500)));
    assert_eq!(
        err.user_message(CatalogOp::TopRated),
        "No se pudo cargar el ranking"
    );
}

#[tokio::test]
async fn test_top_rated_invalid_query_makes_no_request() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = api_key_client(server.url());
    let err = client
        .top_rated_movies(&TopRatedQuery::new(2020, 0))
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(matches!(
        err,
        TmdbError::InvalidQuery(QueryError::InvalidCount(0))
    ));
}
