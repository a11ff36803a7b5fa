//! TMDB (The Movie Database) API client
//!
//! Provides search, popular listings, details and year-based discovery
//! for movies and TV shows. Responses are requested in Spanish by default.
//! API docs: https://developer.themoviedb.org/docs

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{
    Country, Genre, Movie, MovieDetail, Page, QueryError, TopRatedQuery, TvDetail, TvShow,
};

/// Default TMDB API root
pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Locale sent with every request
pub const DEFAULT_LANGUAGE: &str = "es-ES";

/// Titles with fewer votes are left out of top-rated rankings
pub const MIN_VOTE_COUNT: u32 = 100;

/// TMDB API error types
#[derive(Error, Debug)]
pub enum TmdbError {
    #[error("Resource not found (404)")]
    NotFound,

    #[error("Invalid or missing credentials (401)")]
    Unauthorized,

    #[error("Server error: {0}")]
    ServerError(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    InvalidQuery(#[from] QueryError),

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

/// Catalog operations, used to pick the message shown to the user on failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogOp {
    PopularMovies,
    PopularTv,
    SearchMovies,
    SearchTv,
    MovieDetails,
    TvDetails,
    TopRated,
    Countries,
    Genres,
}

impl CatalogOp {
    /// Generic localized message for a failed operation
    pub fn failure_message(&self) -> &'static str {
        match self {
            CatalogOp::PopularMovies => "No se pudieron cargar las películas populares",
            CatalogOp::PopularTv => "No se pudieron cargar las series populares",
            CatalogOp::SearchMovies => "No se pudieron buscar películas",
            CatalogOp::SearchTv => "No se pudieron buscar series",
            CatalogOp::MovieDetails => "No se pudieron cargar los detalles de la película",
            CatalogOp::TvDetails => "No se pudieron cargar los detalles de la serie",
            CatalogOp::TopRated => "No se pudo cargar el ranking",
            CatalogOp::Countries => "No se pudieron cargar los países",
            CatalogOp::Genres => "No se pudieron cargar los géneros",
        }
    }
}

impl TmdbError {
    /// Message to show the user. Query errors are already user-facing;
    /// everything else collapses to the operation's generic message.
    pub fn user_message(&self, op: CatalogOp) -> String {
        match self {
            TmdbError::InvalidQuery(e) => e.to_string(),
            _ => op.failure_message().to_string(),
        }
    }
}

/// How requests are authenticated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// v3 API key, sent as the `api_key` query parameter
    ApiKey(String),
    /// v4 read access token, sent as a bearer token
    Bearer(String),
}

/// TMDB API client
pub struct TmdbClient {
    credentials: Credentials,
    base_url: String,
    language: String,
    client: reqwest::Client,
}

impl TmdbClient {
    /// Create a new TMDB client with the given credentials
    pub fn new(credentials: Credentials) -> Self {
        Self::with_base_url(credentials, DEFAULT_BASE_URL)
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(credentials: Credentials, base_url: impl Into<String>) -> Self {
        Self {
            credentials,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Override the response locale
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Make an authenticated GET request. No retries: a failure is final.
    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, TmdbError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(endpoint, "TMDB request");

        let mut request = self
            .client
            .get(&url)
            .query(&[("language", self.language.as_str())])
            .header("Accept", "application/json");

        request = match &self.credentials {
            Credentials::ApiKey(key) => request.query(&[("api_key", key.as_str())]),
            Credentials::Bearer(token) => {
                request.header("Authorization", format!("Bearer {}", token))
            }
        };

        let response = request.send().await?;

        match response.status() {
            StatusCode::OK => {
                let body = response.text().await?;
                serde_json::from_str(&body).map_err(|e| {
                    warn!(endpoint, error = %e, "TMDB returned an unparseable body");
                    TmdbError::InvalidResponse(format!("JSON parse error: {}", e))
                })
            }
            StatusCode::NOT_FOUND => Err(TmdbError::NotFound),
            StatusCode::UNAUTHORIZED => Err(TmdbError::Unauthorized),
            status => {
                warn!(endpoint, status = status.as_u16(), "TMDB request failed");
                Err(TmdbError::ServerError(status.as_u16()))
            }
        }
    }

    /// Popular movies, one page
    pub async fn popular_movies(&self, page: u32) -> Result<Page<Movie>, TmdbError> {
        self.get(&format!("/movie/popular?page={}", page)).await
    }

    /// Popular TV shows, one page
    pub async fn popular_tv(&self, page: u32) -> Result<Page<TvShow>, TmdbError> {
        self.get(&format!("/tv/popular?page={}", page)).await
    }

    /// Search movies by title
    pub async fn search_movies(&self, query: &str, page: u32) -> Result<Page<Movie>, TmdbError> {
        let endpoint = format!(
            "/search/movie?query={}&page={}",
            urlencoding::encode(query),
            page
        );
        self.get(&endpoint).await
    }

    /// Search TV shows by name
    pub async fn search_tv(&self, query: &str, page: u32) -> Result<Page<TvShow>, TmdbError> {
        let endpoint = format!(
            "/search/tv?query={}&page={}",
            urlencoding::encode(query),
            page
        );
        self.get(&endpoint).await
    }

    /// Get movie details by ID
    pub async fn movie_details(&self, id: u64) -> Result<MovieDetail, TmdbError> {
        self.get(&format!("/movie/{}", id)).await
    }

    /// Get TV show details by ID
    pub async fn tv_details(&self, id: u64) -> Result<TvDetail, TmdbError> {
        self.get(&format!("/tv/{}", id)).await
    }

    /// Movie genre list
    pub async fn movie_genres(&self) -> Result<Vec<Genre>, TmdbError> {
        let response: GenreList = self.get("/genre/movie/list").await?;
        Ok(response.genres)
    }

    /// TV genre list
    pub async fn tv_genres(&self) -> Result<Vec<Genre>, TmdbError> {
        let response: GenreList = self.get("/genre/tv/list").await?;
        Ok(response.genres)
    }

    /// Countries known to TMDB, sorted by English name
    pub async fn countries(&self) -> Result<Vec<Country>, TmdbError> {
        let mut countries: Vec<Country> = self.get("/configuration/countries").await?;
        countries.sort_by(|a, b| a.english_name.cmp(&b.english_name));
        Ok(countries)
    }

    /// Best rated movies first released in `query.year`
    pub async fn top_rated_movies(&self, query: &TopRatedQuery) -> Result<Vec<Movie>, TmdbError> {
        query.validate()?;
        let endpoint = format!(
            "/discover/movie?primary_release_year={}&sort_by=vote_average.desc&vote_count.gte={}",
            query.year, MIN_VOTE_COUNT
        );
        self.collect_pages(&endpoint, query.count, |m: &Movie| m.vote_count)
            .await
    }

    /// Best rated TV shows first aired in `query.year`, optionally by origin country
    pub async fn top_rated_tv(&self, query: &TopRatedQuery) -> Result<Vec<TvShow>, TmdbError> {
        query.validate()?;
        let mut endpoint = format!(
            "/discover/tv?first_air_date_year={}&sort_by=vote_average.desc&vote_count.gte={}",
            query.year, MIN_VOTE_COUNT
        );
        if let Some(country) = query.country.as_deref().filter(|c| !c.is_empty()) {
            endpoint.push_str(&format!(
                "&with_origin_country={}",
                urlencoding::encode(country)
            ));
        }
        self.collect_pages(&endpoint, query.count, |t: &TvShow| t.vote_count)
            .await
    }

    /// Request consecutive pages until `count` results are gathered or the
    /// provider runs out. Any page failure aborts the whole collection.
    async fn collect_pages<T, F>(
        &self,
        endpoint: &str,
        count: usize,
        votes: F,
    ) -> Result<Vec<T>, TmdbError>
    where
        T: DeserializeOwned,
        F: Fn(&T) -> u32,
    {
        let mut collected: Vec<T> = Vec::with_capacity(count);
        let mut page = 1;

        loop {
            let response: Page<T> = self.get(&format!("{}&page={}", endpoint, page)).await?;
            let more = response.has_more();
            let fetched = response.results.len();

            collected.extend(
                response
                    .results
                    .into_iter()
                    .filter(|r| votes(r) >= MIN_VOTE_COUNT),
            );
            debug!(page, fetched, total = collected.len(), "accumulated discover page");

            if collected.len() >= count || !more || fetched == 0 {
                break;
            }
            page += 1;
        }

        collected.truncate(count);
        Ok(collected)
    }
}

// =============================================================================
// Response Structures (internal deserialization)
// =============================================================================

#[derive(Debug, Deserialize)]
struct GenreList {
    genres: Vec<Genre>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_hides_transport_details() {
        let err = TmdbError::ServerError(503);
        assert_eq!(
            err.user_message(CatalogOp::PopularMovies),
            "No se pudieron cargar las películas populares"
        );
        assert_eq!(
            TmdbError::NotFound.user_message(CatalogOp::TvDetails),
            "No se pudieron cargar los detalles de la serie"
        );
    }

    #[test]
    fn test_user_message_keeps_query_errors() {
        let err = TmdbError::from(QueryError::InvalidCount(0));
        assert!(err.user_message(CatalogOp::TopRated).contains("entre 1 y 100"));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = TmdbClient::with_base_url(
            Credentials::ApiKey("k".into()),
            "http://localhost:1234/",
        );
        assert_eq!(client.base_url, "http://localhost:1234");
        assert_eq!(client.language(), "es-ES");
    }
}
