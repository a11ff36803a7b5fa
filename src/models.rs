//! Data structures and types for Cinelog
//!
//! Contains all shared models used across the application organized by domain:
//! - **Catalog**: TMDB movies, TV shows, details, genres and countries
//! - **Collections**: locally tracked watched and saved titles
//! - **Queries**: top-rated discovery parameters and display ordering

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Base URL for poster images (w500 size bucket)
pub const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

/// Build a full poster URL from a TMDB poster path
pub fn poster_url(path: &str) -> String {
    format!("{}{}", IMAGE_BASE_URL, path)
}

// =============================================================================
// Identity
// =============================================================================

/// Media type discriminator shared by the catalog and the collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    /// Path segment used by TMDB endpoints ("movie" / "tv")
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Movie => write!(f, "Película"),
            MediaType::Tv => write!(f, "Serie"),
        }
    }
}

/// Composite key of a title inside a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: u64,
    pub media_type: MediaType,
}

impl Identity {
    pub fn new(id: u64, media_type: MediaType) -> Self {
        Self { id, media_type }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.media_type.as_str(), self.id)
    }
}

// =============================================================================
// Collection Models
// =============================================================================

/// A title the user has marked as watched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchedItem {
    pub id: u64,
    pub media_type: MediaType,
    pub title: String,
    pub poster_path: Option<String>,
    /// User rating, 1-10 (range enforced by the input layer only)
    pub rating: u8,
    pub review: Option<String>,
    #[serde(with = "watched_date")]
    pub watched_date: NaiveDate,
}

impl WatchedItem {
    pub fn identity(&self) -> Identity {
        Identity::new(self.id, self.media_type)
    }

    /// Saved-for-later entry describing the same title
    pub fn to_saved(&self) -> SavedItem {
        SavedItem {
            id: self.id,
            media_type: self.media_type,
            title: self.title.clone(),
            poster_path: self.poster_path.clone(),
        }
    }
}

impl fmt::Display for WatchedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>8}  {} [{}] - {}/10 - {}",
            self.id, self.title, self.media_type, self.rating, self.watched_date
        )
    }
}

/// A title the user intends to watch later
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedItem {
    pub id: u64,
    pub media_type: MediaType,
    pub title: String,
    pub poster_path: Option<String>,
}

impl SavedItem {
    pub fn identity(&self) -> Identity {
        Identity::new(self.id, self.media_type)
    }
}

impl fmt::Display for SavedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>8}  {} [{}]", self.id, self.title, self.media_type)
    }
}

/// Watched dates are stored as `YYYY-MM-DD`. Older entries may carry a full
/// ISO-8601 timestamp, so only the date prefix is read back.
mod watched_date {
    use super::*;

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let prefix = raw.get(..10).unwrap_or(&raw);
        NaiveDate::parse_from_str(prefix, FORMAT).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Catalog Models (TMDB)
// =============================================================================

/// Movie entry as returned by TMDB list endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: f32,
    #[serde(default)]
    pub vote_count: u32,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    #[serde(default)]
    pub original_language: String,
    #[serde(default)]
    pub original_title: String,
    #[serde(default)]
    pub popularity: f32,
}

impl Movie {
    pub fn year(&self) -> Option<u16> {
        self.release_date.as_deref().and_then(extract_year)
    }
}

impl fmt::Display for Movie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let year_str = self.year().map(|y| format!(" ({})", y)).unwrap_or_default();
        write!(
            f,
            "{:>8}  {}{} - ⭐ {:.1} ({} votos)",
            self.id, self.title, year_str, self.vote_average, self.vote_count
        )
    }
}

/// TV show entry as returned by TMDB list endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvShow {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub vote_average: f32,
    #[serde(default)]
    pub vote_count: u32,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    #[serde(default)]
    pub origin_country: Vec<String>,
    #[serde(default)]
    pub original_language: String,
    #[serde(default)]
    pub original_name: String,
    #[serde(default)]
    pub popularity: f32,
}

impl TvShow {
    pub fn year(&self) -> Option<u16> {
        self.first_air_date.as_deref().and_then(extract_year)
    }
}

impl fmt::Display for TvShow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let year_str = self.year().map(|y| format!(" ({})", y)).unwrap_or_default();
        let country = self
            .origin_country
            .first()
            .map(|c| format!(" [{}]", c))
            .unwrap_or_default();
        write!(
            f,
            "{:>8}  {}{}{} - ⭐ {:.1} ({} votos)",
            self.id, self.name, year_str, country, self.vote_average, self.vote_count
        )
    }
}

/// Genre reference (id + localized name)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

/// Detailed movie information from TMDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieDetail {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    pub runtime: Option<u32>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub vote_average: f32,
    #[serde(default)]
    pub vote_count: u32,
    pub imdb_id: Option<String>,
    pub tagline: Option<String>,
}

impl fmt::Display for MovieDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let year = self
            .release_date
            .as_deref()
            .and_then(extract_year)
            .map(|y| y.to_string())
            .unwrap_or_else(|| "?".to_string());
        let runtime = self.runtime.unwrap_or(0);
        write!(
            f,
            "{} ({}) - {}h {}m - ⭐ {:.1}",
            self.title,
            year,
            runtime / 60,
            runtime % 60,
            self.vote_average
        )?;
        write_poster_line(f, self.poster_path.as_deref())
    }
}

/// Detailed TV show information from TMDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvDetail {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub first_air_date: Option<String>,
    pub number_of_seasons: Option<u32>,
    pub number_of_episodes: Option<u32>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub vote_average: f32,
    #[serde(default)]
    pub vote_count: u32,
    #[serde(default)]
    pub origin_country: Vec<String>,
}

impl fmt::Display for TvDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let year = self
            .first_air_date
            .as_deref()
            .and_then(extract_year)
            .map(|y| y.to_string())
            .unwrap_or_else(|| "?".to_string());
        write!(
            f,
            "{} ({}) - {} temporadas - ⭐ {:.1}",
            self.name,
            year,
            self.number_of_seasons.unwrap_or(0),
            self.vote_average
        )?;
        write_poster_line(f, self.poster_path.as_deref())
    }
}

fn write_poster_line(f: &mut fmt::Formatter<'_>, poster_path: Option<&str>) -> fmt::Result {
    match poster_path {
        Some(path) => write!(f, "\n  Póster: {}", poster_url(path)),
        None => Ok(()),
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>6}  {}", self.id, self.name)
    }
}

/// Country as listed by TMDB configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub iso_3166_1: String,
    pub english_name: String,
    pub native_name: Option<String>,
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {}", self.iso_3166_1, self.english_name)
    }
}

/// One page of a paginated TMDB listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "first_page")]
    pub page: u32,
    pub results: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

fn first_page() -> u32 {
    1
}

impl<T> Page<T> {
    /// Whether the provider reports pages beyond this one
    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Extract year from a date string like "2022-03-04"
pub fn extract_year(date: &str) -> Option<u16> {
    date.get(..4).and_then(|y| y.parse().ok())
}

// =============================================================================
// Top Rated Query
// =============================================================================

/// Upper bound on the number of titles a top-rated query may request
pub const MAX_TOP_RATED_COUNT: usize = 100;

/// Earliest year accepted by a top-rated query
pub const MIN_TOP_RATED_YEAR: i32 = 1900;

/// Invalid top-rated query parameters
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Introduce un año válido ({0} no está entre 1900 y {1})")]
    InvalidYear(i32, i32),

    #[error("Introduce una cantidad entre 1 y 100 (recibido {0})")]
    InvalidCount(usize),
}

/// "Best rated titles released in year X"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopRatedQuery {
    pub year: i32,
    pub count: usize,
    /// ISO 3166-1 origin country; only honored for TV
    pub country: Option<String>,
}

impl TopRatedQuery {
    pub fn new(year: i32, count: usize) -> Self {
        Self {
            year,
            count,
            country: None,
        }
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Check bounds against the current calendar year
    pub fn validate(&self) -> Result<(), QueryError> {
        self.validate_at(chrono::Local::now().year())
    }

    /// Check bounds against an explicit "current" year
    pub fn validate_at(&self, current_year: i32) -> Result<(), QueryError> {
        if self.year < MIN_TOP_RATED_YEAR || self.year > current_year {
            return Err(QueryError::InvalidYear(self.year, current_year));
        }
        if self.count == 0 || self.count > MAX_TOP_RATED_COUNT {
            return Err(QueryError::InvalidCount(self.count));
        }
        Ok(())
    }
}

// =============================================================================
// Display Ordering
// =============================================================================

/// Ordering applied to the watched list when it is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatchedSort {
    /// Most recently watched first
    #[default]
    Date,
    /// Highest rating first
    Rating,
    /// Alphabetical by title
    Title,
}

/// Sort watched items in place for display
pub fn sort_watched(items: &mut [WatchedItem], sort: WatchedSort) {
    match sort {
        WatchedSort::Date => items.sort_by(|a, b| b.watched_date.cmp(&a.watched_date)),
        WatchedSort::Rating => items.sort_by(|a, b| b.rating.cmp(&a.rating)),
        WatchedSort::Title => items.sort_by(|a, b| compare_titles(&a.title, &b.title)),
    }
}

fn compare_titles(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Summary of the watched collection
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WatchedStats {
    pub total: usize,
    pub movies: usize,
    pub tv_shows: usize,
    pub average_rating: f64,
}

impl WatchedStats {
    pub fn from_items(items: &[WatchedItem]) -> Self {
        if items.is_empty() {
            return Self::default();
        }
        let movies = items
            .iter()
            .filter(|i| i.media_type == MediaType::Movie)
            .count();
        let sum: u64 = items.iter().map(|i| u64::from(i.rating)).sum();
        Self {
            total: items.len(),
            movies,
            tv_shows: items.len() - movies,
            average_rating: sum as f64 / items.len() as f64,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
