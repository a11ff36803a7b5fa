//! Cinelog - browse the TMDB catalog and keep a personal viewing log
//!
//! Search and browse movies and TV shows, then record locally what you have
//! watched (rating, review, date) or saved for later.
//!
//! # Modules
//!
//! - `models` - Catalog records, collection items, queries
//! - `api` - TMDB client
//! - `store` - Watched / saved collections over a key-value backend
//! - `config` - Config file and credentials
//! - `cli` / `commands` - Command-line surface

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod models;
pub mod store;

// Re-export commonly used types
pub use models::{
    Country, Genre, Identity, MediaType, Movie, MovieDetail, Page, SavedItem, TopRatedQuery,
    TvDetail, TvShow, WatchedItem, WatchedSort, WatchedStats,
};

pub use api::{Credentials, TmdbClient, TmdbError};
pub use config::Config;
pub use store::{CollectionStore, FileStore, KeyValueStore, MemoryStore, StoreError};
