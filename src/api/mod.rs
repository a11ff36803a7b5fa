//! API clients for external services
//!
//! - TMDB: Movie/TV metadata, search and discovery

pub mod tmdb;

pub use tmdb::{CatalogOp, Credentials, TmdbClient, TmdbError};
