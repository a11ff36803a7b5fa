//! Integration tests for Cinelog
//!
//! Tests are organized by component:
//! - tmdb_test: TMDB API client tests (mocked with mockito)
//! - store_test: Watched / saved collection tests
//! - commands_test: Command handlers over an in-memory store
//! - cli_test: Argument parsing and JSON output envelopes

// Note: Each test file is a separate integration test crate
// Tests are run individually by cargo, not via mod.rs
