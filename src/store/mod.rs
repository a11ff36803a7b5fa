//! Local collection store
//!
//! - `backend`: string-keyed persistence (files on disk, or memory)
//! - `collection`: the watched / saved collections on top of a backend
//! - `subscribers`: change listeners for the saved collection

pub mod backend;
pub mod collection;
pub mod subscribers;

use thiserror::Error;

pub use backend::{FileStore, KeyValueStore, MemoryStore};
pub use collection::{CollectionStore, SAVED_KEY, WATCHED_KEY};
pub use subscribers::{Subscribers, Subscription};

/// Storage error types
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored data could not be (de)serialized: {0}")]
    Serialize(#[from] serde_json::Error),
}
