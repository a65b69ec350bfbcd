//! Core domain logic for the gift wishlist.
//! This crate is the single source of truth for wishlist invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::present::{
    generate_present_id, now_epoch_ms, parse_timestamp, Category, NewPresent, Present, PresentId,
    PresentValidationError,
};
pub use repo::kv_store::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};
pub use repo::present_repo::{
    decode_presents, DecodedPresents, KeyValuePresentRepository, PresentRepository, RepoError,
    RepoResult, PRESENTS_STORAGE_KEY,
};
pub use service::statistics::{CategoryCount, FilterCounts, WishlistStats};
pub use service::wishlist_store::{PresentFilter, StoreError, WishlistStore};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
