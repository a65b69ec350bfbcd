//! Persistence adapter contracts and implementations.
//!
//! # Responsibility
//! - Define the load/save contract consumed by the wishlist store.
//! - Isolate storage backends (SQLite, in-memory) from store logic.
//!
//! # Invariants
//! - Load tolerates absent and partially malformed data.
//! - Repository errors are semantic (`QuotaExceeded`, `InvalidData`) in
//!   addition to backend transport errors.

pub mod kv_store;
pub mod present_repo;
