//! Domain model for the gift wishlist.
//!
//! # Responsibility
//! - Define the canonical `Present` record and its category label set.
//! - Keep record lifecycle transitions next to the data they change.
//!
//! # Invariants
//! - Every present is identified by a stable `PresentId`.
//! - Removal is a hard delete owned by the store, not a record flag.

pub mod present;
