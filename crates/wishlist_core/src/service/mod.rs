//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate present lifecycle operations over a persistence adapter.
//! - Keep view/FFI layers decoupled from storage details.

pub mod statistics;
pub mod wishlist_store;
