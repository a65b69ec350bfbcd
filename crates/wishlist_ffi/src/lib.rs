//! Flutter-facing bindings for the wishlist core.

pub mod api;
