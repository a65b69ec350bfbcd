//! Wishlist statistics.
//!
//! # Responsibility
//! - Derive counts, progress and value totals from a present collection.
//!
//! # Invariants
//! - Pure functions of their input; no side effects.
//! - `pending == total - given` and `remaining_value == total_value - spent_value`.
//! - `progress` is `0.0` for an empty collection.

use crate::model::present::{Category, Present};

/// Number of presents in one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: Category,
    pub count: usize,
}

/// Aggregate statistics over a present collection.
#[derive(Debug, Clone, PartialEq)]
pub struct WishlistStats {
    pub total: usize,
    pub given: usize,
    pub pending: usize,
    /// Percentage of given presents in `0.0..=100.0`.
    pub progress: f64,
    pub total_value: f64,
    pub spent_value: f64,
    pub remaining_value: f64,
    /// Per-category counts in first-encountered order.
    pub category_counts: Vec<CategoryCount>,
}

impl WishlistStats {
    pub fn from_presents(presents: &[Present]) -> Self {
        let total = presents.len();
        let given = presents.iter().filter(|present| present.is_given).count();
        let progress = if total == 0 {
            0.0
        } else {
            given as f64 / total as f64 * 100.0
        };

        let total_value = presents.iter().fold(0.0, |sum, present| sum + present.price);
        let spent_value = presents
            .iter()
            .filter(|present| present.is_given)
            .fold(0.0, |sum, present| sum + present.price);

        let mut category_counts: Vec<CategoryCount> = Vec::new();
        for present in presents {
            match category_counts
                .iter_mut()
                .find(|entry| entry.category == present.category)
            {
                Some(entry) => entry.count += 1,
                None => category_counts.push(CategoryCount {
                    category: present.category,
                    count: 1,
                }),
            }
        }

        Self {
            total,
            given,
            pending: total - given,
            progress,
            total_value,
            spent_value,
            remaining_value: total_value - spent_value,
            category_counts,
        }
    }

    /// Category counts sorted by count descending; ties keep
    /// first-encountered order.
    pub fn categories_by_count(&self) -> Vec<CategoryCount> {
        let mut sorted = self.category_counts.clone();
        sorted.sort_by(|a, b| b.count.cmp(&a.count));
        sorted
    }

    /// Count for one category, `0` when absent.
    pub fn category_count(&self, category: Category) -> usize {
        self.category_counts
            .iter()
            .find(|entry| entry.category == category)
            .map_or(0, |entry| entry.count)
    }

    /// Progress rounded to one decimal place, e.g. `"66.7"`; a bare `"0"`
    /// for an empty wishlist.
    pub fn progress_label(&self) -> String {
        if self.total == 0 {
            return "0".to_string();
        }
        format!("{:.1}", self.progress)
    }
}

/// Badge counts shown next to each filter button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterCounts {
    pub all: usize,
    pub pending: usize,
    pub given: usize,
}

impl FilterCounts {
    pub fn from_presents(presents: &[Present]) -> Self {
        let given = presents.iter().filter(|present| present.is_given).count();
        Self {
            all: presents.len(),
            pending: presents.len() - given,
            given,
        }
    }
}
