//! Wishlist store use-case service.
//!
//! # Responsibility
//! - Own the ordered present collection for one wishlist.
//! - Apply add / mark-given / unmark / remove and persist after each change.
//! - Hand read-only snapshots and statistics to the view layer.
//!
//! # Invariants
//! - Present ids are unique within the collection and stable across reopen:
//!   ids assigned while loading are saved back immediately.
//! - Every present has a non-empty trimmed name.
//! - New presents are prepended (newest first).
//! - Persistence failures never undo or block an in-memory change; they are
//!   logged and kept as a pending warning.
//! - An unknown id is a no-op signalled by `false`, never an error.

use crate::model::present::{
    generate_present_id, now_epoch_ms, NewPresent, Present, PresentValidationError,
};
use crate::repo::present_repo::{DecodedPresents, PresentRepository, RepoError};
use crate::service::statistics::{FilterCounts, WishlistStats};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Store error for wishlist use-cases.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Input rejected before any state change.
    Validation(PresentValidationError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
        }
    }
}

impl From<PresentValidationError> for StoreError {
    fn from(value: PresentValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Status selection used by the filter buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresentFilter {
    #[default]
    All,
    Pending,
    Given,
}

impl PresentFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Pending => "pending",
            Self::Given => "given",
        }
    }

    /// Returns whether `present` belongs to this selection.
    pub fn matches(self, present: &Present) -> bool {
        match self {
            Self::All => true,
            Self::Pending => !present.is_given,
            Self::Given => present.is_given,
        }
    }
}

impl FromStr for PresentFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "pending" => Ok(Self::Pending),
            "given" => Ok(Self::Given),
            other => Err(format!(
                "unsupported filter `{other}`; expected all|pending|given"
            )),
        }
    }
}

/// In-memory wishlist with an injected persistence adapter.
pub struct WishlistStore<R: PresentRepository> {
    repo: R,
    presents: Vec<Present>,
    persistence_warning: Option<String>,
}

impl<R: PresentRepository> WishlistStore<R> {
    /// Opens a store and loads its collection from `repo`.
    ///
    /// A failed load is logged and recorded as the pending persistence
    /// warning; the store then starts empty. When loading had to assign ids
    /// the repaired list is saved right away so those ids survive a reopen.
    pub fn open(repo: R) -> Self {
        let (decoded, persistence_warning) = match repo.load_decoded() {
            Ok(decoded) => (decoded, None),
            Err(err) => {
                warn!(
                    "event=store_open module=store status=degraded error_code=load_failed error={err}"
                );
                (
                    DecodedPresents::default(),
                    Some(format!("could not load saved presents: {err}")),
                )
            }
        };
        let needs_resave = decoded.needs_resave();
        let mut store = Self {
            repo,
            presents: decoded.presents,
            persistence_warning,
        };
        info!(
            "event=store_open module=store status=ok count={} assigned_ids={}",
            store.presents.len(),
            decoded.assigned_ids
        );
        if needs_resave {
            store.persist();
        }
        store
    }

    /// Creates a store over an already-loaded collection without reading
    /// from `repo`.
    ///
    /// Records get the same treatment as on load: normalized, unnamed ones
    /// dropped, blank ids replaced, later duplicates of an id dropped.
    /// Nothing is saved until the first mutation.
    pub fn with_presents(repo: R, presents: Vec<Present>) -> Self {
        let mut store = Self {
            repo,
            presents: Vec::with_capacity(presents.len()),
            persistence_warning: None,
        };
        for mut present in presents {
            present.normalize();
            if present.name.is_empty() {
                warn!("event=store_seed module=store status=skip reason=empty_name");
                continue;
            }
            if present.id.trim().is_empty() {
                present.id = store.fresh_id();
            } else if store.get(&present.id).is_some() {
                warn!(
                    "event=store_seed module=store status=skip reason=duplicate_id present_id={}",
                    present.id
                );
                continue;
            }
            store.presents.push(present);
        }
        store
    }

    /// Validates input and prepends a new pending present.
    ///
    /// # Errors
    /// - `StoreError::Validation` when the trimmed name is empty or the price
    ///   is negative/non-finite. The collection is left unchanged.
    pub fn add(&mut self, draft: &NewPresent) -> Result<Present, StoreError> {
        let id = self.fresh_id();
        let present = match Present::create(id, draft, now_epoch_ms()) {
            Ok(present) => present,
            Err(err) => {
                info!("event=present_add module=store status=rejected reason={err}");
                return Err(err.into());
            }
        };

        self.presents.insert(0, present.clone());
        info!(
            "event=present_add module=store status=ok present_id={} category={}",
            present.id, present.category
        );
        self.persist();
        Ok(present)
    }

    /// Marks a present as given now, storing `notes`.
    ///
    /// Returns `false` without side effects when `id` is unknown.
    pub fn mark_given(&mut self, id: &str, notes: impl Into<String>) -> bool {
        let Some(present) = self.find_mut(id) else {
            info!("event=present_mark_given module=store status=not_found present_id={id}");
            return false;
        };
        present.mark_given(notes, now_epoch_ms());
        info!("event=present_mark_given module=store status=ok present_id={id}");
        self.persist();
        true
    }

    /// Returns a present to pending and clears its given date and notes.
    ///
    /// Returns `false` without side effects when `id` is unknown.
    pub fn unmark(&mut self, id: &str) -> bool {
        let Some(present) = self.find_mut(id) else {
            info!("event=present_unmark module=store status=not_found present_id={id}");
            return false;
        };
        present.unmark();
        info!("event=present_unmark module=store status=ok present_id={id}");
        self.persist();
        true
    }

    /// Removes a present.
    ///
    /// Returns `false` when nothing matched; storage is only written when a
    /// present was actually removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.presents.len();
        self.presents.retain(|present| present.id != id);
        if self.presents.len() == before {
            info!("event=present_remove module=store status=not_found present_id={id}");
            return false;
        }
        info!("event=present_remove module=store status=ok present_id={id}");
        self.persist();
        true
    }

    /// Presents matching `filter`, in store order.
    pub fn list(&self, filter: PresentFilter) -> Vec<&Present> {
        self.presents
            .iter()
            .filter(|present| filter.matches(present))
            .collect()
    }

    /// Owned copy of `list(filter)` for renderers that outlive the borrow.
    pub fn snapshot(&self, filter: PresentFilter) -> Vec<Present> {
        self.list(filter).into_iter().cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<&Present> {
        self.presents.iter().find(|present| present.id == id)
    }

    /// Whole collection, newest first.
    pub fn presents(&self) -> &[Present] {
        &self.presents
    }

    pub fn len(&self) -> usize {
        self.presents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presents.is_empty()
    }

    pub fn statistics(&self) -> WishlistStats {
        WishlistStats::from_presents(&self.presents)
    }

    pub fn filter_counts(&self) -> FilterCounts {
        FilterCounts::from_presents(&self.presents)
    }

    /// Last persistence failure that has not been superseded by a
    /// successful save.
    pub fn last_persistence_error(&self) -> Option<&str> {
        self.persistence_warning.as_deref()
    }

    /// Returns and clears the pending persistence warning.
    pub fn take_persistence_warning(&mut self) -> Option<String> {
        self.persistence_warning.take()
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Present> {
        self.presents.iter_mut().find(|present| present.id == id)
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = generate_present_id();
            if self.get(&id).is_none() {
                return id;
            }
            warn!("event=present_id module=store status=collision present_id={id}");
        }
    }

    fn persist(&mut self) {
        match self.repo.save_presents(&self.presents) {
            Ok(()) => self.persistence_warning = None,
            Err(err) => {
                warn!(
                    "event=store_persist module=store status=error error_code={} count={} error={}",
                    persist_error_code(&err),
                    self.presents.len(),
                    err
                );
                self.persistence_warning = Some(format!("changes were not saved: {err}"));
            }
        }
    }
}

fn persist_error_code(err: &RepoError) -> &'static str {
    match err {
        RepoError::QuotaExceeded { .. } => "quota_exceeded",
        RepoError::Db(_) => "db_write_failed",
        RepoError::Encode(_) => "encode_failed",
        RepoError::Storage(_) | RepoError::InvalidData(_) => "storage_failed",
    }
}
