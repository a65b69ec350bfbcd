//! Present persistence contract and key-value implementation.
//!
//! # Responsibility
//! - Load and save the ordered present collection as one JSON text value.
//! - Tolerate absent, partial and hand-edited data on load.
//!
//! # Invariants
//! - An absent key loads as an empty collection.
//! - Loaded collections never contain duplicate ids or unnamed records.
//! - Every loaded record has passed `Present::normalize()`.
//! - Ids assigned during load are reported so the owner can save them back.
//! - Save writes the whole collection in store order.

use crate::db::DbError;
use crate::model::present::{generate_present_id, Present};
use log::{info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

use super::kv_store::KeyValueStore;

/// Storage key holding the serialized present list.
pub const PRESENTS_STORAGE_KEY: &str = "wishlist-presents";

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence error for present load/save operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Backend refused the write because it would exceed its size limit.
    QuotaExceeded { needed: usize, limit: usize },
    /// Generic backend failure not covered by other variants.
    Storage(String),
    /// Stored text could not be interpreted as a present list.
    InvalidData(String),
    Encode(serde_json::Error),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::QuotaExceeded { needed, limit } => write!(
                f,
                "storage quota exceeded: write needs {needed} bytes, limit is {limit}"
            ),
            Self::Storage(message) => write!(f, "storage failure: {message}"),
            Self::InvalidData(message) => write!(f, "invalid stored present data: {message}"),
            Self::Encode(err) => write!(f, "failed to encode presents: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::QuotaExceeded { .. } | Self::Storage(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Presents decoded from storage plus what had to be fixed on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedPresents {
    pub presents: Vec<Present>,
    /// Elements dropped: non-objects, unnamed records, duplicate ids.
    pub skipped: usize,
    /// Kept records changed by normalization or id assignment.
    pub repaired: usize,
    /// Kept records that had no id and received a generated one.
    pub assigned_ids: usize,
}

impl DecodedPresents {
    /// Whether the in-memory list differs from storage in a way that makes
    /// ids unstable until it is saved back.
    pub fn needs_resave(&self) -> bool {
        self.assigned_ids > 0
    }
}

/// Persistence adapter consumed by `WishlistStore`.
pub trait PresentRepository {
    fn load_presents(&self) -> RepoResult<Vec<Present>>;
    fn save_presents(&self, presents: &[Present]) -> RepoResult<()>;

    /// Loads with a repair report. Backends that never repair can keep the
    /// default.
    fn load_decoded(&self) -> RepoResult<DecodedPresents> {
        self.load_presents().map(|presents| DecodedPresents {
            presents,
            ..DecodedPresents::default()
        })
    }
}

/// Stores the whole present list as JSON under a single key.
pub struct KeyValuePresentRepository<S: KeyValueStore> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> KeyValuePresentRepository<S> {
    /// Creates a repository using `PRESENTS_STORAGE_KEY`.
    pub fn new(store: S) -> Self {
        Self::with_key(store, PRESENTS_STORAGE_KEY)
    }

    /// Creates a repository over a custom key, e.g. one list per profile.
    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: KeyValueStore> PresentRepository for KeyValuePresentRepository<S> {
    fn load_presents(&self) -> RepoResult<Vec<Present>> {
        self.load_decoded().map(|decoded| decoded.presents)
    }

    fn load_decoded(&self) -> RepoResult<DecodedPresents> {
        match self.store.get_item(&self.key)? {
            Some(raw) => decode_presents(&raw),
            None => {
                info!("event=presents_load module=repo status=ok source=empty count=0");
                Ok(DecodedPresents::default())
            }
        }
    }

    fn save_presents(&self, presents: &[Present]) -> RepoResult<()> {
        let encoded = serde_json::to_string(presents).map_err(RepoError::Encode)?;
        self.store.set_item(&self.key, &encoded)?;
        info!(
            "event=presents_save module=repo status=ok count={} bytes={}",
            presents.len(),
            encoded.len()
        );
        Ok(())
    }
}

/// Decodes a stored present list.
///
/// Blank text and JSON `null` decode as an empty list. Elements that are
/// not objects or have no name are skipped; duplicate ids keep the first
/// occurrence; missing ids are regenerated.
///
/// # Errors
/// - `RepoError::InvalidData` when the text is not JSON or not an array.
pub fn decode_presents(raw: &str) -> RepoResult<DecodedPresents> {
    if raw.trim().is_empty() {
        return Ok(DecodedPresents::default());
    }

    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|err| RepoError::InvalidData(err.to_string()))?;
    let elements = match value {
        serde_json::Value::Null => return Ok(DecodedPresents::default()),
        serde_json::Value::Array(elements) => elements,
        other => {
            return Err(RepoError::InvalidData(format!(
                "expected an array of presents, found {}",
                json_kind(&other)
            )));
        }
    };

    let total = elements.len();
    let mut seen_ids = HashSet::with_capacity(total);
    let mut presents = Vec::with_capacity(total);
    let mut repaired = 0usize;
    let mut assigned_ids = 0usize;

    for (index, element) in elements.into_iter().enumerate() {
        if !element.is_object() {
            warn!("event=presents_load module=repo status=skip index={index} reason=not_object");
            continue;
        }
        let mut present: Present = match serde_json::from_value(element) {
            Ok(present) => present,
            Err(err) => {
                warn!(
                    "event=presents_load module=repo status=skip index={index} reason=decode error={err}"
                );
                continue;
            }
        };

        let mut changed = present.normalize();
        if present.name.is_empty() {
            warn!("event=presents_load module=repo status=skip index={index} reason=empty_name");
            continue;
        }
        if present.id.trim().is_empty() {
            present.id = loop {
                let id = generate_present_id();
                if !seen_ids.contains(&id) {
                    break id;
                }
            };
            assigned_ids += 1;
            changed = true;
        }
        if !seen_ids.insert(present.id.clone()) {
            warn!("event=presents_load module=repo status=skip index={index} reason=duplicate_id");
            continue;
        }
        if changed {
            repaired += 1;
        }
        presents.push(present);
    }

    let skipped = total - presents.len();
    info!(
        "event=presents_load module=repo status=ok source=storage count={} skipped={} repaired={} assigned_ids={}",
        presents.len(),
        skipped,
        repaired,
        assigned_ids
    );
    Ok(DecodedPresents {
        presents,
        skipped,
        repaired,
        assigned_ids,
    })
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
