//! Present domain model.
//!
//! # Responsibility
//! - Define the canonical gift record and its fixed category label set.
//! - Own the given/pending lifecycle transitions of a single record.
//! - Decode persisted records leniently so old or hand-edited data loads.
//!
//! # Invariants
//! - `id` is stable and never reassigned after creation.
//! - `date_given.is_some() == is_given`.
//! - `notes` is empty whenever `is_given == false`.
//! - `price` is finite and non-negative.
//!
//! # See also
//! - crates/wishlist_core/src/repo/present_repo.rs

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Opaque, stable identifier of a present.
pub type PresentId = String;

const ID_SUFFIX_LEN: usize = 9;
const ID_SUFFIX_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Timestamp layouts written by older versions of the wishlist (pt-BR locale).
const LEGACY_TIMESTAMP_FORMATS: &[&str] = &["%d/%m/%Y, %H:%M:%S", "%d/%m/%Y %H:%M:%S"];

/// Fixed category label set offered by the add form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Category {
    Toys,
    Clothing,
    Electronics,
    Books,
    Games,
    Home,
    Beauty,
    Sports,
    Food,
    Experience,
    /// Fallback bucket for empty and unknown labels.
    #[default]
    Other,
}

impl Category {
    /// Every category in form display order.
    pub const ALL: [Category; 11] = [
        Category::Toys,
        Category::Clothing,
        Category::Electronics,
        Category::Books,
        Category::Games,
        Category::Home,
        Category::Beauty,
        Category::Sports,
        Category::Food,
        Category::Experience,
        Category::Other,
    ];

    /// Stable lowercase label used in storage and UI.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Toys => "toys",
            Self::Clothing => "clothing",
            Self::Electronics => "electronics",
            Self::Books => "books",
            Self::Games => "games",
            Self::Home => "home",
            Self::Beauty => "beauty",
            Self::Sports => "sports",
            Self::Food => "food",
            Self::Experience => "experience",
            Self::Other => "other",
        }
    }

    /// Maps free-form input to a category.
    ///
    /// Matching trims and ignores case. Empty or unknown labels land in
    /// `Category::Other` instead of being rejected.
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .unwrap_or_default()
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_label(s))
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Loose::deserialize(deserializer)? {
            Loose::Text(label) => Self::from_label(&label),
            _ => Self::Other,
        })
    }
}

/// Validation failures for present input.
#[derive(Debug, Clone, PartialEq)]
pub enum PresentValidationError {
    /// Name is empty after trimming.
    EmptyName,
    /// Price is negative, NaN or infinite.
    InvalidPrice(f64),
}

impl Display for PresentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "present name is required"),
            Self::InvalidPrice(price) => {
                write!(f, "present price must be a non-negative number, got {price}")
            }
        }
    }
}

impl Error for PresentValidationError {}

/// User input for creating a present, as submitted by the add form.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPresent {
    pub name: String,
    pub description: String,
    pub category: Category,
    pub price: f64,
}

impl NewPresent {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        category: Category,
        price: f64,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            category,
            price,
        }
    }

    /// Returns a trimmed copy, or the first rule the input breaks.
    pub fn validate(&self) -> Result<NewPresent, PresentValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(PresentValidationError::EmptyName);
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(PresentValidationError::InvalidPrice(self.price));
        }

        Ok(NewPresent {
            name: name.to_string(),
            description: self.description.trim().to_string(),
            category: self.category,
            price: self.price,
        })
    }
}

/// Canonical gift-tracking record.
///
/// Serialized with camelCase names to stay readable by earlier releases
/// that wrote the same storage key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Present {
    #[serde(default, deserialize_with = "loose_text")]
    pub id: PresentId,
    #[serde(default, deserialize_with = "loose_text")]
    pub name: String,
    #[serde(default, deserialize_with = "loose_text")]
    pub description: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default, deserialize_with = "loose_price")]
    pub price: f64,
    #[serde(default, deserialize_with = "loose_bool")]
    pub is_given: bool,
    /// Unix epoch milliseconds. Set once at creation.
    #[serde(default, deserialize_with = "loose_timestamp")]
    pub date_added: i64,
    /// Unix epoch milliseconds. Present only while `is_given`.
    #[serde(default, deserialize_with = "loose_optional_timestamp")]
    pub date_given: Option<i64>,
    #[serde(default, deserialize_with = "loose_text")]
    pub notes: String,
}

impl Present {
    /// Builds a pending present from validated input.
    ///
    /// # Errors
    /// - Returns the validation failure of `draft` unchanged.
    pub fn create(
        id: PresentId,
        draft: &NewPresent,
        now_ms: i64,
    ) -> Result<Self, PresentValidationError> {
        let draft = draft.validate()?;
        Ok(Self {
            id,
            name: draft.name,
            description: draft.description,
            category: draft.category,
            price: draft.price,
            is_given: false,
            date_added: now_ms,
            date_given: None,
            notes: String::new(),
        })
    }

    /// Marks this present as given at `at_ms` with optional notes.
    pub fn mark_given(&mut self, notes: impl Into<String>, at_ms: i64) {
        self.is_given = true;
        self.date_given = Some(at_ms);
        self.notes = notes.into();
    }

    /// Returns this present to pending and drops given-only metadata.
    pub fn unmark(&mut self) {
        self.is_given = false;
        self.date_given = None;
        self.notes.clear();
    }

    pub fn is_pending(&self) -> bool {
        !self.is_given
    }

    /// Restores record invariants on decoded data.
    ///
    /// Returns `true` when any field had to be changed.
    pub fn normalize(&mut self) -> bool {
        let before = self.clone();
        self.name = self.name.trim().to_string();
        self.price = sanitize_price(self.price);
        if self.is_given {
            if self.date_given.is_none() {
                self.date_given = Some(self.date_added);
            }
        } else {
            self.date_given = None;
            self.notes.clear();
        }
        *self != before
    }
}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Generates a fresh present ID.
///
/// Shape: epoch milliseconds followed by nine random base36 characters.
pub fn generate_present_id() -> PresentId {
    let mut entropy = Uuid::new_v4().as_u128();
    let mut id = now_epoch_ms().to_string();
    for _ in 0..ID_SUFFIX_LEN {
        let digit = (entropy % 36) as usize;
        id.push(char::from(ID_SUFFIX_ALPHABET[digit]));
        entropy /= 36;
    }
    id
}

/// Parses a stored timestamp written as epoch millis, RFC 3339 or a legacy
/// pt-BR locale string.
pub fn parse_timestamp(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(millis) = trimmed.parse::<i64>() {
        return Some(millis);
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.timestamp_millis());
    }
    LEGACY_TIMESTAMP_FORMATS.iter().find_map(|format| {
        let naive = NaiveDateTime::parse_from_str(trimmed, format).ok()?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|local| local.timestamp_millis())
    })
}

fn sanitize_price(price: f64) -> f64 {
    if price.is_finite() && price >= 0.0 {
        price
    } else {
        0.0
    }
}

/// Any JSON scalar a hand-edited or legacy record may carry.
#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Other(IgnoredAny),
}

fn loose_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Loose::deserialize(deserializer)? {
        Loose::Text(value) => value,
        Loose::Int(value) => value.to_string(),
        Loose::Float(value) => value.to_string(),
        Loose::Bool(_) | Loose::Other(_) => String::new(),
    })
}

fn loose_price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let price = match Loose::deserialize(deserializer)? {
        Loose::Int(value) => value as f64,
        Loose::Float(value) => value,
        Loose::Text(value) => value.trim().replace(',', ".").parse().unwrap_or(0.0),
        Loose::Bool(_) | Loose::Other(_) => 0.0,
    };
    Ok(sanitize_price(price))
}

fn loose_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Loose::deserialize(deserializer)? {
        Loose::Bool(value) => value,
        Loose::Text(value) => value.trim().eq_ignore_ascii_case("true"),
        _ => false,
    })
}

fn loose_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(loose_optional_timestamp(deserializer)?.unwrap_or(0))
}

fn loose_optional_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<i64>, D::Error> {
    Ok(match Loose::deserialize(deserializer)? {
        Loose::Int(value) => Some(value),
        Loose::Float(value) if value.is_finite() => Some(value as i64),
        Loose::Text(value) => parse_timestamp(&value),
        _ => None,
    })
}
