//! FFI use-case API for the wishlist screens.
//!
//! # Responsibility
//! - Turn view intents (form fields, button clicks with a target id, filter
//!   selection) into wishlist store operations.
//! - Return immutable snapshots the view renders as-is.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Every call runs to completion before the next one starts.
//! - User-facing messages use the fixed pt-BR locale of the app.

use chrono::{Local, TimeZone};
use log::warn;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use wishlist_core::db::open_db;
use wishlist_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    Category, KeyValuePresentRepository, NewPresent, Present, PresentFilter, PresentRepository,
    PresentValidationError, SqliteKeyValueStore, StoreError, WishlistStore,
};

const WISHLIST_DB_FILE_NAME: &str = "wishlist.sqlite3";
const WISHLIST_DB_PATH_ENV: &str = "WISHLIST_DB_PATH";
const DATE_LABEL_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

static WISHLIST_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static STORE_LOCK: Mutex<()> = Mutex::new(());

type SqliteWishlistStore<'conn> =
    WishlistStore<KeyValuePresentRepository<SqliteKeyValueStore<'conn>>>;

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and an error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Pins the wishlist database file before the first wishlist call.
///
/// # FFI contract
/// - Returns empty string on success (including repeating the same path).
/// - Returns an error message when the path is blank or a different path
///   is already in use.
#[flutter_rust_bridge::frb(sync)]
pub fn configure_wishlist_storage(db_path: String) -> String {
    let trimmed = db_path.trim();
    if trimmed.is_empty() {
        return "db_path cannot be empty".to_string();
    }
    let requested = PathBuf::from(trimmed);
    let active = WISHLIST_DB_PATH.get_or_init(|| requested.clone());
    if *active == requested {
        String::new()
    } else {
        format!(
            "wishlist storage already uses `{}`; refusing to switch to `{}`",
            active.display(),
            requested.display()
        )
    }
}

/// Present card data as rendered by the list view.
#[derive(Debug, Clone, PartialEq)]
pub struct PresentItem {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Category label (`toys|clothing|...|other`).
    pub category: String,
    pub price: f64,
    /// `R$ 199.90`, or `Sem preço` when the price is zero.
    pub price_label: String,
    pub is_given: bool,
    /// `Dado` or `Pendente`.
    pub status_label: String,
    pub date_added_ms: i64,
    pub date_added_label: String,
    pub date_given_ms: Option<i64>,
    pub date_given_label: Option<String>,
    pub notes: String,
}

/// Badge counts for the filter buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterCountsView {
    pub all: u32,
    pub pending: u32,
    pub given: u32,
}

/// List response envelope for one filter selection.
#[derive(Debug, Clone, PartialEq)]
pub struct PresentListResponse {
    pub ok: bool,
    /// Effective filter label (`all|pending|given`).
    pub filter: String,
    pub items: Vec<PresentItem>,
    pub counts: FilterCountsView,
    pub message: String,
}

/// Result of one add / mark / unmark / remove intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentActionResponse {
    /// Whether the intent changed the wishlist.
    pub ok: bool,
    pub present_id: Option<String>,
    /// Toast message for the view.
    pub message: String,
    /// Set when the change is kept in memory but could not be saved.
    pub warning: Option<String>,
}

impl PresentActionResponse {
    fn success(message: impl Into<String>, present_id: String, warning: Option<String>) -> Self {
        Self {
            ok: true,
            present_id: Some(present_id),
            message: message.into(),
            warning,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            present_id: None,
            message: message.into(),
            warning: None,
        }
    }
}

/// One row of the "popular categories" list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCountItem {
    pub category: String,
    pub count: u32,
}

/// Statistics dialog data.
#[derive(Debug, Clone, PartialEq)]
pub struct WishlistStatsResponse {
    pub ok: bool,
    pub total: u32,
    pub given: u32,
    pub pending: u32,
    pub progress: f64,
    /// Progress with one decimal, e.g. `66.7`.
    pub progress_label: String,
    pub total_value: f64,
    pub spent_value: f64,
    pub remaining_value: f64,
    /// Sorted by count descending, ties in first-seen order.
    pub categories: Vec<CategoryCountItem>,
    pub message: String,
}

/// Adds a present from the add form.
///
/// `price` is the raw form text; blank or unparsable input counts as zero.
#[flutter_rust_bridge::frb(sync)]
pub fn wishlist_add(
    name: String,
    description: String,
    category: String,
    price: String,
) -> PresentActionResponse {
    let draft = NewPresent::new(
        name,
        description,
        Category::from_label(&category),
        parse_price_input(&price),
    );
    with_wishlist_store(|store| add_to_store(store, &draft)).unwrap_or_else(|err| {
        PresentActionResponse::failure(format!("wishlist_add failed: {err}"))
    })
}

/// Marks a present as given with notes typed by the user.
#[flutter_rust_bridge::frb(sync)]
pub fn wishlist_mark_given(id: String, notes: String) -> PresentActionResponse {
    let id = id.trim().to_string();
    let notes = notes.trim().to_string();
    run_id_action(&id, "Presente marcado como dado!", |store| {
        store.mark_given(&id, notes)
    })
}

/// Returns a given present to pending. Confirmation is up to the view.
#[flutter_rust_bridge::frb(sync)]
pub fn wishlist_unmark(id: String) -> PresentActionResponse {
    let id = id.trim().to_string();
    run_id_action(&id, "Presente desmarcado!", |store| store.unmark(&id))
}

/// Removes a present. Confirmation is up to the view.
#[flutter_rust_bridge::frb(sync)]
pub fn wishlist_remove(id: String) -> PresentActionResponse {
    let id = id.trim().to_string();
    run_id_action(&id, "Presente removido!", |store| store.remove(&id))
}

/// Lists presents for a filter label (`all|pending|given`).
#[flutter_rust_bridge::frb(sync)]
pub fn wishlist_list(filter: String) -> PresentListResponse {
    let empty_counts = FilterCountsView {
        all: 0,
        pending: 0,
        given: 0,
    };
    let parsed = match filter.parse::<PresentFilter>() {
        Ok(parsed) => parsed,
        Err(err) => {
            return PresentListResponse {
                ok: false,
                filter,
                items: Vec::new(),
                counts: empty_counts,
                message: err,
            };
        }
    };

    let result = with_wishlist_store(|store| {
        let items = store
            .list(parsed)
            .into_iter()
            .map(to_present_item)
            .collect::<Vec<_>>();
        let counts = store.filter_counts();
        (items, counts)
    });

    match result {
        Ok((items, counts)) => {
            let message = if items.is_empty() {
                "Nenhum presente encontrado.".to_string()
            } else {
                format!("{} presente(s).", items.len())
            };
            PresentListResponse {
                ok: true,
                filter: parsed.as_str().to_string(),
                items,
                counts: FilterCountsView {
                    all: to_u32(counts.all),
                    pending: to_u32(counts.pending),
                    given: to_u32(counts.given),
                },
                message,
            }
        }
        Err(err) => PresentListResponse {
            ok: false,
            filter: parsed.as_str().to_string(),
            items: Vec::new(),
            counts: empty_counts,
            message: format!("wishlist_list failed: {err}"),
        },
    }
}

/// Aggregate statistics for the statistics dialog.
#[flutter_rust_bridge::frb(sync)]
pub fn wishlist_statistics() -> WishlistStatsResponse {
    match with_wishlist_store(|store| store.statistics()) {
        Ok(stats) => WishlistStatsResponse {
            ok: true,
            total: to_u32(stats.total),
            given: to_u32(stats.given),
            pending: to_u32(stats.pending),
            progress: stats.progress,
            progress_label: stats.progress_label(),
            total_value: stats.total_value,
            spent_value: stats.spent_value,
            remaining_value: stats.remaining_value,
            categories: stats
                .categories_by_count()
                .into_iter()
                .map(|entry| CategoryCountItem {
                    category: entry.category.to_string(),
                    count: to_u32(entry.count),
                })
                .collect(),
            message: String::new(),
        },
        Err(err) => WishlistStatsResponse {
            ok: false,
            total: 0,
            given: 0,
            pending: 0,
            progress: 0.0,
            progress_label: "0".to_string(),
            total_value: 0.0,
            spent_value: 0.0,
            remaining_value: 0.0,
            categories: Vec::new(),
            message: format!("wishlist_statistics failed: {err}"),
        },
    }
}

/// Formats a price the way present cards show it.
#[flutter_rust_bridge::frb(sync)]
pub fn format_price_label(price: f64) -> String {
    if price > 0.0 {
        format!("R$ {price:.2}")
    } else {
        "Sem preço".to_string()
    }
}

fn run_id_action(
    id: &str,
    success_message: &str,
    action: impl FnOnce(&mut SqliteWishlistStore<'_>) -> bool,
) -> PresentActionResponse {
    with_wishlist_store(|store| apply_id_action(store, id, success_message, action))
        .unwrap_or_else(|err| {
            PresentActionResponse::failure(format!("wishlist action failed: {err}"))
        })
}

fn add_to_store<R: PresentRepository>(
    store: &mut WishlistStore<R>,
    draft: &NewPresent,
) -> PresentActionResponse {
    match store.add(draft) {
        Ok(present) => PresentActionResponse::success(
            "Presente adicionado com sucesso!",
            present.id,
            store.take_persistence_warning(),
        ),
        Err(err) => PresentActionResponse::failure(validation_message(&err)),
    }
}

fn apply_id_action<R: PresentRepository>(
    store: &mut WishlistStore<R>,
    id: &str,
    success_message: &str,
    action: impl FnOnce(&mut WishlistStore<R>) -> bool,
) -> PresentActionResponse {
    if action(store) {
        PresentActionResponse::success(
            success_message,
            id.to_string(),
            store.take_persistence_warning(),
        )
    } else {
        PresentActionResponse::failure(format!("Presente não encontrado: {id}"))
    }
}

fn with_wishlist_store<T>(f: impl FnOnce(&mut SqliteWishlistStore<'_>) -> T) -> Result<T, String> {
    let _guard = STORE_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let db_path = resolve_wishlist_db_path();
    let conn = open_db(&db_path).map_err(|err| format!("wishlist DB open failed: {err}"))?;
    let mut store = WishlistStore::open(KeyValuePresentRepository::new(
        SqliteKeyValueStore::new(&conn),
    ));
    if let Some(load_warning) = store.take_persistence_warning() {
        warn!("event=ffi_store_open module=ffi status=degraded warning={load_warning}");
    }
    Ok(f(&mut store))
}

fn resolve_wishlist_db_path() -> PathBuf {
    WISHLIST_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(WISHLIST_DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(WISHLIST_DB_FILE_NAME)
        })
        .clone()
}

fn parse_price_input(raw: &str) -> f64 {
    raw.trim().replace(',', ".").parse::<f64>().unwrap_or(0.0)
}

fn validation_message(err: &StoreError) -> &'static str {
    match err {
        StoreError::Validation(PresentValidationError::EmptyName) => {
            "Nome do presente é obrigatório!"
        }
        StoreError::Validation(PresentValidationError::InvalidPrice(_)) => {
            "Preço do presente deve ser um número positivo!"
        }
    }
}

fn to_present_item(present: &Present) -> PresentItem {
    PresentItem {
        id: present.id.clone(),
        name: present.name.clone(),
        description: present.description.clone(),
        category: present.category.to_string(),
        price: present.price,
        price_label: format_price_label(present.price),
        is_given: present.is_given,
        status_label: if present.is_given { "Dado" } else { "Pendente" }.to_string(),
        date_added_ms: present.date_added,
        date_added_label: format_date_label(present.date_added),
        date_given_ms: present.date_given,
        date_given_label: present.date_given.map(format_date_label),
        notes: present.notes.clone(),
    }
}

fn format_date_label(epoch_ms: i64) -> String {
    Local
        .timestamp_millis_opt(epoch_ms)
        .single()
        .map(|moment| moment.format(DATE_LABEL_FORMAT).to_string())
        .unwrap_or_default()
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::{
        add_to_store, apply_id_action, configure_wishlist_storage, core_version,
        format_price_label, init_logging, parse_price_input, ping, wishlist_add, wishlist_list,
        wishlist_mark_given, wishlist_remove, wishlist_statistics, wishlist_unmark,
    };
    use std::time::{SystemTime, UNIX_EPOCH};
    use wishlist_core::db::open_db;
    use wishlist_core::{
        Category, KeyValuePresentRepository, MemoryKeyValueStore, NewPresent, WishlistStore,
        PRESENTS_STORAGE_KEY,
    };

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "/tmp/wishlist-logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn configure_storage_accepts_active_path_and_rejects_others() {
        assert!(!configure_wishlist_storage("  ".to_string()).is_empty());

        let active = super::resolve_wishlist_db_path();
        let same = configure_wishlist_storage(active.display().to_string());
        assert!(same.is_empty(), "{same}");

        let other = active.with_extension("other");
        let error = configure_wishlist_storage(other.display().to_string());
        assert!(error.contains("refusing to switch"));
    }

    #[test]
    fn price_labels_follow_card_format() {
        assert_eq!(format_price_label(199.9), "R$ 199.90");
        assert_eq!(format_price_label(0.0), "Sem preço");
        assert_eq!(parse_price_input(" 49,90 "), 49.9);
        assert_eq!(parse_price_input("abc"), 0.0);
        assert_eq!(parse_price_input(""), 0.0);
    }

    #[test]
    fn add_then_list_shows_present_as_pending() {
        let name = unique_token("ffi-add");
        let added = wishlist_add(
            name.clone(),
            "blue".to_string(),
            "Toys".to_string(),
            "199.90".to_string(),
        );
        assert!(added.ok, "{}", added.message);
        assert_eq!(added.warning, None);
        let id = added.present_id.expect("add should return present_id");

        let listed = wishlist_list("pending".to_string());
        assert!(listed.ok, "{}", listed.message);
        let item = listed
            .items
            .iter()
            .find(|item| item.id == id)
            .expect("new present should be pending");
        assert_eq!(item.name, name);
        assert_eq!(item.category, "toys");
        assert_eq!(item.price_label, "R$ 199.90");
        assert_eq!(item.status_label, "Pendente");
        assert!(!item.date_added_label.is_empty());
        assert_eq!(item.date_given_label, None);
    }

    #[test]
    fn add_rejects_blank_name() {
        let response = wishlist_add(
            "   ".to_string(),
            String::new(),
            String::new(),
            String::new(),
        );
        assert!(!response.ok);
        assert_eq!(response.message, "Nome do presente é obrigatório!");
        assert_eq!(response.present_id, None);
    }

    #[test]
    fn mark_unmark_and_remove_flow() {
        let added = wishlist_add(
            unique_token("ffi-flow"),
            String::new(),
            "books".to_string(),
            "30".to_string(),
        );
        let id = added.present_id.expect("add should return present_id");

        let marked = wishlist_mark_given(id.clone(), " loved it ".to_string());
        assert!(marked.ok, "{}", marked.message);
        let given = wishlist_list("given".to_string());
        let item = given
            .items
            .iter()
            .find(|item| item.id == id)
            .expect("present should be listed as given");
        assert_eq!(item.notes, "loved it");
        assert_eq!(item.status_label, "Dado");
        assert!(item.date_given_label.is_some());

        assert!(wishlist_unmark(id.clone()).ok);
        let pending = wishlist_list("PENDING".to_string());
        assert!(pending.items.iter().any(|item| item.id == id));

        assert!(wishlist_remove(id.clone()).ok);
        let all = wishlist_list("all".to_string());
        assert!(all.items.iter().all(|item| item.id != id));

        let missing = wishlist_remove(id);
        assert!(!missing.ok);
        assert!(missing.message.contains("não encontrado"));
    }

    #[test]
    fn added_present_is_saved_under_wishlist_key() {
        let added = wishlist_add(
            unique_token("ffi-persist"),
            String::new(),
            String::new(),
            String::new(),
        );
        let id = added.present_id.expect("add should return present_id");

        let conn = open_db(super::resolve_wishlist_db_path()).expect("open db");
        let raw: String = conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1",
                [PRESENTS_STORAGE_KEY],
                |row| row.get(0),
            )
            .expect("query stored presents");
        assert!(raw.starts_with('['));
        assert!(raw.contains(&format!("\"id\":\"{id}\"")));
    }

    #[test]
    fn list_rejects_unknown_filter() {
        let response = wishlist_list("archived".to_string());
        assert!(!response.ok);
        assert!(response.items.is_empty());
        assert!(response.message.contains("all|pending|given"));
    }

    #[test]
    fn statistics_reconcile_with_list_counts() {
        wishlist_add(
            unique_token("ffi-stats"),
            String::new(),
            "home".to_string(),
            "12.5".to_string(),
        );

        let stats = wishlist_statistics();
        assert!(stats.ok, "{}", stats.message);
        assert_eq!(stats.total, stats.given + stats.pending);
        assert!((stats.remaining_value - (stats.total_value - stats.spent_value)).abs() < 1e-9);
        assert!(stats.categories.iter().any(|row| row.category == "home"));
        let counts: Vec<u32> = stats.categories.iter().map(|row| row.count).collect();
        assert!(counts.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[test]
    fn unsaved_changes_come_back_as_warnings() {
        let backend = MemoryKeyValueStore::with_quota(16);
        let mut store = WishlistStore::open(KeyValuePresentRepository::new(backend));

        let added = add_to_store(
            &mut store,
            &NewPresent::new("Bike", "", Category::Toys, 199.90),
        );
        assert!(added.ok, "{}", added.message);
        assert_eq!(added.message, "Presente adicionado com sucesso!");
        let warning = added.warning.expect("quota failure should surface");
        assert!(warning.contains("quota"), "{warning}");
        let id = added.present_id.expect("add should return present_id");

        let marked = apply_id_action(&mut store, &id, "Presente marcado como dado!", |store| {
            store.mark_given(&id, "")
        });
        assert!(marked.ok);
        assert!(marked.warning.is_some());
        assert!(store.get(&id).is_some_and(|present| present.is_given));
    }

    #[test]
    fn saved_changes_carry_no_warning_and_misses_fail() {
        let mut store = WishlistStore::open(KeyValuePresentRepository::new(
            MemoryKeyValueStore::new(),
        ));
        let added = add_to_store(&mut store, &NewPresent::new("Kite", "", Category::Toys, 5.0));
        assert!(added.ok);
        assert_eq!(added.warning, None);

        let missing = apply_id_action(&mut store, "nope", "Presente removido!", |store| {
            store.remove("nope")
        });
        assert!(!missing.ok);
        assert_eq!(missing.message, "Presente não encontrado: nope");
        assert_eq!(missing.warning, None);
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
