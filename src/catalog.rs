use std::collections::HashMap;
use std::fmt;

use chrono::Local;

use super::entry::Entry;

/// Field name for an entry's code in a raw repository row.
pub const FIELD_ID: &str = "id";
/// Field name for an entry's description in a raw repository row.
pub const FIELD_TEXT: &str = "texto";
/// Field name for the start of an entry's validity window.
pub const FIELD_VALID_FROM: &str = "vigencia_desde";
/// Field name for the end of an entry's validity window.
pub const FIELD_VALID_UNTIL: &str = "vigencia_hasta";

/// A raw record as supplied by a [`Repository`](crate::Repository): a mapping
/// from field name to textual value.
///
/// Rows carry at least [`FIELD_ID`] and [`FIELD_TEXT`]; the validity fields
/// are optional and an absent or empty value means "unbounded".
///
/// # Examples
///
/// ```
/// use sat_catalogos::Row;
///
/// let row = Row::new()
///     .with_field("id", "O")
///     .with_field("texto", "Nómina ordinaria")
///     .with_field("vigencia_desde", "2017-07-29");
/// assert_eq!(row.field("id"), Some("O"));
/// assert_eq!(row.field("vigencia_hasta"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    fields: HashMap<String, String>,
}

impl Row {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field assignment.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets a field, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Returns a field's value, or `None` if the field is absent.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

impl FromIterator<(String, String)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// How a catalog keys and filters its entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogKind {
    /// Codes may be reused across validity periods; lookups filter by the
    /// validity window at call time and may additionally match on the
    /// description to disambiguate reused codes.
    Temporal,
    /// Codes are never redefined; lookups key on the code alone and ignore
    /// validity. A duplicate code in the source rows replaces the earlier
    /// entry.
    Identifiable,
}

/// Errors raised while building a catalog or looking up an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// A raw row was missing a required field; fatal to that catalog's build.
    MalformedRow {
        /// The field that was absent.
        field: &'static str,
    },
    /// No currently-valid entry matched the requested code (and description,
    /// where one was given).
    NotFound {
        /// The code that was requested.
        id: String,
        /// The description that was requested, for composite-key lookups.
        text: Option<String>,
    },
    /// More than one entry was valid for the same code at the same instant,
    /// which the data source is expected to prevent.
    AmbiguousEntry {
        /// The code with overlapping validity windows.
        id: String,
    },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::MalformedRow { field } => {
                write!(f, "raw catalog row is missing the '{}' field", field)
            }
            CatalogError::NotFound { id, text: Some(text) } => {
                write!(f, "no currently valid entry for id '{}' with text '{}'", id, text)
            }
            CatalogError::NotFound { id, text: None } => {
                write!(f, "no currently valid entry for id '{}'", id)
            }
            CatalogError::AmbiguousEntry { id } => {
                write!(f, "multiple entries for id '{}' are valid at the same instant", id)
            }
        }
    }
}

impl std::error::Error for CatalogError {}

/// A read-only, keyed collection of catalog [`Entry`] values.
///
/// A catalog is built once from the raw rows of a data source and never
/// mutated afterwards. Lookups are pure functions of the built data and
/// wall-clock time: for [`CatalogKind::Temporal`] catalogs the validity
/// window is evaluated against "now" at each call, so the same catalog can
/// answer differently as entries expire or come into effect.
///
/// When several entries for one code are simultaneously valid (a data
/// invariant violation), the entry whose window started most recently wins;
/// an exact start-time tie is reported as [`CatalogError::AmbiguousEntry`].
///
/// # Examples
///
/// ```
/// use sat_catalogos::{Catalog, CatalogKind, Row};
///
/// let rows = vec![
///     Row::new().with_field("id", "O").with_field("texto", "Nómina ordinaria"),
///     Row::new().with_field("id", "E").with_field("texto", "Nómina extraordinaria"),
/// ];
/// let catalog = Catalog::new(CatalogKind::Identifiable, rows).unwrap();
///
/// assert_eq!(catalog.obtain("O").unwrap().text(), "Nómina ordinaria");
/// assert!(catalog.obtain("X").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Catalog {
    kind: CatalogKind,
    entries: Vec<Entry>,
    index: HashMap<String, Vec<usize>>,
}

impl Catalog {
    /// Builds a catalog of the given kind from raw repository rows.
    ///
    /// All entries are materialized eagerly, in row order. Fails with
    /// [`CatalogError::MalformedRow`] if a row lacks [`FIELD_ID`] or
    /// [`FIELD_TEXT`].
    pub fn new<I>(kind: CatalogKind, rows: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = Row>,
    {
        let mut catalog = Self {
            kind,
            entries: Vec::new(),
            index: HashMap::new(),
        };
        for row in rows {
            let entry = Self::entry_from_row(&row)?;
            catalog.insert(entry);
        }
        Ok(catalog)
    }

    /// Builds a composite-key catalog with temporal validity filtering.
    pub fn temporal<I>(rows: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = Row>,
    {
        Self::new(CatalogKind::Temporal, rows)
    }

    /// Builds a catalog keyed on the code alone, with no validity filtering.
    pub fn identifiable<I>(rows: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = Row>,
    {
        Self::new(CatalogKind::Identifiable, rows)
    }

    fn entry_from_row(row: &Row) -> Result<Entry, CatalogError> {
        let id = row
            .field(FIELD_ID)
            .ok_or(CatalogError::MalformedRow { field: FIELD_ID })?;
        let text = row
            .field(FIELD_TEXT)
            .ok_or(CatalogError::MalformedRow { field: FIELD_TEXT })?;
        Ok(Entry::new(
            id,
            text,
            row.field(FIELD_VALID_FROM).unwrap_or(""),
            row.field(FIELD_VALID_UNTIL).unwrap_or(""),
        ))
    }

    fn insert(&mut self, entry: Entry) {
        if self.kind == CatalogKind::Identifiable
            && let Some(slots) = self.index.get(entry.id())
            && let Some(&slot) = slots.first()
        {
            self.entries[slot] = entry;
            return;
        }
        let slot = self.entries.len();
        self.index
            .entry(entry.id().to_string())
            .or_default()
            .push(slot);
        self.entries.push(entry);
    }

    /// How this catalog keys and filters its entries.
    pub fn kind(&self) -> CatalogKind {
        self.kind
    }

    /// Returns the single applicable entry for a code.
    ///
    /// For temporal catalogs the entry must be valid at wall-clock "now";
    /// for identifiable catalogs the code alone decides. Fails with
    /// [`CatalogError::NotFound`] when nothing matches.
    pub fn obtain(&self, id: &str) -> Result<&Entry, CatalogError> {
        self.select(id, None)
    }

    /// Returns the single applicable entry for a code and exact description.
    ///
    /// This is the composite-key lookup for catalogs where codes are reused
    /// with redefined descriptions over time. Identifiable catalogs ignore
    /// the description.
    pub fn obtain_with_text(&self, id: &str, text: &str) -> Result<&Entry, CatalogError> {
        self.select(id, Some(text))
    }

    /// Whether any entry exists for the code, regardless of validity.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Number of entries in the catalog.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over all entries in their original row order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    fn select(&self, id: &str, text: Option<&str>) -> Result<&Entry, CatalogError> {
        let not_found = || CatalogError::NotFound {
            id: id.to_string(),
            text: text.map(str::to_string),
        };
        let slots = self.index.get(id).ok_or_else(not_found)?;

        if self.kind == CatalogKind::Identifiable {
            return slots
                .first()
                .map(|&slot| &self.entries[slot])
                .ok_or_else(not_found);
        }

        let now = Local::now().timestamp();
        let mut winner: Option<&Entry> = None;
        let mut tied = false;
        for &slot in slots {
            let entry = &self.entries[slot];
            if let Some(text) = text
                && entry.text() != text
            {
                continue;
            }
            if !entry.is_valid_at(now) {
                continue;
            }
            match winner {
                None => winner = Some(entry),
                Some(current) if entry.valid_from() > current.valid_from() => {
                    winner = Some(entry);
                    tied = false;
                }
                Some(current) if entry.valid_from() == current.valid_from() => {
                    tied = true;
                }
                Some(_) => {}
            }
        }
        if tied {
            return Err(CatalogError::AmbiguousEntry { id: id.to_string() });
        }
        winner.ok_or_else(not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Local};

    fn row(id: &str, text: &str) -> Row {
        Row::new().with_field(FIELD_ID, id).with_field(FIELD_TEXT, text)
    }

    fn dated_row(id: &str, text: &str, from: &str, until: &str) -> Row {
        row(id, text)
            .with_field(FIELD_VALID_FROM, from)
            .with_field(FIELD_VALID_UNTIL, until)
    }

    fn days_from_now(days: i64) -> String {
        (Local::now() + Duration::days(days))
            .format("%Y-%m-%d")
            .to_string()
    }

    #[test]
    fn test_obtain_unbounded_entry() {
        let catalog = Catalog::temporal([row("01", "Efectivo")]).unwrap();
        let entry = catalog.obtain("01").unwrap();
        assert_eq!(entry.text(), "Efectivo");
        assert_eq!(entry.valid_from(), 0);
        assert_eq!(entry.valid_until(), 0);
    }

    #[test]
    fn test_obtain_unknown_id_is_not_found() {
        let catalog = Catalog::temporal([row("01", "Efectivo")]).unwrap();
        let err = catalog.obtain("99").unwrap_err();
        assert_eq!(
            err,
            CatalogError::NotFound { id: "99".to_string(), text: None }
        );
    }

    #[test]
    fn test_obtain_with_text_requires_exact_description() {
        let catalog = Catalog::temporal([row("01", "Efectivo")]).unwrap();
        assert!(catalog.obtain_with_text("01", "Efectivo").is_ok());

        let err = catalog.obtain_with_text("01", "Cheque").unwrap_err();
        assert_eq!(
            err,
            CatalogError::NotFound {
                id: "01".to_string(),
                text: Some("Cheque".to_string()),
            }
        );
    }

    #[test]
    fn test_expired_entry_is_not_found() {
        let catalog = Catalog::temporal([dated_row(
            "01",
            "Efectivo",
            &days_from_now(-30),
            &days_from_now(-10),
        )])
        .unwrap();
        assert!(catalog.obtain("01").is_err());
    }

    #[test]
    fn test_future_entry_is_not_found() {
        let catalog =
            Catalog::temporal([dated_row("01", "Efectivo", &days_from_now(10), "")]).unwrap();
        assert!(catalog.obtain("01").is_err());
    }

    #[test]
    fn test_reused_code_resolves_to_current_window() {
        let catalog = Catalog::temporal([
            dated_row("06", "Vales", &days_from_now(-300), &days_from_now(-100)),
            dated_row("06", "Vales de despensa", &days_from_now(-99), ""),
        ])
        .unwrap();
        assert_eq!(catalog.obtain("06").unwrap().text(), "Vales de despensa");
    }

    #[test]
    fn test_overlapping_windows_pick_most_recent_start() {
        let catalog = Catalog::temporal([
            dated_row("06", "Vales", &days_from_now(-300), ""),
            dated_row("06", "Vales de despensa", &days_from_now(-100), ""),
        ])
        .unwrap();
        // Both are valid now; the window that started later wins.
        assert_eq!(catalog.obtain("06").unwrap().text(), "Vales de despensa");
    }

    #[test]
    fn test_identical_window_starts_are_ambiguous() {
        let from = days_from_now(-100);
        let catalog = Catalog::temporal([
            dated_row("06", "Vales", &from, ""),
            dated_row("06", "Vales de despensa", &from, ""),
        ])
        .unwrap();
        assert_eq!(
            catalog.obtain("06").unwrap_err(),
            CatalogError::AmbiguousEntry { id: "06".to_string() }
        );
    }

    #[test]
    fn test_text_disambiguates_overlapping_windows() {
        let from = days_from_now(-100);
        let catalog = Catalog::temporal([
            dated_row("06", "Vales", &from, ""),
            dated_row("06", "Vales de despensa", &from, ""),
        ])
        .unwrap();
        let entry = catalog.obtain_with_text("06", "Vales").unwrap();
        assert_eq!(entry.text(), "Vales");
    }

    #[test]
    fn test_missing_id_field_is_malformed() {
        let rows = [Row::new().with_field(FIELD_TEXT, "Efectivo")];
        assert_eq!(
            Catalog::temporal(rows).unwrap_err(),
            CatalogError::MalformedRow { field: FIELD_ID }
        );
    }

    #[test]
    fn test_missing_text_field_is_malformed() {
        let rows = [Row::new().with_field(FIELD_ID, "01")];
        assert_eq!(
            Catalog::temporal(rows).unwrap_err(),
            CatalogError::MalformedRow { field: FIELD_TEXT }
        );
    }

    #[test]
    fn test_identifiable_lookup_ignores_validity_and_text() {
        let catalog = Catalog::identifiable([dated_row(
            "O",
            "Nómina ordinaria",
            &days_from_now(10),
            "",
        )])
        .unwrap();
        // Not yet in effect, but identifiable catalogs key on the code alone.
        assert!(catalog.obtain("O").is_ok());
        assert_eq!(
            catalog.obtain_with_text("O", "otra cosa").unwrap().text(),
            "Nómina ordinaria"
        );
    }

    #[test]
    fn test_identifiable_duplicate_replaces_earlier_entry() {
        let catalog = Catalog::identifiable([
            row("O", "Nómina ordinaria"),
            row("E", "Nómina extraordinaria"),
            row("O", "Nómina ordinaria (corregida)"),
        ])
        .unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.obtain("O").unwrap().text(), "Nómina ordinaria (corregida)");
    }

    #[test]
    fn test_identical_rows_build_identical_catalogs() {
        let rows = || {
            vec![
                dated_row("06", "Vales", "2017-01-01", "2019-12-31"),
                dated_row("06", "Vales de despensa", "2020-01-01", ""),
                row("01", "Efectivo"),
            ]
        };
        let first = Catalog::temporal(rows()).unwrap();
        let second = Catalog::temporal(rows()).unwrap();
        assert_eq!(first.obtain("06").ok(), second.obtain("06").ok());
        assert_eq!(first.obtain("01").ok(), second.obtain("01").ok());
        assert_eq!(first.obtain("99").err(), second.obtain("99").err());
    }

    #[test]
    fn test_read_only_helpers() {
        let catalog = Catalog::temporal([row("01", "Efectivo"), row("02", "Cheque")]).unwrap();
        assert!(catalog.contains("01"));
        assert!(!catalog.contains("99"));
        assert_eq!(catalog.len(), 2);
        assert!(!catalog.is_empty());

        let ids: Vec<&str> = catalog.iter().map(|entry| entry.id()).collect();
        assert_eq!(ids, ["01", "02"]);
    }
}
