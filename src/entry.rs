use std::fmt;

use chrono::{Local, NaiveDate, TimeZone};

/// One row of a SAT catalog: a short code, its description, and the validity
/// window during which that mapping is authoritative.
///
/// Entries are immutable after construction. Validity bounds are epoch
/// seconds; `0` means "unbounded" on that side, so an entry with both bounds
/// at `0` is valid at any instant.
///
/// # Examples
///
/// ```
/// use sat_catalogos::Entry;
///
/// let entry = Entry::new("O", "Nómina ordinaria", "2017-07-29", "");
/// assert_eq!(entry.id(), "O");
/// assert_eq!(entry.text(), "Nómina ordinaria");
/// assert!(entry.valid_from() > 0);
/// assert_eq!(entry.valid_until(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    id: String,
    text: String,
    valid_from: i64,
    valid_until: i64,
}

impl Entry {
    /// Creates an entry from textual validity dates.
    ///
    /// An empty or unparseable date normalizes to `0` (unbounded). A date in
    /// `YYYY-MM-DD` form becomes the epoch seconds of that day's midnight in
    /// the system time zone. When both bounds are present the data source is
    /// expected to provide `valid_from <= valid_until`; this is not enforced
    /// here.
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        valid_from: &str,
        valid_until: &str,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            valid_from: date_to_timestamp(valid_from),
            valid_until: date_to_timestamp(valid_until),
        }
    }

    /// Creates an entry with no validity window, the form used by catalogs
    /// whose codes are never redefined over time.
    pub fn always_valid(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            valid_from: 0,
            valid_until: 0,
        }
    }

    /// The short code, unique within its catalog at any single instant.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The human-readable description for the code.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Start of the validity window as epoch seconds; `0` = unbounded.
    pub fn valid_from(&self) -> i64 {
        self.valid_from
    }

    /// End of the validity window as epoch seconds; `0` = no expiration.
    pub fn valid_until(&self) -> i64 {
        self.valid_until
    }

    /// Whether this entry's mapping is authoritative at the given instant.
    pub fn is_valid_at(&self, timestamp: i64) -> bool {
        (self.valid_from == 0 || self.valid_from <= timestamp)
            && (self.valid_until == 0 || self.valid_until >= timestamp)
    }

    /// Whether this entry is valid right now (wall-clock time).
    pub fn is_currently_valid(&self) -> bool {
        self.is_valid_at(Local::now().timestamp())
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.text)
    }
}

/// Normalizes textual validity dates to epoch seconds.
///
/// Empty, `"0"`, and unparseable input all map to `0`, matching the upstream
/// convention where a falsy bound means "unbounded".
pub(crate) fn date_to_timestamp(text: &str) -> i64 {
    if text.is_empty() || text == "0" {
        return 0;
    }
    let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") else {
        return 0;
    };
    let Some(midnight) = date.and_hms_opt(0, 0, 0) else {
        return 0;
    };
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|moment| moment.timestamp())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_midnight(text: &str) -> i64 {
        let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").unwrap();
        Local
            .from_local_datetime(&date.and_hms_opt(0, 0, 0).unwrap())
            .earliest()
            .unwrap()
            .timestamp()
    }

    #[test]
    fn test_empty_dates_are_unbounded() {
        let entry = Entry::new("01", "Efectivo", "", "");
        assert_eq!(entry.valid_from(), 0);
        assert_eq!(entry.valid_until(), 0);
    }

    #[test]
    fn test_falsy_and_garbage_dates_are_unbounded() {
        assert_eq!(date_to_timestamp("0"), 0);
        assert_eq!(date_to_timestamp("not a date"), 0);
        assert_eq!(date_to_timestamp("2017-13-45"), 0);
    }

    #[test]
    fn test_date_parses_to_local_midnight() {
        let entry = Entry::new("O", "Nómina ordinaria", "2017-07-29", "");
        assert_eq!(entry.valid_from(), local_midnight("2017-07-29"));
        assert_eq!(entry.valid_until(), 0);
    }

    #[test]
    fn test_always_valid_entry() {
        let entry = Entry::always_valid("02", "Diurna");
        assert_eq!(entry.valid_from(), 0);
        assert_eq!(entry.valid_until(), 0);
        assert!(entry.is_valid_at(0));
        assert!(entry.is_valid_at(i64::MAX));
    }

    #[test]
    fn test_validity_window_bounds_are_inclusive() {
        let entry = Entry::new("X", "Ventana", "2017-07-29", "2018-07-29");
        let from = local_midnight("2017-07-29");
        let until = local_midnight("2018-07-29");

        assert!(entry.is_valid_at(from));
        assert!(entry.is_valid_at(until));
        assert!(entry.is_valid_at((from + until) / 2));
        assert!(!entry.is_valid_at(from - 1));
        assert!(!entry.is_valid_at(until + 1));
    }

    #[test]
    fn test_unbounded_entry_is_currently_valid() {
        assert!(Entry::always_valid("O", "Nómina ordinaria").is_currently_valid());
    }

    #[test]
    fn test_display() {
        let entry = Entry::always_valid("O", "Nómina ordinaria");
        assert_eq!(entry.to_string(), "O: Nómina ordinaria");
    }
}
