use std::collections::HashMap;
use std::error::Error;
use std::fmt;

use super::catalog::Row;

/// Error raised by a [`Repository`] when a catalog's rows cannot be supplied.
#[derive(Debug)]
pub struct RepositoryError {
    message: String,
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl RepositoryError {
    /// Creates an error with a descriptive message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error wrapping an underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for RepositoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_deref()
            .map(|source| source as &(dyn Error + 'static))
    }
}

/// The raw-data capability consumed by the catalog registry.
///
/// A repository supplies the ordered raw rows for a catalog, keyed by the
/// catalog's source name (for example `"nomina_tipos_nominas"`). This is the
/// sole I/O boundary of the crate; the registry calls it exactly once per
/// catalog and caches the built result.
pub trait Repository {
    /// Returns the ordered raw rows for the named catalog.
    fn rows(&self, catalog: &str) -> Result<Vec<Row>, RepositoryError>;
}

/// An in-memory [`Repository`] backed by a plain map.
///
/// Useful as a test double and for embedding catalog data directly in a
/// program.
///
/// # Examples
///
/// ```
/// use sat_catalogos::{MemoryRepository, Repository, Row};
///
/// let mut repository = MemoryRepository::new();
/// repository.insert("nomina_tipos_nominas", vec![
///     Row::new().with_field("id", "O").with_field("texto", "Nómina ordinaria"),
/// ]);
///
/// assert_eq!(repository.rows("nomina_tipos_nominas").unwrap().len(), 1);
/// assert!(repository.rows("cfdi_monedas").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    catalogs: HashMap<String, Vec<Row>>,
}

impl MemoryRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the rows for a catalog, replacing any previous rows.
    pub fn insert(&mut self, catalog: impl Into<String>, rows: Vec<Row>) {
        self.catalogs.insert(catalog.into(), rows);
    }
}

impl Repository for MemoryRepository {
    fn rows(&self, catalog: &str) -> Result<Vec<Row>, RepositoryError> {
        self.catalogs
            .get(catalog)
            .cloned()
            .ok_or_else(|| RepositoryError::new(format!("repository has no rows for catalog '{}'", catalog)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_repository_roundtrip() {
        let mut repository = MemoryRepository::new();
        repository.insert(
            "cfdi_monedas",
            vec![Row::new().with_field("id", "MXN").with_field("texto", "Peso Mexicano")],
        );

        let rows = repository.rows("cfdi_monedas").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].field("id"), Some("MXN"));
    }

    #[test]
    fn test_missing_catalog_is_an_error() {
        let repository = MemoryRepository::new();
        let err = repository.rows("cfdi_monedas").unwrap_err();
        assert!(err.to_string().contains("cfdi_monedas"));
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn test_error_carries_its_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = RepositoryError::with_source("cannot read catalog", io);
        assert_eq!(err.to_string(), "cannot read catalog");
        assert!(std::error::Error::source(&err).is_some());
    }
}
