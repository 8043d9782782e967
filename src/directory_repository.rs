//! Directory-backed repository reading per-catalog JSON files.
//!
//! This module is only available when the `directory-repository` feature is
//! enabled (which is the default). It supplies catalog rows from a directory
//! holding one JSON file per catalog, named after the catalog's source name:
//!
//! ```text
//! ~/.sat-catalogos/
//!   nomina_tipos_nominas.json
//!   cfdi_formas_de_pago.json
//!   ...
//! ```
//!
//! # File format
//!
//! ```json
//! {
//!   "catalog": "nomina_tipos_nominas",
//!   "rows": [
//!     {"id": "O", "texto": "Nómina ordinaria", "vigencia_desde": "2017-07-29", "vigencia_hasta": 0}
//!   ]
//! }
//! ```
//!
//! Only the `rows` array is required. Field values may be strings or numbers;
//! the upstream dumps use a bare `0` for an unbounded validity bound, so
//! numbers are carried over as their decimal text and `null` fields are
//! treated as absent.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::catalog::Row;
use crate::repository::{Repository, RepositoryError};

/// Root structure of a catalog JSON file.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    /// The catalog's source name, informational only.
    #[serde(default)]
    pub catalog: Option<String>,
    /// The raw rows, in catalog order.
    pub rows: Vec<RawRow>,
}

/// One raw row as found in a catalog JSON file.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct RawRow(serde_json::Map<String, Value>);

impl RawRow {
    /// Converts the JSON object into a textual [`Row`].
    ///
    /// Strings pass through, numbers and booleans become their display text,
    /// and `null` fields are dropped (absent).
    pub fn into_row(self) -> Row {
        self.0
            .into_iter()
            .filter_map(|(name, value)| {
                let text = match value {
                    Value::Null => return None,
                    Value::String(text) => text,
                    Value::Number(number) => number.to_string(),
                    Value::Bool(flag) => flag.to_string(),
                    other => other.to_string(),
                };
                Some((name, text))
            })
            .collect()
    }
}

/// Errors that can occur while reading a catalog file.
#[derive(Debug)]
pub enum LoadError {
    /// The file could not be read.
    Io {
        /// The file that caused the error.
        file: PathBuf,
        /// The underlying I/O error.
        error: io::Error,
    },
    /// The file is not valid catalog JSON.
    Json {
        /// The file that caused the error.
        file: PathBuf,
        /// The underlying JSON error.
        error: serde_json::Error,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io { file, error } => {
                write!(f, "cannot read {}: {}", file.display(), error)
            }
            LoadError::Json { file, error } => {
                write!(f, "JSON parse error in {}: {}", file.display(), error)
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { error, .. } => Some(error),
            LoadError::Json { error, .. } => Some(error),
        }
    }
}

impl From<LoadError> for RepositoryError {
    fn from(error: LoadError) -> Self {
        RepositoryError::with_source(error.to_string(), error)
    }
}

/// A [`Repository`] reading one JSON file per catalog from a directory.
///
/// # Examples
///
/// ```rust,ignore
/// use sat_catalogos::{DirectoryRepository, SatCatalogos};
///
/// // Read catalog files from ~/.sat-catalogos/
/// let catalogos = SatCatalogos::new(DirectoryRepository::open_default());
/// let formas = catalogos.get_by_identifier("formasDePago")?;
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryRepository {
    root: PathBuf,
}

impl DirectoryRepository {
    /// Creates a repository reading catalog files from the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates a repository over [`default_directory`](Self::default_directory).
    pub fn open_default() -> Self {
        Self::new(Self::default_directory())
    }

    /// Returns the default directory: `~/.sat-catalogos/`
    ///
    /// Falls back to `./.sat-catalogos/` if the home directory cannot be
    /// determined.
    pub fn default_directory() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".sat-catalogos")
    }

    /// The directory catalog files are read from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn load_file(&self, catalog: &str) -> Result<Vec<Row>, LoadError> {
        let file = self.root.join(format!("{catalog}.json"));
        let content = fs::read_to_string(&file).map_err(|error| LoadError::Io {
            file: file.clone(),
            error,
        })?;
        let parsed: CatalogFile =
            serde_json::from_str(&content).map_err(|error| LoadError::Json { file, error })?;
        Ok(parsed.rows.into_iter().map(RawRow::into_row).collect())
    }
}

impl Repository for DirectoryRepository {
    fn rows(&self, catalog: &str) -> Result<Vec<Row>, RepositoryError> {
        self.load_file(catalog).map_err(RepositoryError::from)
    }
}
