//! Read-only catalogs for Mexican SAT code lists.
//!
//! This crate implements the reference-data catalogs mandated by the CFDI
//! electronic-invoice standard and the payroll ("Nomina") complement: units,
//! currencies, tax regimes, payroll concept codes, and so on. Each catalog
//! maps short textual codes to descriptive entries, optionally bounded by a
//! validity window, and a registry resolves catalog identifiers to lazily
//! built, memoized catalog instances.
//!
//! # Basic Usage
//!
//! ```rust
//! use sat_catalogos::{CatalogName, MemoryRepository, Row, SatCatalogos};
//!
//! // Any type implementing `Repository` can supply the raw rows.
//! let mut repository = MemoryRepository::new();
//! repository.insert("nomina_tipos_nominas", vec![
//!     Row::new()
//!         .with_field("id", "O")
//!         .with_field("texto", "Nómina ordinaria")
//!         .with_field("vigencia_desde", "2017-07-29"),
//! ]);
//!
//! let catalogos = SatCatalogos::new(repository);
//!
//! // Catalogs are built on first access and cached afterwards.
//! let nominas = catalogos.get(CatalogName::TiposNominas).unwrap();
//! let entry = nominas.obtain("O").unwrap();
//! assert_eq!(entry.text(), "Nómina ordinaria");
//! assert!(entry.valid_from() > 0);
//! assert_eq!(entry.valid_until(), 0);
//! ```
//!
//! # Validity windows
//!
//! Some SAT catalogs reuse a code with a redefined description over time.
//! Those catalogs are built as [`CatalogKind::Temporal`]: lookups filter by
//! the validity window at call time, and can match on the exact description
//! with [`Catalog::obtain_with_text`] to pin down a reused code. Catalogs
//! whose codes are never redefined are [`CatalogKind::Identifiable`] and key
//! on the code alone.
//!
//! # Directory Repository Feature
//!
//! When the `directory-repository` feature is enabled (default), catalog
//! rows can be read from per-catalog JSON files in a directory (by default
//! `~/.sat-catalogos/`):
//!
//! ```rust,ignore
//! use sat_catalogos::{DirectoryRepository, SatCatalogos};
//!
//! let catalogos = SatCatalogos::new(DirectoryRepository::open_default());
//! let monedas = catalogos.get_by_identifier("monedas")?;
//! ```
//!
//! To disable at compile time:
//!
//! ```toml
//! [dependencies]
//! sat-catalogos = { version = "0.1", default-features = false }
//! ```

mod entry;
pub use entry::Entry;

mod catalog;
pub use catalog::{
    Catalog, CatalogError, CatalogKind, FIELD_ID, FIELD_TEXT, FIELD_VALID_FROM,
    FIELD_VALID_UNTIL, Row,
};

mod repository;
pub use repository::{MemoryRepository, Repository, RepositoryError};

mod registry;
pub use registry::{CatalogName, RegistryError, SatCatalogos};

#[cfg(feature = "directory-repository")]
mod directory_repository;

#[cfg(feature = "directory-repository")]
pub use directory_repository::{CatalogFile, DirectoryRepository, LoadError, RawRow};
