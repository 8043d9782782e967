use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::{Arc, Mutex};

use super::catalog::{Catalog, CatalogKind};
use super::repository::Repository;

/// Declares the closed set of catalog names at compile time.
///
/// Each row of the table binds a variant to its public identifier (the string
/// accepted by [`SatCatalogos::get_by_identifier`]), the source name used to
/// key the repository, and the [`CatalogKind`] the catalog is built with.
macro_rules! catalog_names {
    ($( ($variant:ident, $identifier:literal, $source:literal, $kind:ident), )+) => {
        /// The closed set of catalogs the registry can dispatch to.
        ///
        /// One variant per SAT code list, CFDI and payroll ("Nomina") families
        /// combined. The set is fixed at compile time; string identifiers
        /// outside it are rejected with [`RegistryError::UnknownCatalog`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum CatalogName {
            $(
                #[doc = concat!("The `", $identifier, "` catalog (source `", $source, "`).")]
                $variant,
            )+
        }

        impl CatalogName {
            /// Every catalog name, in declaration order.
            pub const ALL: &'static [CatalogName] = &[
                $( CatalogName::$variant, )+
            ];

            /// Resolves a public identifier to its catalog name.
            pub fn from_identifier(identifier: &str) -> Option<Self> {
                match identifier {
                    $( $identifier => Some(CatalogName::$variant), )+
                    _ => None,
                }
            }

            /// The public identifier callers use to request this catalog.
            pub fn identifier(self) -> &'static str {
                match self {
                    $( CatalogName::$variant => $identifier, )+
                }
            }

            /// The source name under which the repository keys this
            /// catalog's raw rows.
            pub fn source_name(self) -> &'static str {
                match self {
                    $( CatalogName::$variant => $source, )+
                }
            }

            /// The kind of catalog built from this source.
            pub fn kind(self) -> CatalogKind {
                match self {
                    $( CatalogName::$variant => CatalogKind::$kind, )+
                }
            }
        }
    };
}

catalog_names! {
    // CFDI
    (Aduanas, "aduanas", "cfdi_aduanas", Temporal),
    (ClavesUnidades, "clavesUnidades", "cfdi_claves_unidades", Temporal),
    (CodigosPostales, "codigosPostales", "cfdi_codigos_postales", Identifiable),
    (FormasDePago, "formasDePago", "cfdi_formas_de_pago", Temporal),
    (Impuestos, "impuestos", "cfdi_impuestos", Temporal),
    (MetodosDePago, "metodosDePago", "cfdi_metodos_de_pago", Temporal),
    (Monedas, "monedas", "cfdi_monedas", Temporal),
    (NumerosPedimentoAduana, "numerosPedimentoAduana", "cfdi_numeros_pedimento_aduana", Identifiable),
    (Paises, "paises", "cfdi_paises", Identifiable),
    (PatentesAduanales, "patentesAduanales", "cfdi_patentes_aduanales", Temporal),
    (ProductosServicios, "productosServicios", "cfdi_productos_servicios", Temporal),
    (RegimenesFiscales, "regimenesFiscales", "cfdi_regimenes_fiscales", Temporal),
    (ReglasTasaCuota, "reglasTasaCuota", "cfdi_reglas_tasa_cuota", Temporal),
    (TiposComprobantes, "tiposComprobantes", "cfdi_tipos_comprobantes", Temporal),
    (TiposFactores, "tiposFactores", "cfdi_tipos_factores", Temporal),
    (TiposRelaciones, "tiposRelaciones", "cfdi_tipos_relaciones", Temporal),
    (UsosCfdi, "usosCfdi", "cfdi_usos_cfdi", Temporal),
    // Nomina
    (Bancos, "bancos", "nomina_bancos", Temporal),
    (TiposContratos, "contratos", "nomina_tipos_contratos", Temporal),
    (TiposDeducciones, "deducciones", "nomina_tipos_deducciones", Temporal),
    (Estados, "estados", "nomina_estados", Identifiable),
    (TiposHoras, "horasExtras", "nomina_tipos_horas", Temporal),
    (TiposIncapacidades, "incapacidades", "nomina_tipos_incapacidades", Temporal),
    (TiposJornadas, "jornadas", "nomina_tipos_jornadas", Identifiable),
    (TiposNominas, "nominas", "nomina_tipos_nominas", Identifiable),
    (OrigenesRecursos, "origenesRecursos", "nomina_origenes_recursos", Temporal),
    (TiposOtrosPagos, "otrosTipoPago", "nomina_tipos_otros_pagos", Temporal),
    (TiposPercepciones, "percepciones", "nomina_tipos_percepciones", Temporal),
    (PeriodicidadesPagos, "periodicidadesPagos", "nomina_periodicidades_pagos", Temporal),
    (TiposRegimenes, "regimenesContratacion", "nomina_tipos_regimenes", Temporal),
    (RiesgosPuestos, "riesgosPuestos", "nomina_riesgos_puestos", Identifiable),
}

impl fmt::Display for CatalogName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// Errors raised while resolving a catalog through the registry.
#[derive(Debug)]
pub enum RegistryError {
    /// The identifier is not in the closed set of known catalogs.
    UnknownCatalog {
        /// The identifier that was requested.
        identifier: String,
    },
    /// The catalog could not be built; the underlying cause is preserved and
    /// the registry slot is left unbuilt so a later call can retry.
    Dispatch {
        /// The catalog that failed to build.
        name: CatalogName,
        /// The repository or construction failure.
        source: Box<dyn Error + Send + Sync>,
    },
}

impl RegistryError {
    fn dispatch(name: CatalogName, source: impl Error + Send + Sync + 'static) -> Self {
        RegistryError::Dispatch {
            name,
            source: Box::new(source),
        }
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::UnknownCatalog { identifier } => {
                write!(f, "no catalog is registered under '{}'", identifier)
            }
            RegistryError::Dispatch { name, source } => {
                write!(f, "cannot build catalog '{}': {}", name, source)
            }
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RegistryError::UnknownCatalog { .. } => None,
            RegistryError::Dispatch { source, .. } => {
                Some(source.as_ref() as &(dyn Error + 'static))
            }
        }
    }
}

/// The catalog registry: resolves a [`CatalogName`] to a lazily built,
/// memoized [`Catalog`] instance.
///
/// A catalog is built on first access — the injected [`Repository`] is asked
/// for that catalog's raw rows exactly once — and the built instance is
/// cached for the life of the registry. The cache lock is held across the
/// build, so concurrent first accesses still build each catalog at most
/// once. A failed build caches nothing; the next access retries from
/// scratch.
///
/// # Examples
///
/// ```
/// use sat_catalogos::{CatalogName, MemoryRepository, Row, SatCatalogos};
///
/// let mut repository = MemoryRepository::new();
/// repository.insert("nomina_tipos_nominas", vec![
///     Row::new().with_field("id", "O").with_field("texto", "Nómina ordinaria"),
/// ]);
///
/// let catalogos = SatCatalogos::new(repository);
/// let nominas = catalogos.get(CatalogName::TiposNominas).unwrap();
/// assert_eq!(nominas.obtain("O").unwrap().text(), "Nómina ordinaria");
///
/// // String entry point, with a closed identifier set.
/// assert!(catalogos.get_by_identifier("nominas").is_ok());
/// assert!(catalogos.get_by_identifier("unknown").is_err());
/// ```
#[derive(Debug)]
pub struct SatCatalogos<R: Repository> {
    repository: R,
    built: Mutex<HashMap<CatalogName, Arc<Catalog>>>,
}

impl<R: Repository> SatCatalogos<R> {
    /// Creates a registry over the given raw-data repository.
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            built: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the catalog for a name, building and caching it on first
    /// access.
    pub fn get(&self, name: CatalogName) -> Result<Arc<Catalog>, RegistryError> {
        let mut built = self.built.lock().unwrap();
        if let Some(catalog) = built.get(&name) {
            return Ok(Arc::clone(catalog));
        }

        let rows = self
            .repository
            .rows(name.source_name())
            .map_err(|error| RegistryError::dispatch(name, error))?;
        let catalog = Catalog::new(name.kind(), rows)
            .map_err(|error| RegistryError::dispatch(name, error))?;

        let catalog = Arc::new(catalog);
        built.insert(name, Arc::clone(&catalog));
        Ok(catalog)
    }

    /// Returns the catalog for a public identifier string.
    ///
    /// Fails with [`RegistryError::UnknownCatalog`] for identifiers outside
    /// the closed set; an unknown identifier never mutates registry state.
    pub fn get_by_identifier(&self, identifier: &str) -> Result<Arc<Catalog>, RegistryError> {
        let name = CatalogName::from_identifier(identifier).ok_or_else(|| {
            RegistryError::UnknownCatalog {
                identifier: identifier.to_string(),
            }
        })?;
        self.get(name)
    }
}
