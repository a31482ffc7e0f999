//! Allometric Coefficient Resolution
//!
//! Picks the `(a, b, c)` triple for the biomass equation
//! `AGB = a × DBH^b × H^c` using a fixed three-level policy:
//!
//! 1. Species table (loaded from `species_allometrics.csv`)
//! 2. Ecological zone table (compiled in)
//! 3. Generic default `{a: 0.25, b: 2.0, c: 1.0}`
//!
//! The first level that matches wins; levels are never merged.

use anyhow::{Context, Result};
use polars::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parameters of the allometric equation `AGB = a × DBH^b × H^c`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllometricCoefficients {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl AllometricCoefficients {
    /// Fallback used when neither species nor zone is recognised
    pub const DEFAULT: AllometricCoefficients = AllometricCoefficients::new(0.25, 2.0, 1.0);

    pub const fn new(a: f64, b: f64, c: f64) -> Self {
        AllometricCoefficients { a, b, c }
    }

    /// All three parameters finite and strictly positive
    pub fn is_valid(&self) -> bool {
        [self.a, self.b, self.c]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0)
    }
}

impl Default for AllometricCoefficients {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Which level of the policy produced the coefficients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoefficientSource {
    Species,
    Zone,
    Default,
}

impl CoefficientSource {
    pub fn display_name(&self) -> &'static str {
        match self {
            CoefficientSource::Species => "species-specific",
            CoefficientSource::Zone => "ecological zone",
            CoefficientSource::Default => "generic default",
        }
    }
}

/// Coefficients together with the policy level they came from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedCoefficients {
    pub coefficients: AllometricCoefficients,
    pub source: CoefficientSource,
}

// ============================================================================
// ZONE FALLBACK TABLE
// Keys are `gez_name` values of the FAO Global Ecological Zones layer
// ============================================================================

static ZONE_COEFFICIENTS: &[(&str, AllometricCoefficients)] = &[
    ("Tropical Rainforest", AllometricCoefficients::new(0.0509, 2.4, 1.0)),
    ("Tropical Moist Forest", AllometricCoefficients::new(0.060, 2.3, 1.0)),
    ("Tropical Dry Forest", AllometricCoefficients::new(0.045, 2.5, 1.0)),
    ("Temperate Forest", AllometricCoefficients::new(0.034, 2.6, 1.0)),
    ("Subtropical Northern Hemisphere", AllometricCoefficients::new(0.030, 2.4, 1.0)),
    ("Subtropical Southern Hemisphere", AllometricCoefficients::new(0.035, 2.3, 1.0)),
];

/// Look up the fallback coefficients for a zone name (exact match)
pub fn zone_coefficients(zone: &str) -> Option<AllometricCoefficients> {
    ZONE_COEFFICIENTS
        .iter()
        .find(|(name, _)| *name == zone)
        .map(|(_, coefficients)| *coefficients)
}

/// Zone names that have fallback coefficients
pub fn zone_table_names() -> impl Iterator<Item = &'static str> {
    ZONE_COEFFICIENTS.iter().map(|(name, _)| *name)
}

/// Normalise a species name into a table key (trimmed, lowercase)
///
/// Returns None for blank names.
pub fn normalize_species(species: &str) -> Option<String> {
    let key = species.trim().to_lowercase();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

/// Species name → allometric coefficients
#[derive(Debug, Clone, Default)]
pub struct SpeciesCoefficientTable {
    entries: FxHashMap<String, AllometricCoefficients>,
}

impl SpeciesCoefficientTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table from in-memory entries. Keys are normalised; blank keys
    /// are dropped and later duplicates replace earlier ones.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, AllometricCoefficients)>,
        S: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .filter_map(|(name, coefficients)| {
                normalize_species(name.as_ref()).map(|key| (key, coefficients))
            })
            .collect();

        SpeciesCoefficientTable { entries }
    }

    /// Load the species table, degrading to an empty table on any error
    ///
    /// The failure is logged once here; species lookups then fall through
    /// to the zone and default levels.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(table) => table,
            Err(e) => {
                tracing::warn!(
                    "Species coefficients unavailable ({:#}); using zone/default coefficients only",
                    e
                );
                Self::empty()
            }
        }
    }

    /// Load the species table from a CSV with columns `species,a,b,c`
    ///
    /// Every cell is read as text so malformed numbers can be reported per
    /// row instead of nulling out a whole column. Rows with a blank species
    /// or a missing, unparsable or non-positive coefficient are skipped.
    pub fn try_load(path: &Path) -> Result<Self> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .try_into_reader_with_file_path(Some(path.into()))
            .with_context(|| format!("Failed to create CSV reader: {:?}", path))?
            .finish()
            .with_context(|| format!("Failed to load species coefficients: {:?}", path))?;

        let species = text_column(&df, "species")?;
        let a = text_column(&df, "a")?;
        let b = text_column(&df, "b")?;
        let c = text_column(&df, "c")?;

        let mut entries = FxHashMap::default();
        let mut skipped = 0usize;

        for idx in 0..df.height() {
            let key = species.get(idx).and_then(normalize_species);
            let coefficients = match (
                parse_cell(a.get(idx)),
                parse_cell(b.get(idx)),
                parse_cell(c.get(idx)),
            ) {
                (Some(a), Some(b), Some(c)) => Some(AllometricCoefficients::new(a, b, c)),
                _ => None,
            };

            match (key, coefficients) {
                (Some(key), Some(coefficients)) if coefficients.is_valid() => {
                    entries.insert(key, coefficients);
                }
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::warn!(
                "Skipped {} malformed species coefficient rows in {:?}",
                skipped,
                path
            );
        }
        tracing::info!("Loaded {} species coefficient entries from {:?}", entries.len(), path);

        Ok(SpeciesCoefficientTable { entries })
    }

    /// Look up a species by raw (un-normalised) name
    pub fn get(&self, species: &str) -> Option<AllometricCoefficients> {
        normalize_species(species).and_then(|key| self.entries.get(&key).copied())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn text_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked> {
    df.column(name)
        .with_context(|| format!("Column '{}' not found", name))?
        .str()
        .with_context(|| format!("Column '{}' is not string type", name))
}

fn parse_cell(cell: Option<&str>) -> Option<f64> {
    cell.and_then(|text| text.trim().parse::<f64>().ok())
}

/// Applies the species → zone → default policy
#[derive(Debug, Clone, Default)]
pub struct CoefficientResolver {
    species: SpeciesCoefficientTable,
}

impl CoefficientResolver {
    pub fn new(species: SpeciesCoefficientTable) -> Self {
        CoefficientResolver { species }
    }

    /// Resolve coefficients for an optional species and zone. Never fails.
    pub fn resolve(&self, species: Option<&str>, zone: Option<&str>) -> ResolvedCoefficients {
        if let Some(coefficients) = species.and_then(|s| self.species.get(s)) {
            return ResolvedCoefficients {
                coefficients,
                source: CoefficientSource::Species,
            };
        }

        if let Some(coefficients) = zone.and_then(zone_coefficients) {
            return ResolvedCoefficients {
                coefficients,
                source: CoefficientSource::Zone,
            };
        }

        tracing::trace!("No species or zone coefficients for {:?}/{:?}", species, zone);
        ResolvedCoefficients {
            coefficients: AllometricCoefficients::DEFAULT,
            source: CoefficientSource::Default,
        }
    }

    pub fn species_table(&self) -> &SpeciesCoefficientTable {
        &self.species
    }
}
