//! Reference Data Loading
//!
//! Loads the two reference datasets once per process:
//! - Species allometric coefficients (CSV, via Polars)
//! - Ecological zone polygons (shapefile)
//!
//! Both loads degrade to empty tables on failure; the estimator keeps
//! working with zone/default coefficients. Also reads measurement batches
//! exported from the field-collection forms.

use crate::coefficients::SpeciesCoefficientTable;
use crate::config::EstimatorConfig;
use crate::measurement::RawMeasurement;
use crate::zones::ZoneResolver;
use anyhow::{Context, Result};
use polars::prelude::*;
use std::path::Path;

/// Immutable reference tables shared by every estimate
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub species: SpeciesCoefficientTable,
    pub zones: ZoneResolver,
}

impl ReferenceData {
    pub fn new(species: SpeciesCoefficientTable, zones: ZoneResolver) -> Self {
        ReferenceData { species, zones }
    }

    /// No species entries and no zones: every estimate uses default coefficients
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load both tables as configured, never failing
    pub fn from_config(config: &EstimatorConfig) -> Self {
        let species = match &config.species_path {
            Some(path) => SpeciesCoefficientTable::load(path),
            None => {
                tracing::info!("No species coefficient table configured");
                SpeciesCoefficientTable::empty()
            }
        };

        let zones = match &config.zones_path {
            Some(path) => ZoneResolver::load(path, &config.zone_name_field),
            None => {
                tracing::info!("No ecological zone layer configured");
                ZoneResolver::empty()
            }
        };

        tracing::info!(
            "Reference data ready: {} species, {} zones",
            species.len(),
            zones.len()
        );

        ReferenceData { species, zones }
    }
}

const MEASUREMENT_COLUMNS: [&str; 7] = [
    "tree_id",
    "dbh_cm",
    "height_m",
    "rcd_cm",
    "species",
    "latitude",
    "longitude",
];

/// Load a measurement batch from CSV
///
/// Every column is read as text and parsed per record later, so one bad
/// cell only fails its own tree. Unknown columns are ignored; any of the
/// measurement columns may be missing.
pub fn load_measurements(path: &Path) -> Result<Vec<RawMeasurement>> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.into()))
        .with_context(|| format!("Failed to create CSV reader: {:?}", path))?
        .finish()
        .with_context(|| format!("Failed to load measurements: {:?}", path))?;

    let mut columns: Vec<Option<&StringChunked>> = Vec::with_capacity(MEASUREMENT_COLUMNS.len());
    for name in MEASUREMENT_COLUMNS {
        let column = match df.column(name) {
            Ok(column) => Some(
                column
                    .str()
                    .with_context(|| format!("Column '{}' is not string type", name))?,
            ),
            Err(_) => None,
        };
        columns.push(column);
    }

    let cell = |col: usize, idx: usize| -> Option<String> {
        columns[col]
            .and_then(|values| values.get(idx))
            .map(|s| s.to_string())
    };

    let records: Vec<RawMeasurement> = (0..df.height())
        .map(|idx| RawMeasurement {
            tree_id: cell(0, idx),
            dbh_cm: cell(1, idx),
            height_m: cell(2, idx),
            rcd_cm: cell(3, idx),
            species: cell(4, idx),
            latitude: cell(5, idx),
            longitude: cell(6, idx),
        })
        .collect();

    tracing::info!("Loaded {} measurement records from {:?}", records.len(), path);

    Ok(records)
}
