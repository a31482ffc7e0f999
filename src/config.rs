//! Reference Data Configuration
//!
//! Where the zone shapefile and species table live. Read from a JSON file
//! or from environment variables; every key has a default.

use crate::zones::DEFAULT_ZONE_NAME_FIELD;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_DATA_DIR: &str = "data";
const ZONES_RELATIVE_PATH: &str = "gez2010/gez_2010_wgs84.shp";
const SPECIES_RELATIVE_PATH: &str = "species_allometrics.csv";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Zone polygon shapefile; None disables zone lookups
    pub zones_path: Option<PathBuf>,

    /// Attribute field holding the zone name
    pub zone_name_field: String,

    /// Species coefficient CSV; None disables species lookups
    pub species_path: Option<PathBuf>,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self::with_data_dir(DEFAULT_DATA_DIR)
    }
}

impl EstimatorConfig {
    /// Default file layout under a data directory
    pub fn with_data_dir(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        EstimatorConfig {
            zones_path: Some(data_dir.join(ZONES_RELATIVE_PATH)),
            zone_name_field: DEFAULT_ZONE_NAME_FIELD.to_string(),
            species_path: Some(data_dir.join(SPECIES_RELATIVE_PATH)),
        }
    }

    /// Load configuration from a JSON file; missing keys take defaults
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config JSON: {:?}", path))
    }

    /// Configuration from the environment
    ///
    /// - `DATA_DIR`: base directory (default `data`)
    /// - `ZONES_PATH`: zone shapefile, overrides the DATA_DIR layout
    /// - `ZONE_NAME_FIELD`: zone name attribute (default `gez_name`)
    /// - `SPECIES_COEFFICIENTS_PATH`: species CSV, overrides the DATA_DIR layout
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = lookup("DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
        let mut config = Self::with_data_dir(data_dir);

        if let Some(path) = lookup("ZONES_PATH") {
            config.zones_path = Some(PathBuf::from(path));
        }
        if let Some(field) = lookup("ZONE_NAME_FIELD") {
            config.zone_name_field = field;
        }
        if let Some(path) = lookup("SPECIES_COEFFICIENTS_PATH") {
            config.species_path = Some(PathBuf::from(path));
        }

        config
    }
}
