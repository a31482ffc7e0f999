//! Tree Measurements
//!
//! `MeasurementInput` is the typed argument bundle of the estimator.
//! `RawMeasurement` is the same data as it arrives from a field form or a
//! CSV export, with every value still as text.

use crate::error::EstimationError;
use crate::utils::{parse_optional_number, parse_optional_text};
use serde::{Deserialize, Serialize};

/// Measurements and location of a single tree
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MeasurementInput {
    /// Diameter at breast height (cm)
    pub dbh_cm: Option<f64>,
    /// Total height (m)
    pub height_m: f64,
    /// Root collar diameter (cm), used when DBH is missing
    pub rcd_cm: Option<f64>,
    pub species: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl MeasurementInput {
    pub fn with_dbh(dbh_cm: f64, height_m: f64) -> Self {
        MeasurementInput {
            dbh_cm: Some(dbh_cm),
            height_m,
            ..Default::default()
        }
    }

    pub fn with_rcd(rcd_cm: f64, height_m: f64) -> Self {
        MeasurementInput {
            rcd_cm: Some(rcd_cm),
            height_m,
            ..Default::default()
        }
    }

    pub fn species(mut self, species: impl Into<String>) -> Self {
        self.species = Some(species.into());
        self
    }

    pub fn location(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Both coordinates, if present
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

/// Unparsed measurement record (one form submission or CSV row)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawMeasurement {
    pub tree_id: Option<String>,
    pub dbh_cm: Option<String>,
    pub height_m: Option<String>,
    pub rcd_cm: Option<String>,
    pub species: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

impl RawMeasurement {
    /// Convert into a typed input
    ///
    /// Blank values are treated as not measured. Non-numeric values and a
    /// missing height are `InvalidInput`.
    pub fn parse(&self) -> Result<MeasurementInput, EstimationError> {
        let height_m = parse_optional_number("height_m", self.height_m.as_deref())?
            .ok_or_else(|| EstimationError::invalid("height_m", "height is required"))?;

        Ok(MeasurementInput {
            dbh_cm: parse_optional_number("dbh_cm", self.dbh_cm.as_deref())?,
            height_m,
            rcd_cm: parse_optional_number("rcd_cm", self.rcd_cm.as_deref())?,
            species: parse_optional_text(self.species.as_deref()).map(str::to_string),
            latitude: parse_optional_number("latitude", self.latitude.as_deref())?,
            longitude: parse_optional_number("longitude", self.longitude.as_deref())?,
        })
    }
}
