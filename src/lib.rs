//! Tree Carbon Estimator
//!
//! Estimates the CO2 stock of planted trees from field measurements:
//! - `zones/`: FAO ecological zone lookup (shapefile, point-in-polygon)
//! - `coefficients/`: species → zone → default allometric coefficients
//! - `estimator/`: DBH/RCD handling and the biomass → CO2 pipeline
//! - `batch/`: parallel estimation over monitoring exports
//! - `explanation/`: markdown and JSON breakdowns
//!
//! Reference data is loaded once and read-only afterwards; estimates are
//! pure and safe to run from any number of threads.

pub mod batch;
pub mod coefficients;
pub mod config;
pub mod data;
pub mod error;
pub mod estimator;
pub mod explanation;
pub mod measurement;
pub mod utils;
pub mod zones;

// Re-export commonly used types
pub use batch::{BatchEntry, BatchReport, BatchSummary};
pub use coefficients::{
    AllometricCoefficients, CoefficientResolver, CoefficientSource, ResolvedCoefficients,
    SpeciesCoefficientTable,
};
pub use config::EstimatorConfig;
pub use data::{load_measurements, ReferenceData};
pub use error::EstimationError;
pub use estimator::{shared_estimator, BiomassEstimator, DiameterSource, EstimationResult};
pub use measurement::{MeasurementInput, RawMeasurement};
pub use zones::{EcologicalZone, ZoneResolver};
