//! Biomass and CO2 Estimation
//!
//! Converts tree measurements into a CO2-equivalent stock estimate:
//!
//! 1. Diameter: DBH, or RCD × 0.8 when DBH was not measured
//! 2. Validation: non-finite values are rejected; non-positive dimensions
//!    give a zero estimate
//! 3. Zone: point-in-polygon lookup when both coordinates are present
//! 4. Coefficients: species → zone → default
//! 5. Pipeline:
//!    - AGB = a × DBH^b × H^c
//!    - total biomass = AGB × 1.2 (root-to-shoot ratio 0.2)
//!    - dry weight = total × 0.725
//!    - carbon = dry weight × 0.5
//!    - CO2 = carbon × 3.67 (44/12)
//!
//! The result is the total CO2 stock of the tree (kg), not an annual rate.

use crate::coefficients::{AllometricCoefficients, CoefficientResolver, CoefficientSource};
use crate::config::EstimatorConfig;
use crate::data::ReferenceData;
use crate::error::EstimationError;
use crate::measurement::MeasurementInput;
use crate::zones::ZoneResolver;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

/// DBH ≈ RCD × 0.8 (approximate, not species or site adjusted)
pub const RCD_TO_DBH_FACTOR: f64 = 0.8;
/// Total / above-ground biomass, from a root-to-shoot ratio of 0.2
pub const ROOT_SHOOT_MULTIPLIER: f64 = 1.2;
pub const DRY_MATTER_FRACTION: f64 = 0.725;
pub const CARBON_FRACTION: f64 = 0.5;
/// Molar mass ratio CO2 / C
pub const CO2_PER_CARBON: f64 = 3.67;

/// How the diameter used in the equation was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiameterSource {
    Measured,
    DerivedFromRcd,
}

/// Estimate with every intermediate value, for display and auditing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationResult {
    pub co2_kg: f64,
    pub zone: Option<String>,
    /// None when the estimate short-circuited to zero
    pub coefficients: Option<AllometricCoefficients>,
    pub coefficient_source: Option<CoefficientSource>,
    pub agb_kg: f64,
    pub total_biomass_kg: f64,
    pub dry_weight_kg: f64,
    pub carbon_kg: f64,
    /// Diameter actually used (cm)
    pub dbh_cm: f64,
    pub dbh_source: DiameterSource,
    pub height_m: f64,
}

impl EstimationResult {
    fn zero(dbh_cm: f64, dbh_source: DiameterSource, height_m: f64) -> Self {
        EstimationResult {
            co2_kg: 0.0,
            zone: None,
            coefficients: None,
            coefficient_source: None,
            agb_kg: 0.0,
            total_biomass_kg: 0.0,
            dry_weight_kg: 0.0,
            carbon_kg: 0.0,
            dbh_cm,
            dbh_source,
            height_m,
        }
    }

    /// True when a non-positive dimension short-circuited the pipeline
    pub fn is_zero(&self) -> bool {
        self.coefficients.is_none()
    }
}

/// Intermediate masses of the conversion pipeline (kg)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiomassBreakdown {
    pub agb_kg: f64,
    pub total_biomass_kg: f64,
    pub dry_weight_kg: f64,
    pub carbon_kg: f64,
    pub co2_kg: f64,
}

/// Run the fixed conversion pipeline for one tree
///
/// Expects `dbh_cm > 0` and `height_m > 0`.
pub fn biomass_pipeline(
    coefficients: &AllometricCoefficients,
    dbh_cm: f64,
    height_m: f64,
) -> BiomassBreakdown {
    let agb_kg = coefficients.a * dbh_cm.powf(coefficients.b) * height_m.powf(coefficients.c);
    let total_biomass_kg = agb_kg * ROOT_SHOOT_MULTIPLIER;
    let dry_weight_kg = total_biomass_kg * DRY_MATTER_FRACTION;
    let carbon_kg = dry_weight_kg * CARBON_FRACTION;
    let co2_kg = carbon_kg * CO2_PER_CARBON;

    BiomassBreakdown {
        agb_kg,
        total_biomass_kg,
        dry_weight_kg,
        carbon_kg,
        co2_kg,
    }
}

/// End-to-end estimator over immutable reference data
///
/// Reference data sits behind `Arc`, so clones share the loaded zones and
/// species table. Estimates never mutate anything.
#[derive(Debug, Clone, Default)]
pub struct BiomassEstimator {
    zones: Arc<ZoneResolver>,
    coefficients: Arc<CoefficientResolver>,
}

impl BiomassEstimator {
    pub fn new(reference: ReferenceData) -> Self {
        BiomassEstimator {
            zones: Arc::new(reference.zones),
            coefficients: Arc::new(CoefficientResolver::new(reference.species)),
        }
    }

    /// Load reference data as configured (degrading on missing files)
    pub fn from_config(config: &EstimatorConfig) -> Self {
        Self::new(ReferenceData::from_config(config))
    }

    pub fn zone_resolver(&self) -> &ZoneResolver {
        &self.zones
    }

    pub fn coefficient_resolver(&self) -> &CoefficientResolver {
        &self.coefficients
    }

    /// Estimate the CO2 stock of one tree
    ///
    /// Fails only with `InvalidInput`: no diameter at all, or a non-finite
    /// diameter or height.
    pub fn estimate(&self, input: &MeasurementInput) -> Result<EstimationResult, EstimationError> {
        let (dbh_cm, dbh_source) = match (input.dbh_cm, input.rcd_cm) {
            (Some(dbh), _) => (dbh, DiameterSource::Measured),
            (None, Some(rcd)) => (rcd * RCD_TO_DBH_FACTOR, DiameterSource::DerivedFromRcd),
            (None, None) => {
                return Err(EstimationError::invalid(
                    "dbh_cm",
                    "either DBH or root collar diameter is required",
                ))
            }
        };

        if !dbh_cm.is_finite() {
            let field = match dbh_source {
                DiameterSource::Measured => "dbh_cm",
                DiameterSource::DerivedFromRcd => "rcd_cm",
            };
            return Err(EstimationError::invalid(field, "diameter must be a finite number"));
        }
        if !input.height_m.is_finite() {
            return Err(EstimationError::invalid("height_m", "height must be a finite number"));
        }

        if dbh_cm <= 0.0 || input.height_m <= 0.0 {
            return Ok(EstimationResult::zero(dbh_cm, dbh_source, input.height_m));
        }

        let zone = input
            .coordinates()
            .and_then(|(lat, lon)| self.zones.classify(lat, lon));

        let resolved = self.coefficients.resolve(input.species.as_deref(), zone);
        let breakdown = biomass_pipeline(&resolved.coefficients, dbh_cm, input.height_m);

        tracing::debug!(
            "Estimated {:.3} kg CO2 (dbh {} cm, height {} m, zone {:?}, {:?} coefficients)",
            breakdown.co2_kg,
            dbh_cm,
            input.height_m,
            zone,
            resolved.source
        );

        Ok(EstimationResult {
            co2_kg: breakdown.co2_kg,
            zone: zone.map(str::to_string),
            coefficients: Some(resolved.coefficients),
            coefficient_source: Some(resolved.source),
            agb_kg: breakdown.agb_kg,
            total_biomass_kg: breakdown.total_biomass_kg,
            dry_weight_kg: breakdown.dry_weight_kg,
            carbon_kg: breakdown.carbon_kg,
            dbh_cm,
            dbh_source,
            height_m: input.height_m,
        })
    }

    /// Positional form of [`estimate`](Self::estimate)
    pub fn estimate_co2(
        &self,
        dbh_cm: Option<f64>,
        height_m: f64,
        rcd_cm: Option<f64>,
        species: Option<&str>,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<EstimationResult, EstimationError> {
        self.estimate(&MeasurementInput {
            dbh_cm,
            height_m,
            rcd_cm,
            species: species.map(str::to_string),
            latitude,
            longitude,
        })
    }
}

static SHARED_ESTIMATOR: OnceLock<BiomassEstimator> = OnceLock::new();

/// Process-wide estimator, built on first use from `EstimatorConfig::from_env()`
///
/// Later calls return the same instance; reference files are read once.
pub fn shared_estimator() -> &'static BiomassEstimator {
    SHARED_ESTIMATOR.get_or_init(|| BiomassEstimator::from_config(&EstimatorConfig::from_env()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coefficients::SpeciesCoefficientTable;
    use approx::assert_relative_eq;

    fn estimator_with(species: &[(&str, AllometricCoefficients)]) -> BiomassEstimator {
        BiomassEstimator::new(ReferenceData::new(
            SpeciesCoefficientTable::from_entries(species.iter().copied()),
            ZoneResolver::empty(),
        ))
    }

    #[test]
    fn test_pipeline_constants() {
        let breakdown = biomass_pipeline(&AllometricCoefficients::new(1.0, 1.0, 1.0), 1.0, 1.0);
        assert_relative_eq!(breakdown.agb_kg, 1.0);
        assert_relative_eq!(breakdown.total_biomass_kg, 1.2);
        assert_relative_eq!(breakdown.dry_weight_kg, 0.87, epsilon = 1e-12);
        assert_relative_eq!(breakdown.carbon_kg, 0.435, epsilon = 1e-12);
        assert_relative_eq!(breakdown.co2_kg, 1.59645, epsilon = 1e-6);
    }

    #[test]
    fn test_default_coefficients_without_reference_data() {
        let estimator = BiomassEstimator::default();
        let result = estimator
            .estimate(&MeasurementInput::with_dbh(10.0, 5.0))
            .expect("Estimate failed");

        // 0.25 × 10² × 5 = 125 kg AGB
        assert_relative_eq!(result.agb_kg, 125.0, epsilon = 1e-9);
        assert_relative_eq!(result.co2_kg, 125.0 * 1.2 * 0.725 * 0.5 * 3.67, epsilon = 1e-9);
        assert_eq!(result.coefficient_source, Some(CoefficientSource::Default));
        assert_eq!(result.zone, None);
        assert_eq!(result.dbh_source, DiameterSource::Measured);
    }

    #[test]
    fn test_rcd_fallback() {
        let estimator = BiomassEstimator::default();
        let derived = estimator
            .estimate(&MeasurementInput::with_rcd(10.0, 5.0))
            .expect("Estimate failed");
        let direct = estimator
            .estimate(&MeasurementInput::with_dbh(8.0, 5.0))
            .expect("Estimate failed");

        assert_eq!(derived.dbh_cm, 8.0);
        assert_eq!(derived.dbh_source, DiameterSource::DerivedFromRcd);
        assert_eq!(derived.co2_kg, direct.co2_kg);
    }

    #[test]
    fn test_measured_dbh_takes_precedence_over_rcd() {
        let estimator = BiomassEstimator::default();
        let input = MeasurementInput {
            dbh_cm: Some(0.0),
            rcd_cm: Some(10.0),
            height_m: 5.0,
            ..Default::default()
        };
        let result = estimator.estimate(&input).expect("Estimate failed");
        assert_eq!(result.co2_kg, 0.0);
        assert_eq!(result.dbh_source, DiameterSource::Measured);
    }

    #[test]
    fn test_zero_dimensions() {
        let estimator = estimator_with(&[("oak", AllometricCoefficients::new(0.06, 2.3, 1.0))]);

        for input in [
            MeasurementInput::with_dbh(0.0, 5.0).species("oak"),
            MeasurementInput::with_dbh(5.0, 0.0).species("oak"),
            MeasurementInput::with_dbh(-3.0, 5.0),
            MeasurementInput::with_rcd(-1.0, 5.0),
        ] {
            let result = estimator.estimate(&input).expect("Zero estimate must not fail");
            assert_eq!(result.co2_kg, 0.0);
            assert_eq!(result.agb_kg, 0.0);
            assert!(result.is_zero());
        }
    }

    #[test]
    fn test_missing_diameter_is_invalid() {
        let err = BiomassEstimator::default()
            .estimate_co2(None, 5.0, None, Some("oak"), None, None)
            .unwrap_err();
        assert_eq!(err.field(), "dbh_cm");
    }

    #[test]
    fn test_non_finite_values_are_invalid() {
        let estimator = BiomassEstimator::default();

        let err = estimator
            .estimate(&MeasurementInput::with_dbh(10.0, f64::NAN))
            .unwrap_err();
        assert_eq!(err.field(), "height_m");

        let err = estimator
            .estimate(&MeasurementInput::with_dbh(f64::INFINITY, 5.0))
            .unwrap_err();
        assert_eq!(err.field(), "dbh_cm");

        let err = estimator
            .estimate(&MeasurementInput::with_rcd(f64::NAN, 5.0))
            .unwrap_err();
        assert_eq!(err.field(), "rcd_cm");
    }

    #[test]
    fn test_species_coefficients_used() {
        let estimator = estimator_with(&[("oak", AllometricCoefficients::new(0.06, 2.3, 1.0))]);
        let result = estimator
            .estimate_co2(Some(20.0), 10.0, None, Some("Oak"), Some(999.0), Some(999.0))
            .expect("Estimate failed");

        let agb = 0.06 * 20f64.powf(2.3) * 10.0;
        assert_relative_eq!(result.agb_kg, agb, max_relative = 1e-12);
        assert_relative_eq!(result.co2_kg, agb * 1.2 * 0.725 * 0.5 * 3.67, max_relative = 1e-12);
        assert_eq!(result.coefficient_source, Some(CoefficientSource::Species));
    }

    #[test]
    fn test_monotonic_in_dimensions() {
        let estimator = BiomassEstimator::default();
        let co2 = |dbh: f64, height: f64| {
            estimator
                .estimate(&MeasurementInput::with_dbh(dbh, height))
                .expect("Estimate failed")
                .co2_kg
        };

        assert!(co2(10.0, 5.0) < co2(10.5, 5.0));
        assert!(co2(10.0, 5.0) < co2(10.0, 5.5));
        assert!(co2(0.5, 0.5) < co2(1.0, 0.5));
    }

    #[test]
    fn test_clones_share_reference_data() {
        let estimator = estimator_with(&[("oak", AllometricCoefficients::new(0.06, 2.3, 1.0))]);
        let clone = estimator.clone();

        assert!(Arc::ptr_eq(&estimator.zones, &clone.zones));
        assert!(Arc::ptr_eq(&estimator.coefficients, &clone.coefficients));
        assert!(std::ptr::eq(
            estimator.coefficient_resolver().species_table(),
            clone.coefficient_resolver().species_table()
        ));
    }

    #[test]
    fn test_shared_estimator_is_initialised_once() {
        let first = shared_estimator() as *const BiomassEstimator;
        let second = shared_estimator() as *const BiomassEstimator;
        assert_eq!(first, second);
    }
}
