use crate::batch::BatchSummary;
use crate::estimator::{
    DiameterSource, EstimationResult, CARBON_FRACTION, CO2_PER_CARBON, DRY_MATTER_FRACTION,
    RCD_TO_DBH_FACTOR, ROOT_SHOOT_MULTIPLIER,
};

/// Markdown formatter for estimate breakdowns
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    /// Format a single-tree breakdown
    ///
    /// `species` is the name as entered; the result only records whether a
    /// species entry matched.
    pub fn format(result: &EstimationResult, species: Option<&str>) -> String {
        let mut md = String::with_capacity(1024);

        md.push_str("## CO₂ Calculation Breakdown\n\n");

        match result.dbh_source {
            DiameterSource::Measured => {
                md.push_str(&format!("- **DBH:** {:.2} cm\n", result.dbh_cm));
            }
            DiameterSource::DerivedFromRcd => {
                md.push_str(&format!(
                    "- **DBH:** {:.2} cm (root collar diameter × {})\n",
                    result.dbh_cm, RCD_TO_DBH_FACTOR
                ));
            }
        }
        md.push_str(&format!("- **Height:** {:.2} m\n", result.height_m));
        md.push_str(&format!(
            "- **Species:** {}\n",
            species.map(str::trim).filter(|s| !s.is_empty()).unwrap_or("Unknown")
        ));

        let (Some(coefficients), Some(source)) = (result.coefficients, result.coefficient_source)
        else {
            md.push_str("\nNo measurable biomass: diameter and height must both be positive.\n\n");
            md.push_str("**CO₂ Sequestered:** 0.00 kg\n");
            return md;
        };

        md.push_str(&format!(
            "- **Ecological Zone:** {}\n",
            result.zone.as_deref().unwrap_or("Unknown")
        ));
        md.push_str(&format!(
            "- **Coefficients used:** a = {}, b = {}, c = {} ({})\n",
            coefficients.a,
            coefficients.b,
            coefficients.c,
            source.display_name()
        ));
        md.push_str(&format!(
            "- **Above-Ground Biomass (AGB):** {:.2} kg\n",
            result.agb_kg
        ));
        md.push_str(&format!(
            "- **Total Biomass (AGB × {}):** {:.2} kg\n",
            ROOT_SHOOT_MULTIPLIER, result.total_biomass_kg
        ));
        md.push_str(&format!(
            "- **Dry Weight (Total Biomass × {}):** {:.2} kg\n",
            DRY_MATTER_FRACTION, result.dry_weight_kg
        ));
        md.push_str(&format!(
            "- **Carbon Content (Dry Weight × {}):** {:.2} kg\n\n",
            CARBON_FRACTION, result.carbon_kg
        ));
        md.push_str(&format!(
            "**CO₂ Sequestered (Carbon × {}):** {:.2} kg\n",
            CO2_PER_CARBON, result.co2_kg
        ));

        md
    }

    /// Format batch totals
    pub fn format_summary(summary: &BatchSummary) -> String {
        let mut md = String::with_capacity(256);

        md.push_str("## Batch Summary\n\n");
        md.push_str(&format!("- **Trees:** {}\n", summary.trees));
        md.push_str(&format!("- **Estimated:** {}\n", summary.estimated));
        if summary.zero_estimates > 0 {
            md.push_str(&format!(
                "- **Zero estimates (non-positive dimensions):** {}\n",
                summary.zero_estimates
            ));
        }
        if summary.failed > 0 {
            md.push_str(&format!("- **Rejected:** {}\n", summary.failed));
        }
        md.push_str(&format!(
            "\n**Total CO₂ Sequestered:** {:.2} kg\n",
            summary.total_co2_kg
        ));

        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coefficients::{AllometricCoefficients, SpeciesCoefficientTable};
    use crate::data::ReferenceData;
    use crate::estimator::BiomassEstimator;
    use crate::measurement::MeasurementInput;
    use crate::zones::ZoneResolver;

    fn oak_estimator() -> BiomassEstimator {
        BiomassEstimator::new(ReferenceData::new(
            SpeciesCoefficientTable::from_entries([(
                "oak",
                AllometricCoefficients::new(0.06, 2.3, 1.0),
            )]),
            ZoneResolver::empty(),
        ))
    }

    #[test]
    fn test_format_species_breakdown() {
        let result = oak_estimator()
            .estimate(&MeasurementInput::with_dbh(20.0, 10.0).species("oak"))
            .unwrap();

        let md = MarkdownFormatter::format(&result, Some("oak"));

        assert!(md.contains("- **DBH:** 20.00 cm\n"));
        assert!(md.contains("- **Height:** 10.00 m\n"));
        assert!(md.contains("- **Species:** oak\n"));
        assert!(md.contains("- **Ecological Zone:** Unknown\n"));
        assert!(md.contains("a = 0.06, b = 2.3, c = 1 (species-specific)"));
        assert!(md.contains("Total Biomass (AGB × 1.2)"));
        assert!(md.contains("Dry Weight (Total Biomass × 0.725)"));
        assert!(md.contains(&format!("{:.2} kg", result.co2_kg)));
    }

    #[test]
    fn test_format_rcd_and_default() {
        let result = oak_estimator()
            .estimate(&MeasurementInput::with_rcd(10.0, 5.0))
            .unwrap();

        let md = MarkdownFormatter::format(&result, None);

        assert!(md.contains("- **DBH:** 8.00 cm (root collar diameter × 0.8)"));
        assert!(md.contains("- **Species:** Unknown\n"));
        assert!(md.contains("(generic default)"));
    }

    #[test]
    fn test_format_zero_estimate() {
        let result = oak_estimator()
            .estimate(&MeasurementInput::with_dbh(0.0, 5.0))
            .unwrap();

        let md = MarkdownFormatter::format(&result, Some("  "));

        assert!(md.contains("No measurable biomass"));
        assert!(md.contains("**CO₂ Sequestered:** 0.00 kg"));
        assert!(!md.contains("Coefficients used"));
    }

    #[test]
    fn test_format_summary() {
        let summary = BatchSummary {
            trees: 4,
            estimated: 3,
            zero_estimates: 1,
            failed: 1,
            total_co2_kg: 1234.567,
        };

        let md = MarkdownFormatter::format_summary(&summary);

        assert!(md.contains("- **Trees:** 4\n"));
        assert!(md.contains("- **Rejected:** 1\n"));
        assert!(md.contains("**Total CO₂ Sequestered:** 1234.57 kg"));
    }
}
