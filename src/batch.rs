//! Batch Estimation
//!
//! Estimates many trees at once (monitoring exports, inventory recounts).
//! Each record is independent: a malformed record fails alone and the rest
//! of the batch still produces estimates.

use crate::estimator::{BiomassEstimator, EstimationResult};
use crate::measurement::RawMeasurement;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Outcome for one record, in input order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub tree_id: Option<String>,
    pub result: Option<EstimationResult>,
    pub error: Option<String>,
}

/// Totals over a batch
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub trees: usize,
    /// Records that produced an estimate (including zero estimates)
    pub estimated: usize,
    pub zero_estimates: usize,
    pub failed: usize,
    pub total_co2_kg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
    pub summary: BatchSummary,
}

impl BatchSummary {
    fn from_entries(entries: &[BatchEntry]) -> Self {
        entries.iter().fold(
            BatchSummary {
                trees: entries.len(),
                ..Default::default()
            },
            |mut summary, entry| {
                match &entry.result {
                    Some(result) => {
                        summary.estimated += 1;
                        if result.is_zero() {
                            summary.zero_estimates += 1;
                        }
                        summary.total_co2_kg += result.co2_kg;
                    }
                    None => summary.failed += 1,
                }
                summary
            },
        )
    }
}

impl BiomassEstimator {
    /// Parse and estimate every record in parallel
    pub fn estimate_batch(&self, records: &[RawMeasurement]) -> BatchReport {
        let entries: Vec<BatchEntry> = records
            .par_iter()
            .map(|record| {
                let outcome = record.parse().and_then(|input| self.estimate(&input));
                match outcome {
                    Ok(result) => BatchEntry {
                        tree_id: record.tree_id.clone(),
                        result: Some(result),
                        error: None,
                    },
                    Err(e) => BatchEntry {
                        tree_id: record.tree_id.clone(),
                        result: None,
                        error: Some(e.to_string()),
                    },
                }
            })
            .collect();

        let summary = BatchSummary::from_entries(&entries);

        if summary.failed > 0 {
            tracing::info!(
                "Batch of {} trees: {} estimated, {} rejected",
                summary.trees,
                summary.estimated,
                summary.failed
            );
        }

        BatchReport { entries, summary }
    }
}
