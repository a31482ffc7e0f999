//! Human-readable estimate breakdowns
//!
//! Renders an `EstimationResult` step by step (diameter, zone, coefficients,
//! each pipeline stage) for field staff and donors.

pub mod formatters;

pub use formatters::{JsonFormatter, MarkdownFormatter};
