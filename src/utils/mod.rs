//! Utility modules
//!
//! - Parsing: lenient conversion of raw form values into numbers

pub mod parsing;

pub use parsing::{parse_optional_number, parse_optional_text};
