use serde::{Deserialize, Serialize};
use std::fmt;

use crate::units::CanonicalUnit;

/// A measurement ready for output. `value` is the digits exactly as matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedValue {
    pub value: String,
    pub unit: CanonicalUnit,
}

impl ExtractedValue {
    pub fn new(value: impl Into<String>, unit: CanonicalUnit) -> Self {
        Self { value: value.into(), unit }
    }
}

impl fmt::Display for ExtractedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// How extraction ended for one row. Only `Found` yields a non-empty prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    Found(ExtractedValue),
    /// The requested kind had no detections at all.
    NoMatch,
    /// Detections existed but none carried a unit allowed for the kind.
    UnsupportedUnit { raw_unit: String },
}

impl ExtractionOutcome {
    pub fn into_prediction(self) -> String {
        match self {
            ExtractionOutcome::Found(v) => v.to_string(),
            ExtractionOutcome::NoMatch | ExtractionOutcome::UnsupportedUnit { .. } => String::new(),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, ExtractionOutcome::Found(_))
    }
}
