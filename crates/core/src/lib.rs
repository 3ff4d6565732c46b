pub mod entity;
pub mod record;
pub mod units;
pub mod value;

pub use entity::{EntityError, EntityKind};
pub use record::{DatasetRow, RowRecord};
pub use units::{normalize_unit, CanonicalUnit, NormalizedUnit};
pub use value::{ExtractedValue, ExtractionOutcome};
