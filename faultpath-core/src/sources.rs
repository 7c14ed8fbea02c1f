//! External scalar sources consumed by the evaluators.
//!
//! Stress and distance values come from subsystems outside this crate. The
//! engine treats them as deterministic, side-effect-free callbacks and never
//! retries a failed call.

use crate::error::SourceError;
use crate::model::Section;

/// Aggregated stress change imposed by a set of source sections on a set of
/// receiver sections.
pub trait StressSource: Send + Sync {
    /// Human-readable name (e.g., "Net CFF Sum").
    fn name(&self) -> &str;

    /// Compact name used in filter short names.
    fn short_name(&self) -> &str {
        self.name()
    }

    /// Units of the returned value, if any.
    fn units(&self) -> Option<&str> {
        None
    }

    fn calc(&self, sources: &[Section], receivers: &[Section]) -> Result<f64, SourceError>;
}

/// Distance between two sections, in km.
pub trait DistanceSource: Send + Sync {
    fn name(&self) -> &str {
        "distance"
    }

    fn distance(&self, a: &Section, b: &Section) -> Result<f64, SourceError>;
}
