//! Serializable filter configuration.
//!
//! Plain data that `factory::create_filter` turns into runtime filters.
//! Stress sources are referenced by name and resolved against a
//! `SourceRegistry` at construction time.

use serde::{Deserialize, Serialize};

use crate::range::AcceptableRange;
use crate::result::PlausibilityResult;

/// A path plausibility filter: threshold, combination rule and evaluators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterConfig {
    /// Fraction of nucleation clusters that must pass; 0 means any one.
    pub fract_pass_threshold: f32,

    /// Combine evaluator results with OR instead of AND.
    #[serde(default)]
    pub logical_or: bool,

    pub evaluators: Vec<EvaluatorConfig>,
}

/// Nucleation evaluator configuration (serializable enum).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluatorConfig {
    /// Stress onto each added cluster from everything reached so far.
    ClusterCoulomb {
        source: String,
        range: RangeConfig,
        #[serde(default = "hard_stop")]
        failure_type: PlausibilityResult,
    },

    /// Stress onto each added section; with `max_search_dist`, jumps go to
    /// the most favorable section within that many km.
    SectCoulomb {
        source: String,
        range: RangeConfig,
        #[serde(default = "hard_stop")]
        failure_type: PlausibilityResult,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_search_dist: Option<f64>,
    },

    /// Product of rupture probabilities with the rupture re-rooted at the
    /// nucleation cluster.
    CumulativeProb {
        min_probability: f64,
        #[serde(default = "hard_stop")]
        failure_type: PlausibilityResult,
        calcs: Vec<ProbCalcConfig>,
    },
}

/// Acceptable range for a scalar evaluator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RangeConfig {
    AtLeast { value: f64 },
    GreaterThan { value: f64 },
    AtMost { value: f64 },
    LessThan { value: f64 },
    Closed { min: f64, max: f64 },
    All,
}

impl RangeConfig {
    pub fn to_range(&self) -> AcceptableRange {
        match *self {
            RangeConfig::AtLeast { value } => AcceptableRange::at_least(value),
            RangeConfig::GreaterThan { value } => AcceptableRange::greater_than(value),
            RangeConfig::AtMost { value } => AcceptableRange::at_most(value),
            RangeConfig::LessThan { value } => AcceptableRange::less_than(value),
            RangeConfig::Closed { min, max } => AcceptableRange::closed(min, max),
            RangeConfig::All => AcceptableRange::all(),
        }
    }
}

/// Rupture probability calculator configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProbCalcConfig {
    /// `a * exp(-d / r0)` per jump.
    Shaw07 { a: f64, r0: f64 },

    /// Biasi & Wesnousky (2016) strike-slip jump passing ratio.
    Bw16Ss {
        #[serde(default = "default_min_jump_dist")]
        min_jump_dist: f64,
    },
}

fn hard_stop() -> PlausibilityResult {
    PlausibilityResult::FailHardStop
}

fn default_min_jump_dist() -> f64 {
    1.0
}
