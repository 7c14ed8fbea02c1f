//! Rupture probability calculators.
//!
//! A `RuptureProbabilityCalc` maps a whole rupture to a probability in [0, 1].
//! The jump-distance models here score each jump independently and multiply
//! the results, stopping early once the product reaches zero.

use crate::error::{ConfigError, SourceError};
use crate::model::{Jump, Rupture};

/// Probability of a rupture occurring, conditioned on its nucleation at the
/// root cluster.
pub trait RuptureProbabilityCalc: Send + Sync {
    fn name(&self) -> &str;

    fn calc_rupture_prob(&self, rupture: &Rupture, verbose: bool) -> Result<f64, SourceError>;

    /// True if the result depends on which cluster is the root.
    fn is_directional(&self, splayed: bool) -> bool;
}

/// Product of `prob(jump)` over every jump of the rupture.
fn jump_product(
    name: &str,
    rupture: &Rupture,
    verbose: bool,
    prob: impl Fn(&Jump) -> f64,
) -> f64 {
    let mut total = 1.0;
    for jump in rupture.all_jumps() {
        let p = prob(jump);
        if verbose {
            tracing::info!("{name}: {jump}, P={p}");
        }
        total *= p;
        if total == 0.0 {
            break;
        }
    }
    total
}

/// Formats with at most one decimal digit ("3", "2.5").
pub(crate) fn optional_digit(value: f64) -> String {
    let s = format!("{value:.1}");
    match s.strip_suffix(".0") {
        Some(trimmed) => trimmed.to_string(),
        None => s,
    }
}

// ── Shaw (2007) ──────────────────────────────────────────────────────

/// Exponential decay with jump distance: `a * exp(-d / r0)`.
#[derive(Debug, Clone)]
pub struct Shaw07JumpDistProb {
    a: f64,
    r0: f64,
    name: String,
}

impl Shaw07JumpDistProb {
    pub fn new(a: f64, r0: f64) -> Result<Self, ConfigError> {
        if !(a > 0.0 && a <= 1.0) {
            return Err(ConfigError::BadParameter { name: "a", value: a });
        }
        if !(r0 > 0.0) {
            return Err(ConfigError::BadParameter { name: "r0", value: r0 });
        }
        let name = format!("Shaw07 [A={}, R0={}]", optional_digit(a), optional_digit(r0));
        Ok(Self { a, r0, name })
    }

    pub fn jump_probability(&self, distance: f64) -> f64 {
        self.a * (-distance / self.r0).exp()
    }
}

impl RuptureProbabilityCalc for Shaw07JumpDistProb {
    fn name(&self) -> &str {
        &self.name
    }

    fn calc_rupture_prob(&self, rupture: &Rupture, verbose: bool) -> Result<f64, SourceError> {
        Ok(jump_product(&self.name, rupture, verbose, |jump| {
            self.jump_probability(jump.distance)
        }))
    }

    fn is_directional(&self, _splayed: bool) -> bool {
        false
    }
}

// ── Biasi & Wesnousky (2016), strike-slip ────────────────────────────

/// Strike-slip passing ratio `max(0, 1.89 - 0.31 d)` converted to a
/// probability. Jumps shorter than `min_jump_dist` always pass.
#[derive(Debug, Clone)]
pub struct Bw16SsJumpProb {
    min_jump_dist: f64,
}

impl Default for Bw16SsJumpProb {
    fn default() -> Self {
        Self { min_jump_dist: 1.0 }
    }
}

impl Bw16SsJumpProb {
    pub fn new(min_jump_dist: f64) -> Result<Self, ConfigError> {
        if !(min_jump_dist >= 0.0) {
            return Err(ConfigError::BadParameter {
                name: "min_jump_dist",
                value: min_jump_dist,
            });
        }
        Ok(Self { min_jump_dist })
    }

    pub fn passing_ratio(distance: f64) -> f64 {
        (1.89 - 0.31 * distance).max(0.0)
    }

    pub fn jump_probability(&self, distance: f64) -> f64 {
        if distance < self.min_jump_dist {
            return 1.0;
        }
        let ratio = Self::passing_ratio(distance);
        ratio / (ratio + 1.0)
    }
}

impl RuptureProbabilityCalc for Bw16SsJumpProb {
    fn name(&self) -> &str {
        "BW16 SS JumpDist"
    }

    fn calc_rupture_prob(&self, rupture: &Rupture, verbose: bool) -> Result<f64, SourceError> {
        Ok(jump_product(self.name(), rupture, verbose, |jump| {
            self.jump_probability(jump.distance)
        }))
    }

    fn is_directional(&self, _splayed: bool) -> bool {
        false
    }
}
