//! Parallel batch evaluation of a rupture set.
//!
//! Ruptures linked by `parent` form a chain. Each rupture gets its own skip
//! cache, seeded from its parent's, so a chain is evaluated in order on one
//! worker. Independent chains run in parallel with rayon.

use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use faultpath_core::factory::BuiltFilter;
use faultpath_core::filter::SkipSession;
use faultpath_core::PlausibilityResult;

use crate::loader::RuptureSet;

/// Verdict for one rupture of a batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuptureVerdict {
    pub index: usize,
    pub result: PlausibilityResult,
    /// Scalar value, for scalar filters on ruptures with jumps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    pub sections: usize,
    pub clusters: usize,
}

/// Per-nucleation values of one rupture.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NucleationValues {
    pub index: usize,
    pub values: Vec<f64>,
}

/// Group rupture indices by the root of their parent chain. Each chain is
/// listed parent-first.
fn chains(set: &RuptureSet) -> Vec<Vec<usize>> {
    let mut by_root: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for index in 0..set.len() {
        by_root.entry(set.chain_root(index)).or_default().push(index);
    }
    by_root.into_values().collect()
}

fn evaluate_chain(
    filter: &BuiltFilter,
    set: &RuptureSet,
    chain: &[usize],
    verbose: bool,
) -> Result<Vec<RuptureVerdict>> {
    // children left to evaluate per rupture; a cache is dropped at zero
    let mut pending: HashMap<usize, usize> = HashMap::new();
    for &index in chain {
        if let Some(parent) = set.parents[index] {
            *pending.entry(parent).or_default() += 1;
        }
    }

    let mut session = SkipSession::new();
    let mut verdicts = Vec::with_capacity(chain.len());
    for &index in chain {
        let rupture = &set.ruptures[index];
        let parent = set.parents[index];
        if verbose {
            tracing::info!(index, rupture = %rupture, "evaluating");
        }
        let cache = session.cache_for(index, parent);
        let result = filter
            .apply_cached(rupture, cache, verbose)
            .with_context(|| format!("evaluating rupture {index}"))?;
        let value = filter
            .value(rupture)
            .with_context(|| format!("computing value of rupture {index}"))?;
        verdicts.push(RuptureVerdict {
            index,
            result,
            value,
            sections: rupture.total_sections(),
            clusters: rupture.total_clusters(),
        });

        if !pending.contains_key(&index) {
            session.release(index);
        }
        if let Some(parent) = parent {
            if let Some(left) = pending.get_mut(&parent) {
                *left -= 1;
                if *left == 0 {
                    pending.remove(&parent);
                    session.release(parent);
                }
            }
        }
    }
    Ok(verdicts)
}

/// Evaluate every rupture in the set. Verdicts come back in input order.
pub fn evaluate_batch(
    filter: &BuiltFilter,
    set: &RuptureSet,
    verbose: bool,
) -> Result<Vec<RuptureVerdict>> {
    let chains = chains(set);
    tracing::info!(
        ruptures = set.len(),
        chains = chains.len(),
        filter = filter.name(),
        "starting batch"
    );

    let per_chain: Vec<Vec<RuptureVerdict>> = chains
        .par_iter()
        .map(|chain| evaluate_chain(filter, set, chain, verbose))
        .collect::<Result<Vec<_>>>()?;

    let mut verdicts: Vec<RuptureVerdict> = per_chain.into_iter().flatten().collect();
    verdicts.sort_by_key(|v| v.index);
    Ok(verdicts)
}

/// Per-nucleation values for every rupture, for scalar filters.
pub fn nucleation_values(filter: &BuiltFilter, set: &RuptureSet) -> Result<Vec<NucleationValues>> {
    let scalar = filter
        .as_scalar()
        .with_context(|| format!("'{}' is not a scalar filter", filter.name()))?;
    set.ruptures
        .par_iter()
        .enumerate()
        .map(|(index, rupture)| -> Result<NucleationValues> {
            let values = scalar
                .nucleation_values(rupture)
                .with_context(|| format!("computing values of rupture {index}"))?;
            Ok(NucleationValues { index, values })
        })
        .collect()
}

// ─── Summary ────────────────────────────────────────────────────────

/// Counts per verdict kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BatchSummary {
    pub total: usize,
    pub passed: usize,
    pub failed_future_possible: usize,
    pub failed_hard_stop: usize,
}

impl BatchSummary {
    pub fn from_verdicts(verdicts: &[RuptureVerdict]) -> Self {
        let mut summary = Self {
            total: verdicts.len(),
            ..Self::default()
        };
        for v in verdicts {
            match v.result {
                PlausibilityResult::Pass => summary.passed += 1,
                PlausibilityResult::FailFuturePossible => summary.failed_future_possible += 1,
                PlausibilityResult::FailHardStop => summary.failed_hard_stop += 1,
            }
        }
        summary
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            100.0 * self.passed as f64 / self.total as f64
        }
    }

    /// Print a human-readable summary.
    pub fn display(&self, filter_name: &str) {
        println!("=== Path Plausibility Summary ===");
        println!("Filter: {filter_name}");
        println!("Ruptures: {}", self.total);
        println!();
        println!("  Passed:           {} ({:.1}%)", self.passed, self.pass_rate());
        println!("  Future possible:  {}", self.failed_future_possible);
        println!("  Hard stop:        {}", self.failed_hard_stop);
    }
}
