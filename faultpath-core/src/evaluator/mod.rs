//! Nucleation evaluators: test a rupture as if it nucleated on one cluster.
//!
//! Path-based evaluators grow the rupture outward with a `PathNavigator` and
//! judge every growth step. `test_nucleation_path` and
//! `worst_nucleation_value` implement that walk once for all of them.

mod coulomb;
mod cumulative;

use std::sync::Arc;

use crate::error::EvalError;
use crate::model::{Cluster, Rupture, Section};
use crate::path::{PathAddition, PathNavigator};
use crate::range::AcceptableRange;
use crate::result::PlausibilityResult;

pub use coulomb::{ClusterCoulombPathEvaluator, SectCoulombPathEvaluator};
pub use cumulative::{nucleation_rupture, CumulativeProbPathEvaluator};

/// Tests a rupture grown from a single nucleation cluster.
pub trait NucleationClusterEvaluator: Send + Sync {
    fn name(&self) -> &str;

    fn short_name(&self) -> &str;

    /// Result reported when the test fails. Never `Pass`.
    fn failure_type(&self) -> PlausibilityResult;

    /// True if the result can depend on how the rupture was assembled.
    fn is_directional(&self, _splayed: bool) -> bool {
        false
    }

    fn test_nucleation_cluster(
        &self,
        rupture: &Rupture,
        nucleation: &Cluster,
        verbose: bool,
    ) -> Result<PlausibilityResult, EvalError>;
}

/// Nucleation evaluator backed by a scalar judged against an acceptable range.
pub trait ScalarNucleationClusterEvaluator: NucleationClusterEvaluator {
    /// Worst value seen growing from `nucleation`; `None` if nothing was
    /// added (single-cluster ruptures).
    fn nucleation_cluster_value(
        &self,
        rupture: &Rupture,
        nucleation: &Cluster,
        verbose: bool,
    ) -> Result<Option<f64>, EvalError>;

    fn acceptable_range(&self) -> AcceptableRange;

    fn scalar_name(&self) -> &str;

    fn scalar_units(&self) -> Option<&str> {
        None
    }
}

/// Boolean view of a scalar evaluator, for filters that combine several.
pub fn as_boolean(
    evaluator: Arc<dyn ScalarNucleationClusterEvaluator>,
) -> Arc<dyn NucleationClusterEvaluator> {
    Arc::new(ScalarAsBoolean(evaluator))
}

struct ScalarAsBoolean(Arc<dyn ScalarNucleationClusterEvaluator>);

impl NucleationClusterEvaluator for ScalarAsBoolean {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn short_name(&self) -> &str {
        self.0.short_name()
    }

    fn failure_type(&self) -> PlausibilityResult {
        self.0.failure_type()
    }

    fn is_directional(&self, splayed: bool) -> bool {
        self.0.is_directional(splayed)
    }

    fn test_nucleation_cluster(
        &self,
        rupture: &Rupture,
        nucleation: &Cluster,
        verbose: bool,
    ) -> Result<PlausibilityResult, EvalError> {
        self.0.test_nucleation_cluster(rupture, nucleation, verbose)
    }
}

// ── Path walking ─────────────────────────────────────────────────────

/// Evaluator that judges each growth step of a path.
pub trait PathEvaluator: Send + Sync {
    fn name(&self) -> &str;

    fn failure_type(&self) -> PlausibilityResult;

    /// Navigator rooted at `nucleation`.
    fn navigator<'a>(
        &'a self,
        rupture: &'a Rupture,
        nucleation: &Cluster,
        verbose: bool,
    ) -> Result<Box<dyn PathNavigator + 'a>, EvalError>;

    /// Judges one growth step given the sections it grows from.
    fn test_addition(
        &self,
        current: &[Section],
        addition: &PathAddition,
        verbose: bool,
    ) -> Result<PlausibilityResult, EvalError>;
}

/// Path evaluator whose steps produce a scalar.
pub trait ScalarPathEvaluator: PathEvaluator {
    fn acceptable_range(&self) -> AcceptableRange;

    fn addition_value(
        &self,
        current: &[Section],
        addition: &PathAddition,
        verbose: bool,
    ) -> Result<f64, EvalError>;
}

/// Pass if `value` lies in `range`, else `failure`.
pub(crate) fn judge(
    range: &AcceptableRange,
    failure: PlausibilityResult,
    value: f64,
) -> PlausibilityResult {
    if range.contains(value) {
        PlausibilityResult::Pass
    } else {
        failure
    }
}

/// Grows the whole rupture from `nucleation`, AND-ing the result of every
/// step. Returns at the first failure unless `verbose`.
pub fn test_nucleation_path<E: PathEvaluator + ?Sized>(
    evaluator: &E,
    rupture: &Rupture,
    nucleation: &Cluster,
    verbose: bool,
) -> Result<PlausibilityResult, EvalError> {
    let mut nav = evaluator.navigator(rupture, nucleation, verbose)?;
    if verbose {
        tracing::info!("{}: testing path with start={}", evaluator.name(), nucleation);
    }
    let mut result = PlausibilityResult::Pass;
    loop {
        let before = nav.current_sections().len();
        let additions = nav.next_additions()?;
        if additions.is_empty() {
            break;
        }
        let current = &nav.current_sections()[..before];
        for addition in &additions {
            let step = evaluator.test_addition(current, addition, verbose)?;
            if verbose {
                tracing::info!(
                    "\t{} -> {} w/ {} sources: {}",
                    addition.from_section.id,
                    addition.to_cluster,
                    current.len(),
                    step
                );
            }
            result = result.and(step);
            if !verbose && !result.is_pass() {
                return Ok(result);
            }
        }
    }
    ensure_complete(&*nav, rupture)?;
    Ok(result)
}

/// Grows the whole rupture from `nucleation` and returns the worst step
/// value. The first of equally bad values is kept.
pub fn worst_nucleation_value<E: ScalarPathEvaluator + ?Sized>(
    evaluator: &E,
    rupture: &Rupture,
    nucleation: &Cluster,
    verbose: bool,
) -> Result<Option<f64>, EvalError> {
    let range = evaluator.acceptable_range();
    let mut nav = evaluator.navigator(rupture, nucleation, verbose)?;
    let mut worst: Option<f64> = None;
    loop {
        let before = nav.current_sections().len();
        let additions = nav.next_additions()?;
        if additions.is_empty() {
            break;
        }
        let current = &nav.current_sections()[..before];
        for addition in &additions {
            let value = evaluator.addition_value(current, addition, verbose)?;
            if verbose {
                tracing::info!(
                    "\t{} -> {}: {}",
                    addition.from_section.id,
                    addition.to_cluster,
                    value
                );
            }
            worst = Some(match worst {
                Some(w) => range.worse_of(w, value),
                None => value,
            });
        }
    }
    ensure_complete(&*nav, rupture)?;
    Ok(worst)
}

fn ensure_complete(nav: &dyn PathNavigator, rupture: &Rupture) -> Result<(), EvalError> {
    let visited = nav.current_sections().len();
    if visited != rupture.total_sections() {
        return Err(EvalError::IncompleteTraversal {
            visited,
            total: rupture.total_sections(),
            rupture: rupture.to_string(),
        });
    }
    Ok(())
}
