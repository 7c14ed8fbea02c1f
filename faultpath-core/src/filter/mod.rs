//! Path plausibility filters.
//!
//! A filter tries every cluster of a rupture as the nucleation point and
//! passes the rupture when at least `fract_pass_threshold` of them (at least
//! one) pass all of its evaluators (or any of them, with `logical_or`).

mod skip_cache;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, EvalError};
use crate::evaluator::{as_boolean, NucleationClusterEvaluator, ScalarNucleationClusterEvaluator};
use crate::model::Rupture;
use crate::range::AcceptableRange;
use crate::result::PlausibilityResult;

pub use skip_cache::{SkipCache, SkipSession};

/// Process-unique filter identity, used to key skip-cache entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterId(pub u64);

impl FilterId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        FilterId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "filter#{}", self.0)
    }
}

// ── Boolean filter ───────────────────────────────────────────────────

pub struct PathPlausibilityFilter {
    fract_pass_threshold: f32,
    logical_or: bool,
    evaluators: Vec<Arc<dyn NucleationClusterEvaluator>>,
    failure_type: PlausibilityResult,
    id: FilterId,
    name: String,
    short_name: String,
}

impl PathPlausibilityFilter {
    pub fn new(
        fract_pass_threshold: f32,
        logical_or: bool,
        evaluators: Vec<Arc<dyn NucleationClusterEvaluator>>,
    ) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&fract_pass_threshold) {
            return Err(ConfigError::BadThreshold(fract_pass_threshold));
        }
        let failure_type = evaluators
            .iter()
            .map(|e| e.failure_type())
            .reduce(PlausibilityResult::and)
            .ok_or(ConfigError::EmptyEvaluators)?;
        if failure_type.is_pass() {
            return Err(ConfigError::PassFailureType);
        }

        let paths = path_string(fract_pass_threshold);
        let (name, short_name) = match evaluators.as_slice() {
            [only] => (
                format!("{paths} {}", only.name()),
                format!("{}{}", paths.replace(' ', ""), only.short_name()),
            ),
            many => {
                let names: Vec<&str> = many.iter().map(|e| e.name()).collect();
                (
                    format!("{paths} [{}]", names.join(", ")),
                    format!("{}[{} criteria]", paths.replace(' ', ""), many.len()),
                )
            }
        };

        Ok(Self {
            fract_pass_threshold,
            logical_or,
            evaluators,
            failure_type,
            id: FilterId::next(),
            name,
            short_name,
        })
    }

    pub fn id(&self) -> FilterId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn fract_pass_threshold(&self) -> f32 {
        self.fract_pass_threshold
    }

    pub fn is_logical_or(&self) -> bool {
        self.logical_or
    }

    pub fn evaluators(&self) -> &[Arc<dyn NucleationClusterEvaluator>] {
        &self.evaluators
    }

    /// AND of the evaluators' failure types.
    pub fn failure_type(&self) -> PlausibilityResult {
        self.failure_type
    }

    pub fn is_directional(&self, splayed: bool) -> bool {
        splayed || self.evaluators.iter().any(|e| e.is_directional(splayed))
    }

    /// Nucleation clusters that must pass out of `num_paths`.
    pub fn num_needed(&self, num_paths: usize) -> usize {
        if self.fract_pass_threshold > 0.0 {
            let needed = (self.fract_pass_threshold * num_paths as f32).ceil() as usize;
            needed.max(1)
        } else {
            1
        }
    }

    pub fn apply(&self, rupture: &Rupture, verbose: bool) -> Result<PlausibilityResult, EvalError> {
        self.run(rupture, None, verbose)
    }

    /// Like `apply`, skipping clusters `cache` marks as failed for this
    /// filter and recording new hard failures.
    pub fn apply_cached(
        &self,
        rupture: &Rupture,
        cache: &mut SkipCache,
        verbose: bool,
    ) -> Result<PlausibilityResult, EvalError> {
        self.run(rupture, Some(cache), verbose)
    }

    fn run(
        &self,
        rupture: &Rupture,
        mut cache: Option<&mut SkipCache>,
        verbose: bool,
    ) -> Result<PlausibilityResult, EvalError> {
        if rupture.total_jumps() == 0 {
            return Ok(PlausibilityResult::Pass);
        }
        let clusters = rupture.all_clusters();
        let num_paths = clusters.len();
        let num_needed = self.num_needed(num_paths);
        let mut num_passes = 0;

        for nucleation in clusters {
            if cache
                .as_deref()
                .is_some_and(|c| c.contains(self.id, nucleation))
            {
                if verbose {
                    tracing::info!("{}: skipping nucleation point {}", self.short_name, nucleation);
                }
                continue;
            }
            if verbose {
                tracing::info!("{}: nucleation point {}", self.short_name, nucleation);
            }

            let mut result: Option<PlausibilityResult> = None;
            for eval in &self.evaluators {
                if verbose {
                    tracing::info!("Testing {}...", eval.name());
                }
                let sub = eval.test_nucleation_cluster(rupture, nucleation, verbose)?;
                if verbose {
                    tracing::info!("\t{}: {}", eval.name(), sub);
                }
                result = Some(match result {
                    None => sub,
                    Some(prev) if self.logical_or => prev.or(sub),
                    Some(prev) => prev.and(sub),
                });
            }

            match result {
                Some(PlausibilityResult::Pass) => {
                    num_passes += 1;
                    if !verbose && num_passes >= num_needed {
                        return Ok(PlausibilityResult::Pass);
                    }
                }
                Some(PlausibilityResult::FailHardStop) => {
                    if let Some(c) = cache.as_deref_mut() {
                        c.insert(self.id, nucleation.clone());
                    }
                }
                _ => {}
            }
        }

        if verbose {
            tracing::info!(
                "{}: {}/{} pass, {} needed",
                self.short_name,
                num_passes,
                num_paths,
                num_needed
            );
        }
        if num_passes >= num_needed {
            Ok(PlausibilityResult::Pass)
        } else {
            Ok(self.failure_type)
        }
    }
}

impl fmt::Debug for PathPlausibilityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathPlausibilityFilter")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("fract_pass_threshold", &self.fract_pass_threshold)
            .field("logical_or", &self.logical_or)
            .finish()
    }
}

fn path_string(fract: f32) -> String {
    if fract <= 0.0 {
        return "Path".to_string();
    }
    let named = [
        (0.5, "Half Paths"),
        (1.0 / 3.0, "1/3 Paths"),
        (2.0 / 3.0, "2/3 Paths"),
        (0.25, "1/4 Paths"),
        (0.75, "3/4 Paths"),
    ];
    named
        .iter()
        .find(|(f, _)| *f == fract)
        .map_or_else(|| format!("{fract}x Paths"), |(_, name)| name.to_string())
}

// ── Scalar filter ────────────────────────────────────────────────────

/// Single-evaluator filter that also reports a scalar: the value the
/// `num_needed`-th best nucleation cluster reached.
pub struct ScalarPathPlausibilityFilter {
    inner: PathPlausibilityFilter,
    evaluator: Arc<dyn ScalarNucleationClusterEvaluator>,
}

impl ScalarPathPlausibilityFilter {
    pub fn new(
        fract_pass_threshold: f32,
        evaluator: Arc<dyn ScalarNucleationClusterEvaluator>,
    ) -> Result<Self, ConfigError> {
        let inner = PathPlausibilityFilter::new(
            fract_pass_threshold,
            false,
            vec![as_boolean(Arc::clone(&evaluator))],
        )?;
        Ok(Self { inner, evaluator })
    }

    /// The boolean filter this wraps.
    pub fn filter(&self) -> &PathPlausibilityFilter {
        &self.inner
    }

    pub fn apply(&self, rupture: &Rupture, verbose: bool) -> Result<PlausibilityResult, EvalError> {
        self.inner.apply(rupture, verbose)
    }

    pub fn apply_cached(
        &self,
        rupture: &Rupture,
        cache: &mut SkipCache,
        verbose: bool,
    ) -> Result<PlausibilityResult, EvalError> {
        self.inner.apply_cached(rupture, cache, verbose)
    }

    /// Every nucleation cluster's value, in cluster order. Clusters that add
    /// nothing are omitted.
    pub fn nucleation_values(&self, rupture: &Rupture) -> Result<Vec<f64>, EvalError> {
        let mut values = Vec::new();
        for nucleation in rupture.all_clusters() {
            if let Some(v) = self.evaluator.nucleation_cluster_value(rupture, nucleation, false)? {
                values.push(v);
            }
        }
        Ok(values)
    }

    /// Value that lies in the acceptable range exactly when the rupture
    /// passes. `None` for ruptures without jumps.
    pub fn value(&self, rupture: &Rupture) -> Result<Option<f64>, EvalError> {
        if rupture.total_jumps() == 0 {
            return Ok(None);
        }
        let mut values = self.nucleation_values(rupture)?;
        if values.is_empty() {
            return Ok(None);
        }
        let range = self.evaluator.acceptable_range();
        if self.inner.fract_pass_threshold > 0.0 {
            let num_needed = self.inner.num_needed(values.len());
            values.sort_by(|a, b| range.worst_to_best(a, b));
            Ok(Some(values[values.len() - num_needed]))
        } else {
            Ok(values.into_iter().reduce(|best, v| range.better_of(best, v)))
        }
    }

    pub fn acceptable_range(&self) -> AcceptableRange {
        self.evaluator.acceptable_range()
    }

    pub fn scalar_name(&self) -> &str {
        self.evaluator.scalar_name()
    }

    pub fn scalar_units(&self) -> Option<&str> {
        self.evaluator.scalar_units()
    }

    pub fn id(&self) -> FilterId {
        self.inner.id()
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn short_name(&self) -> &str {
        self.inner.short_name()
    }

    pub fn is_directional(&self, splayed: bool) -> bool {
        self.inner.is_directional(splayed)
    }
}

impl fmt::Debug for ScalarPathPlausibilityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarPathPlausibilityFilter")
            .field("inner", &self.inner)
            .field("scalar_name", &self.evaluator.scalar_name())
            .finish()
    }
}
