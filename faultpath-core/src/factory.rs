//! Factory: turns `FilterConfig` into runtime filters.
//!
//! `create_evaluator` builds one evaluator, `create_filter` a whole filter.
//! A filter with exactly one evaluator is built as a scalar filter so callers
//! can ask it for values as well as verdicts.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{EvaluatorConfig, FilterConfig, ProbCalcConfig};
use crate::error::{ConfigError, EvalError};
use crate::evaluator::{
    as_boolean, ClusterCoulombPathEvaluator, CumulativeProbPathEvaluator,
    NucleationClusterEvaluator, ScalarNucleationClusterEvaluator, SectCoulombPathEvaluator,
};
use crate::filter::{FilterId, PathPlausibilityFilter, ScalarPathPlausibilityFilter, SkipCache};
use crate::model::Rupture;
use crate::prob::{Bw16SsJumpProb, RuptureProbabilityCalc, Shaw07JumpDistProb};
use crate::result::PlausibilityResult;
use crate::sources::{DistanceSource, StressSource};

// ─── Sources ─────────────────────────────────────────────────────────

/// Named stress sources plus the distance source used by favorable-jump
/// evaluators.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    stress: HashMap<String, Arc<dyn StressSource>>,
    distance: Option<Arc<dyn DistanceSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stress(mut self, name: impl Into<String>, source: Arc<dyn StressSource>) -> Self {
        self.stress.insert(name.into(), source);
        self
    }

    pub fn with_distance(mut self, source: Arc<dyn DistanceSource>) -> Self {
        self.distance = Some(source);
        self
    }

    pub fn stress(&self, name: &str) -> Result<Arc<dyn StressSource>, ConfigError> {
        self.stress
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownStressSource(name.to_string()))
    }

    pub fn distance(&self) -> Option<Arc<dyn DistanceSource>> {
        self.distance.clone()
    }
}

// ─── Evaluator factory ───────────────────────────────────────────────

/// Create a rupture probability calculator from its config.
pub fn create_prob_calc(
    config: &ProbCalcConfig,
) -> Result<Arc<dyn RuptureProbabilityCalc>, ConfigError> {
    match *config {
        ProbCalcConfig::Shaw07 { a, r0 } => Ok(Arc::new(Shaw07JumpDistProb::new(a, r0)?)),
        ProbCalcConfig::Bw16Ss { min_jump_dist } => Ok(Arc::new(Bw16SsJumpProb::new(min_jump_dist)?)),
    }
}

/// Create a nucleation evaluator from its config.
pub fn create_evaluator(
    config: &EvaluatorConfig,
    sources: &SourceRegistry,
) -> Result<Arc<dyn ScalarNucleationClusterEvaluator>, ConfigError> {
    match config {
        EvaluatorConfig::ClusterCoulomb {
            source,
            range,
            failure_type,
        } => Ok(Arc::new(ClusterCoulombPathEvaluator::new(
            sources.stress(source)?,
            range.to_range(),
            *failure_type,
        )?)),
        EvaluatorConfig::SectCoulomb {
            source,
            range,
            failure_type,
            max_search_dist,
        } => {
            let stress = sources.stress(source)?;
            let eval = match max_search_dist {
                Some(dist) => SectCoulombPathEvaluator::most_favorable(
                    stress,
                    range.to_range(),
                    *failure_type,
                    *dist,
                    sources.distance(),
                )?,
                None => SectCoulombPathEvaluator::new(stress, range.to_range(), *failure_type)?,
            };
            Ok(Arc::new(eval))
        }
        EvaluatorConfig::CumulativeProb {
            min_probability,
            failure_type,
            calcs,
        } => {
            let calcs = calcs
                .iter()
                .map(create_prob_calc)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Arc::new(CumulativeProbPathEvaluator::new(
                *min_probability,
                *failure_type,
                calcs,
            )?))
        }
    }
}

// ─── Filter factory ──────────────────────────────────────────────────

/// A filter built from config.
#[derive(Debug)]
pub enum BuiltFilter {
    Boolean(PathPlausibilityFilter),
    Scalar(ScalarPathPlausibilityFilter),
}

impl BuiltFilter {
    /// The boolean filter, unwrapped from the scalar one when needed.
    pub fn filter(&self) -> &PathPlausibilityFilter {
        match self {
            BuiltFilter::Boolean(f) => f,
            BuiltFilter::Scalar(f) => f.filter(),
        }
    }

    pub fn as_scalar(&self) -> Option<&ScalarPathPlausibilityFilter> {
        match self {
            BuiltFilter::Scalar(f) => Some(f),
            BuiltFilter::Boolean(_) => None,
        }
    }

    pub fn id(&self) -> FilterId {
        self.filter().id()
    }

    pub fn name(&self) -> &str {
        self.filter().name()
    }

    pub fn short_name(&self) -> &str {
        self.filter().short_name()
    }

    pub fn apply(&self, rupture: &Rupture, verbose: bool) -> Result<PlausibilityResult, EvalError> {
        self.filter().apply(rupture, verbose)
    }

    pub fn apply_cached(
        &self,
        rupture: &Rupture,
        cache: &mut SkipCache,
        verbose: bool,
    ) -> Result<PlausibilityResult, EvalError> {
        self.filter().apply_cached(rupture, cache, verbose)
    }

    /// Scalar value for scalar filters; `None` otherwise.
    pub fn value(&self, rupture: &Rupture) -> Result<Option<f64>, EvalError> {
        match self {
            BuiltFilter::Scalar(f) => f.value(rupture),
            BuiltFilter::Boolean(_) => Ok(None),
        }
    }
}

/// Create a path plausibility filter from its config.
pub fn create_filter(
    config: &FilterConfig,
    sources: &SourceRegistry,
) -> Result<BuiltFilter, ConfigError> {
    let mut evaluators = config
        .evaluators
        .iter()
        .map(|e| create_evaluator(e, sources))
        .collect::<Result<Vec<_>, _>>()?;

    if evaluators.len() == 1 {
        if let Some(only) = evaluators.pop() {
            return Ok(BuiltFilter::Scalar(ScalarPathPlausibilityFilter::new(
                config.fract_pass_threshold,
                only,
            )?));
        }
    }
    let evaluators: Vec<Arc<dyn NucleationClusterEvaluator>> =
        evaluators.into_iter().map(as_boolean).collect();
    Ok(BuiltFilter::Boolean(PathPlausibilityFilter::new(
        config.fract_pass_threshold,
        config.logical_or,
        evaluators,
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RangeConfig;
    use crate::error::SourceError;
    use crate::model::Section;

    struct Zero;

    impl StressSource for Zero {
        fn name(&self) -> &str {
            "Zero"
        }

        fn calc(&self, _sources: &[Section], _receivers: &[Section]) -> Result<f64, SourceError> {
            Ok(0.0)
        }
    }

    fn registry() -> SourceRegistry {
        SourceRegistry::new().with_stress("zero", Arc::new(Zero))
    }

    fn cluster_coulomb(source: &str) -> EvaluatorConfig {
        EvaluatorConfig::ClusterCoulomb {
            source: source.to_string(),
            range: RangeConfig::AtLeast { value: 0.0 },
            failure_type: PlausibilityResult::FailHardStop,
        }
    }

    #[test]
    fn single_evaluator_builds_scalar_filter() {
        let config = FilterConfig {
            fract_pass_threshold: 0.5,
            logical_or: false,
            evaluators: vec![cluster_coulomb("zero")],
        };
        let built = create_filter(&config, &registry()).unwrap();
        assert!(built.as_scalar().is_some());
        assert_eq!(built.name(), "Half Paths Cluster [Zero] ≥0");
    }

    #[test]
    fn several_evaluators_build_boolean_filter() {
        let config = FilterConfig {
            fract_pass_threshold: 0.0,
            logical_or: true,
            evaluators: vec![
                cluster_coulomb("zero"),
                EvaluatorConfig::CumulativeProb {
                    min_probability: 0.1,
                    failure_type: PlausibilityResult::FailFuturePossible,
                    calcs: vec![ProbCalcConfig::Bw16Ss { min_jump_dist: 1.0 }],
                },
            ],
        };
        let built = create_filter(&config, &registry()).unwrap();
        assert!(built.as_scalar().is_none());
        assert!(built.filter().is_logical_or());
        assert_eq!(built.filter().failure_type(), PlausibilityResult::FailHardStop);
        assert_eq!(built.short_name(), "Path[2 criteria]");
    }

    #[test]
    fn unknown_source_is_rejected() {
        let err = create_evaluator(&cluster_coulomb("missing"), &registry()).err();
        assert_eq!(err, Some(ConfigError::UnknownStressSource("missing".to_string())));
    }

    #[test]
    fn favorable_without_distance_is_rejected() {
        let config = EvaluatorConfig::SectCoulomb {
            source: "zero".to_string(),
            range: RangeConfig::AtLeast { value: 0.0 },
            failure_type: PlausibilityResult::FailHardStop,
            max_search_dist: Some(5.0),
        };
        let err = create_evaluator(&config, &registry()).err();
        assert_eq!(err, Some(ConfigError::MissingDistanceSource));
    }
}
