//! Coulomb stress path evaluators.
//!
//! Both evaluators score a growth step with an external stress source: the
//! sources are the sections reached so far, the receivers are the newly added
//! cluster (cluster granularity) or section (section granularity).

use std::sync::Arc;

use super::{
    judge, test_nucleation_path, worst_nucleation_value, NucleationClusterEvaluator,
    PathEvaluator, ScalarNucleationClusterEvaluator, ScalarPathEvaluator,
};
use crate::error::{ConfigError, EvalError};
use crate::model::{Cluster, Rupture, Section};
use crate::path::{
    ClusterPathNavigator, FavorableSectionPathNavigator, PathAddition, PathNavigator,
    SectionPathNavigator,
};
use crate::prob::optional_digit;
use crate::range::AcceptableRange;
use crate::result::PlausibilityResult;
use crate::sources::{DistanceSource, StressSource};

fn check_failure_type(failure_type: PlausibilityResult) -> Result<(), ConfigError> {
    if failure_type.is_pass() {
        return Err(ConfigError::PassFailureType);
    }
    Ok(())
}

fn stress_value(
    stress: &dyn StressSource,
    sources: &[Section],
    receivers: &[Section],
) -> Result<f64, EvalError> {
    stress
        .calc(sources, receivers)
        .map_err(|e| EvalError::from_source(stress.name(), e))
}

// ── Cluster granularity ──────────────────────────────────────────────

/// Stress change from everything reached so far onto each newly added cluster.
pub struct ClusterCoulombPathEvaluator {
    stress: Arc<dyn StressSource>,
    range: AcceptableRange,
    failure_type: PlausibilityResult,
    name: String,
    short_name: String,
}

impl ClusterCoulombPathEvaluator {
    pub fn new(
        stress: Arc<dyn StressSource>,
        range: AcceptableRange,
        failure_type: PlausibilityResult,
    ) -> Result<Self, ConfigError> {
        check_failure_type(failure_type)?;
        let name = format!("Cluster [{}] {}", stress.name(), range);
        let short_name = format!("Cl[{}]{}", stress.short_name(), range);
        Ok(Self {
            stress,
            range,
            failure_type,
            name,
            short_name,
        })
    }
}

impl PathEvaluator for ClusterCoulombPathEvaluator {
    fn name(&self) -> &str {
        &self.name
    }

    fn failure_type(&self) -> PlausibilityResult {
        self.failure_type
    }

    fn navigator<'a>(
        &'a self,
        rupture: &'a Rupture,
        nucleation: &Cluster,
        verbose: bool,
    ) -> Result<Box<dyn PathNavigator + 'a>, EvalError> {
        Ok(Box::new(
            ClusterPathNavigator::new(rupture, nucleation)?.verbose(verbose),
        ))
    }

    fn test_addition(
        &self,
        current: &[Section],
        addition: &PathAddition,
        verbose: bool,
    ) -> Result<PlausibilityResult, EvalError> {
        let value = self.addition_value(current, addition, verbose)?;
        Ok(judge(&self.range, self.failure_type, value))
    }
}

impl ScalarPathEvaluator for ClusterCoulombPathEvaluator {
    fn acceptable_range(&self) -> AcceptableRange {
        self.range
    }

    fn addition_value(
        &self,
        current: &[Section],
        addition: &PathAddition,
        _verbose: bool,
    ) -> Result<f64, EvalError> {
        stress_value(&*self.stress, current, addition.to_cluster.sections())
    }
}

impl NucleationClusterEvaluator for ClusterCoulombPathEvaluator {
    fn name(&self) -> &str {
        &self.name
    }

    fn short_name(&self) -> &str {
        &self.short_name
    }

    fn failure_type(&self) -> PlausibilityResult {
        self.failure_type
    }

    fn test_nucleation_cluster(
        &self,
        rupture: &Rupture,
        nucleation: &Cluster,
        verbose: bool,
    ) -> Result<PlausibilityResult, EvalError> {
        test_nucleation_path(self, rupture, nucleation, verbose)
    }
}

impl ScalarNucleationClusterEvaluator for ClusterCoulombPathEvaluator {
    fn nucleation_cluster_value(
        &self,
        rupture: &Rupture,
        nucleation: &Cluster,
        verbose: bool,
    ) -> Result<Option<f64>, EvalError> {
        worst_nucleation_value(self, rupture, nucleation, verbose)
    }

    fn acceptable_range(&self) -> AcceptableRange {
        self.range
    }

    fn scalar_name(&self) -> &str {
        self.stress.name()
    }

    fn scalar_units(&self) -> Option<&str> {
        self.stress.units()
    }
}

// ── Section granularity ──────────────────────────────────────────────

struct FavorableSearch {
    max_search_dist: f64,
    distances: Arc<dyn DistanceSource>,
}

/// Stress change from everything reached so far onto each newly added
/// section. Optionally replaces every jump with the most favorable one into
/// the same destination cluster.
pub struct SectCoulombPathEvaluator {
    stress: Arc<dyn StressSource>,
    range: AcceptableRange,
    failure_type: PlausibilityResult,
    favorable: Option<FavorableSearch>,
    name: String,
    short_name: String,
}

impl SectCoulombPathEvaluator {
    pub fn new(
        stress: Arc<dyn StressSource>,
        range: AcceptableRange,
        failure_type: PlausibilityResult,
    ) -> Result<Self, ConfigError> {
        check_failure_type(failure_type)?;
        let name = format!("Sect [{}] {}", stress.name(), range);
        let short_name = format!("Sect[{}]{}", stress.short_name(), range);
        Ok(Self {
            stress,
            range,
            failure_type,
            favorable: None,
            name,
            short_name,
        })
    }

    /// Variant that jumps to the most favorable section within
    /// `max_search_dist` km of the source cluster.
    pub fn most_favorable(
        stress: Arc<dyn StressSource>,
        range: AcceptableRange,
        failure_type: PlausibilityResult,
        max_search_dist: f64,
        distances: Option<Arc<dyn DistanceSource>>,
    ) -> Result<Self, ConfigError> {
        check_failure_type(failure_type)?;
        if !(max_search_dist > 0.0) {
            return Err(ConfigError::BadSearchDistance(max_search_dist));
        }
        let distances = distances.ok_or(ConfigError::MissingDistanceSource)?;
        let dist = optional_digit(max_search_dist);
        let name = format!("Sect Favorable ({}km) [{}] {}", dist, stress.name(), range);
        let short_name = format!("SectFav{}[{}]{}", dist, stress.short_name(), range);
        Ok(Self {
            stress,
            range,
            failure_type,
            favorable: Some(FavorableSearch {
                max_search_dist,
                distances,
            }),
            name,
            short_name,
        })
    }

    pub fn jump_to_most_favorable(&self) -> bool {
        self.favorable.is_some()
    }
}

impl PathEvaluator for SectCoulombPathEvaluator {
    fn name(&self) -> &str {
        &self.name
    }

    fn failure_type(&self) -> PlausibilityResult {
        self.failure_type
    }

    fn navigator<'a>(
        &'a self,
        rupture: &'a Rupture,
        nucleation: &Cluster,
        verbose: bool,
    ) -> Result<Box<dyn PathNavigator + 'a>, EvalError> {
        match &self.favorable {
            Some(search) => Ok(Box::new(
                FavorableSectionPathNavigator::new(
                    rupture,
                    nucleation,
                    &self.stress,
                    &search.distances,
                    self.range,
                    search.max_search_dist,
                )?
                .verbose(verbose),
            )),
            None => Ok(Box::new(
                SectionPathNavigator::new(rupture, nucleation)?.verbose(verbose),
            )),
        }
    }

    fn test_addition(
        &self,
        current: &[Section],
        addition: &PathAddition,
        verbose: bool,
    ) -> Result<PlausibilityResult, EvalError> {
        let value = self.addition_value(current, addition, verbose)?;
        Ok(judge(&self.range, self.failure_type, value))
    }
}

impl ScalarPathEvaluator for SectCoulombPathEvaluator {
    fn acceptable_range(&self) -> AcceptableRange {
        self.range
    }

    fn addition_value(
        &self,
        current: &[Section],
        addition: &PathAddition,
        _verbose: bool,
    ) -> Result<f64, EvalError> {
        stress_value(&*self.stress, current, &addition.to_sections)
    }
}

impl NucleationClusterEvaluator for SectCoulombPathEvaluator {
    fn name(&self) -> &str {
        &self.name
    }

    fn short_name(&self) -> &str {
        &self.short_name
    }

    fn failure_type(&self) -> PlausibilityResult {
        self.failure_type
    }

    fn is_directional(&self, splayed: bool) -> bool {
        splayed && self.favorable.is_some()
    }

    fn test_nucleation_cluster(
        &self,
        rupture: &Rupture,
        nucleation: &Cluster,
        verbose: bool,
    ) -> Result<PlausibilityResult, EvalError> {
        test_nucleation_path(self, rupture, nucleation, verbose)
    }
}

impl ScalarNucleationClusterEvaluator for SectCoulombPathEvaluator {
    fn nucleation_cluster_value(
        &self,
        rupture: &Rupture,
        nucleation: &Cluster,
        verbose: bool,
    ) -> Result<Option<f64>, EvalError> {
        worst_nucleation_value(self, rupture, nucleation, verbose)
    }

    fn acceptable_range(&self) -> AcceptableRange {
        self.range
    }

    fn scalar_name(&self) -> &str {
        self.stress.name()
    }

    fn scalar_units(&self) -> Option<&str> {
        self.stress.units()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::model::Jump;

    /// Sum of receiver ids minus the number of sources.
    struct Toy;

    impl StressSource for Toy {
        fn name(&self) -> &str {
            "Toy CFF"
        }

        fn short_name(&self) -> &str {
            "Toy"
        }

        fn units(&self) -> Option<&str> {
            Some("MPa")
        }

        fn calc(&self, sources: &[Section], receivers: &[Section]) -> Result<f64, SourceError> {
            Ok(receivers.iter().map(|s| s.id.0 as f64).sum::<f64>() - sources.len() as f64)
        }
    }

    fn strand() -> (Rupture, Cluster, Cluster) {
        let a = Cluster::new(vec![Section::new(0, 0), Section::new(1, 0)]).unwrap();
        let b = Cluster::new(vec![Section::new(2, 1), Section::new(3, 1)]).unwrap();
        let rup = Rupture::new(a.clone())
            .take(&Jump::new(a.end_section(), a.clone(), b.start_section(), b.clone(), 1.0))
            .unwrap();
        (rup, a, b)
    }

    #[test]
    fn cluster_value_uses_whole_destination() {
        let (rup, a, b) = strand();
        let eval = ClusterCoulombPathEvaluator::new(
            Arc::new(Toy),
            AcceptableRange::at_least(0.0),
            PlausibilityResult::FailHardStop,
        )
        .unwrap();
        // from a: receivers 2+3, 2 sources
        assert_eq!(eval.nucleation_cluster_value(&rup, &a, false).unwrap(), Some(3.0));
        // from b: receivers 0+1, 2 sources
        assert_eq!(eval.nucleation_cluster_value(&rup, &b, false).unwrap(), Some(-1.0));
        assert_eq!(
            eval.test_nucleation_cluster(&rup, &b, false).unwrap(),
            PlausibilityResult::FailHardStop
        );
        assert_eq!(eval.test_nucleation_cluster(&rup, &a, true).unwrap(), PlausibilityResult::Pass);
        assert_eq!(NucleationClusterEvaluator::name(&eval), "Cluster [Toy CFF] ≥0");
        assert_eq!(eval.short_name(), "Cl[Toy]≥0");
        assert_eq!(eval.scalar_units(), Some("MPa"));
    }

    #[test]
    fn sect_value_tracks_worst_step() {
        let (rup, a, _) = strand();
        let eval = SectCoulombPathEvaluator::new(
            Arc::new(Toy),
            AcceptableRange::at_least(0.0),
            PlausibilityResult::FailFuturePossible,
        )
        .unwrap();
        // steps from a: 2 with 2 sources (0), then 3 with 3 sources (0)
        assert_eq!(eval.nucleation_cluster_value(&rup, &a, false).unwrap(), Some(0.0));
        assert!(!eval.jump_to_most_favorable());
    }

    struct Flat;

    impl DistanceSource for Flat {
        fn distance(&self, _a: &Section, _b: &Section) -> Result<f64, SourceError> {
            Ok(1.0)
        }
    }

    #[test]
    fn favorable_is_directional_only_when_splayed() {
        let eval = SectCoulombPathEvaluator::most_favorable(
            Arc::new(Toy),
            AcceptableRange::at_least(0.0),
            PlausibilityResult::FailHardStop,
            2.5,
            Some(Arc::new(Flat)),
        )
        .unwrap();
        assert!(eval.jump_to_most_favorable());
        assert!(NucleationClusterEvaluator::is_directional(&eval, true));
        assert!(!NucleationClusterEvaluator::is_directional(&eval, false));
        assert_eq!(NucleationClusterEvaluator::name(&eval), "Sect Favorable (2.5km) [Toy CFF] ≥0");
    }

    #[test]
    fn favorable_requires_search_settings() {
        let err = SectCoulombPathEvaluator::most_favorable(
            Arc::new(Toy),
            AcceptableRange::at_least(0.0),
            PlausibilityResult::FailHardStop,
            0.0,
            None,
        );
        assert!(matches!(err, Err(ConfigError::BadSearchDistance(_))));
        let err = SectCoulombPathEvaluator::most_favorable(
            Arc::new(Toy),
            AcceptableRange::at_least(0.0),
            PlausibilityResult::FailHardStop,
            5.0,
            None,
        );
        assert!(matches!(err, Err(ConfigError::MissingDistanceSource)));
    }

    #[test]
    fn pass_failure_type_rejected() {
        let err = ClusterCoulombPathEvaluator::new(
            Arc::new(Toy),
            AcceptableRange::at_least(0.0),
            PlausibilityResult::Pass,
        );
        assert!(matches!(err, Err(ConfigError::PassFailureType)));
    }
}
