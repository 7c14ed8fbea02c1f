//! Cumulative probability evaluator and nucleation re-rooting.

use std::borrow::Cow;
use std::sync::Arc;

use super::{NucleationClusterEvaluator, ScalarNucleationClusterEvaluator};
use crate::error::{ConfigError, EvalError};
use crate::model::{Cluster, Jump, Rupture, TreeNavigator};
use crate::prob::RuptureProbabilityCalc;
use crate::range::AcceptableRange;
use crate::result::PlausibilityResult;

/// Product of rupture probabilities computed as if the rupture nucleated on
/// the tested cluster. Passes when the product is at least `min_probability`.
pub struct CumulativeProbPathEvaluator {
    calcs: Vec<Arc<dyn RuptureProbabilityCalc>>,
    min_probability: f64,
    failure_type: PlausibilityResult,
    name: String,
    short_name: String,
}

impl CumulativeProbPathEvaluator {
    pub fn new(
        min_probability: f64,
        failure_type: PlausibilityResult,
        calcs: Vec<Arc<dyn RuptureProbabilityCalc>>,
    ) -> Result<Self, ConfigError> {
        if calcs.is_empty() {
            return Err(ConfigError::NoProbabilityCalcs);
        }
        if !(0.0..=1.0).contains(&min_probability) {
            return Err(ConfigError::BadProbability(min_probability));
        }
        if failure_type.is_pass() {
            return Err(ConfigError::PassFailureType);
        }
        let names: Vec<&str> = calcs.iter().map(|c| c.name()).collect();
        let name = format!("P({}) ≥{}", names.join(", "), min_probability);
        let compact: Vec<String> = names.iter().map(|n| n.replace(' ', "")).collect();
        let short_name = format!("P({})≥{}", compact.join(","), min_probability);
        Ok(Self {
            calcs,
            min_probability,
            failure_type,
            name,
            short_name,
        })
    }

    pub fn min_probability(&self) -> f64 {
        self.min_probability
    }

    /// Product over all calculators. With `stop_below_min`, returns as soon as
    /// the product drops below the minimum.
    fn probability(
        &self,
        rupture: &Rupture,
        verbose: bool,
        stop_below_min: bool,
    ) -> Result<f64, EvalError> {
        let mut prob = 1.0;
        for calc in &self.calcs {
            let p = calc
                .calc_rupture_prob(rupture, verbose)
                .map_err(|e| EvalError::from_source(calc.name(), e))?;
            if !(0.0..=1.0).contains(&p) {
                return Err(EvalError::BadProbability {
                    name: calc.name().to_string(),
                    value: p,
                });
            }
            prob *= p;
            if verbose {
                tracing::info!("\t{}: P={}", calc.name(), p);
            } else if stop_below_min && prob < self.min_probability {
                break;
            }
        }
        Ok(prob)
    }
}

impl NucleationClusterEvaluator for CumulativeProbPathEvaluator {
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
        self.calcs.iter().any(|c| c.is_directional(splayed))
    }

    fn test_nucleation_cluster(
        &self,
        rupture: &Rupture,
        nucleation: &Cluster,
        verbose: bool,
    ) -> Result<PlausibilityResult, EvalError> {
        let rerooted = nucleation_rupture(rupture, nucleation)?;
        if verbose {
            tracing::info!("{}: nucleation rupture {}", self.name, rerooted);
        }
        let prob = self.probability(&rerooted, verbose, true)?;
        if prob >= self.min_probability {
            Ok(PlausibilityResult::Pass)
        } else {
            Ok(self.failure_type)
        }
    }
}

impl ScalarNucleationClusterEvaluator for CumulativeProbPathEvaluator {
    fn nucleation_cluster_value(
        &self,
        rupture: &Rupture,
        nucleation: &Cluster,
        verbose: bool,
    ) -> Result<Option<f64>, EvalError> {
        let rerooted = nucleation_rupture(rupture, nucleation)?;
        self.probability(&rerooted, verbose, false).map(Some)
    }

    fn acceptable_range(&self) -> AcceptableRange {
        AcceptableRange::at_least(self.min_probability)
    }

    fn scalar_name(&self) -> &str {
        "Conditional Probability"
    }
}

// ── Re-rooting ───────────────────────────────────────────────────────

/// The same rupture with its root at `nucleation`.
///
/// Returns the rupture itself when `nucleation` is already the root, and the
/// whole-rupture reversal when a single strand is re-rooted at its last
/// cluster. Otherwise the rupture is rebuilt: first forward from
/// `nucleation` through all of its descendants, then backward along the
/// predecessor chain, reversing each predecessor cluster and jump and
/// re-attaching the other branches that hang off it in their original
/// orientation. Clusters that are not reversed are shared with the original.
pub fn nucleation_rupture<'a>(
    rupture: &'a Rupture,
    nucleation: &Cluster,
) -> Result<Cow<'a, Rupture>, EvalError> {
    if rupture.root() == nucleation {
        return Ok(Cow::Borrowed(rupture));
    }
    let nav = rupture.navigator();
    if nav.cluster_for(nucleation.start_section().id) != Some(nucleation) {
        return Err(EvalError::UnknownCluster(nucleation.to_string()));
    }
    if rupture.is_single_strand() && rupture.clusters().last() == Some(nucleation) {
        return Ok(Cow::Owned(rupture.reversed()?));
    }

    let mut rerooted = build_forward(nav, Rupture::new(nucleation.clone()), nucleation)?;
    let mut prev_reversed = nucleation.clone();
    if rerooted.total_clusters() == 1 {
        // nothing downstream: flip the nucleation cluster so growth back
        // toward the root continues the primary strand
        prev_reversed = nucleation.reversed();
        rerooted = Rupture::new(prev_reversed.clone());
    }

    let mut prev_orig = nucleation.clone();
    let mut pred = nav.predecessor(nucleation).cloned();
    while let Some(orig) = pred {
        let orig_jump = adjacent_jump(nav, &orig, &prev_orig)?;
        let reversed = orig.reversed_from(orig_jump.from_section.id)?;
        let reverse_jump = Jump::new(
            orig_jump.to_section,
            prev_reversed.clone(),
            orig_jump.from_section,
            reversed.clone(),
            orig_jump.distance,
        );
        rerooted = rerooted.take(&reverse_jump)?;

        for desc in nav.descendants(&orig) {
            if rerooted.contains(desc.start_section().id) {
                continue;
            }
            let jump = adjacent_jump(nav, &orig, desc)?;
            let splay_jump = Jump::new(
                jump.from_section,
                reversed.clone(),
                jump.to_section,
                jump.to_cluster,
                jump.distance,
            );
            rerooted = rerooted.take(&splay_jump)?;
            rerooted = build_forward(nav, rerooted, desc)?;
        }

        pred = nav.predecessor(&orig).cloned();
        prev_orig = orig;
        prev_reversed = reversed;
    }

    if rerooted.total_sections() != rupture.total_sections() {
        return Err(EvalError::IncompleteReroot {
            nucleation: nucleation.to_string(),
            expected: rupture.total_sections(),
            actual: rerooted.total_sections(),
        });
    }
    Ok(Cow::Owned(rerooted))
}

fn adjacent_jump(nav: &TreeNavigator, from: &Cluster, to: &Cluster) -> Result<Jump, EvalError> {
    nav.jump(from, to)
        .ok_or_else(|| EvalError::UnknownCluster(to.to_string()))
}

/// Attaches every descendant of `from` (recursively) in its original
/// orientation.
fn build_forward(
    nav: &TreeNavigator,
    mut rupture: Rupture,
    from: &Cluster,
) -> Result<Rupture, EvalError> {
    for desc in nav.descendants(from) {
        let jump = adjacent_jump(nav, from, desc)?;
        rupture = rupture.take(&jump)?;
        rupture = build_forward(nav, rupture, desc)?;
    }
    Ok(rupture)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::model::{Section, SectionId};

    fn cluster(parent: u32, ids: &[u32]) -> Cluster {
        Cluster::new(ids.iter().map(|&id| Section::new(id, parent)).collect()).unwrap()
    }

    fn link(from: &Cluster, from_id: u32, to: &Cluster, distance: f64) -> Jump {
        let from_section = from
            .sections()
            .iter()
            .copied()
            .find(|s| s.id == SectionId(from_id))
            .unwrap();
        Jump::new(from_section, from.clone(), to.start_section(), to.clone(), distance)
    }

    /// Probability = product over jumps of 1 / (1 + distance), but only
    /// counting jumps that leave the root cluster.
    struct RootJumps;

    impl RuptureProbabilityCalc for RootJumps {
        fn name(&self) -> &str {
            "Root Jumps"
        }

        fn calc_rupture_prob(&self, rupture: &Rupture, _verbose: bool) -> Result<f64, SourceError> {
            let root = rupture.root();
            Ok(rupture
                .all_jumps()
                .into_iter()
                .filter(|j| j.from_cluster == *root)
                .map(|j| 1.0 / (1.0 + j.distance))
                .product())
        }

        fn is_directional(&self, _splayed: bool) -> bool {
            true
        }
    }

    #[test]
    fn middle_of_strand_becomes_root() {
        let a = cluster(0, &[0, 1]);
        let b = cluster(1, &[2, 3]);
        let c = cluster(2, &[4, 5]);
        let rup = Rupture::new(a.clone())
            .take(&link(&a, 1, &b, 1.0))
            .unwrap()
            .take(&link(&b, 3, &c, 2.0))
            .unwrap();

        let rerooted = nucleation_rupture(&rup, &b).unwrap();
        assert_eq!(rerooted.root(), &b);
        assert_eq!(rerooted.total_sections(), 6);
        assert_eq!(rerooted.total_jumps(), 2);
        let parents: Vec<u32> = rerooted.all_clusters().iter().map(|c| c.parent().0).collect();
        assert_eq!(parents, vec![1, 2, 0]);
        let back = rerooted.splays().next().unwrap().0;
        assert_eq!(back.from_section.id, SectionId(2));
        assert_eq!(back.to_section.id, SectionId(1));
        assert_eq!(back.distance, 1.0);
    }

    #[test]
    fn splay_on_predecessor_is_reattached() {
        // a -> b -> c along the strand, d splays off a's first section
        let a = cluster(0, &[0, 1, 2]);
        let b = cluster(1, &[3]);
        let c = cluster(2, &[4]);
        let d = cluster(3, &[5, 6]);
        let rup = Rupture::new(a.clone())
            .take(&link(&a, 2, &b, 1.0))
            .unwrap()
            .take(&link(&b, 3, &c, 1.0))
            .unwrap()
            .take(&link(&a, 0, &d, 4.0))
            .unwrap();

        for nucleation in rup.all_clusters() {
            let rerooted = nucleation_rupture(&rup, nucleation).unwrap();
            assert_eq!(rerooted.root().parent(), nucleation.parent());
            assert_eq!(rerooted.total_sections(), rup.total_sections());
            assert_eq!(rerooted.total_jumps(), rup.total_jumps());
            assert_eq!(rerooted.key(), rup.key());
        }

        let from_d = nucleation_rupture(&rup, &d).unwrap();
        let order: Vec<u32> = from_d.all_clusters().iter().map(|c| c.parent().0).collect();
        assert_eq!(order, vec![3, 0, 1, 2]);
    }

    #[test]
    fn probability_follows_nucleation() {
        let a = cluster(0, &[0]);
        let b = cluster(1, &[1]);
        let c = cluster(2, &[2]);
        let rup = Rupture::new(a.clone())
            .take(&link(&a, 0, &b, 1.0))
            .unwrap()
            .take(&link(&b, 1, &c, 3.0))
            .unwrap();
        let eval = CumulativeProbPathEvaluator::new(
            0.3,
            PlausibilityResult::FailHardStop,
            vec![Arc::new(RootJumps)],
        )
        .unwrap();
        assert_eq!(eval.nucleation_cluster_value(&rup, &a, false).unwrap(), Some(0.5));
        assert_eq!(eval.nucleation_cluster_value(&rup, &c, false).unwrap(), Some(0.25));
        assert_eq!(
            eval.test_nucleation_cluster(&rup, &c, false).unwrap(),
            PlausibilityResult::FailHardStop
        );
        assert_eq!(eval.test_nucleation_cluster(&rup, &a, true).unwrap(), PlausibilityResult::Pass);
        assert!(eval.is_directional(false));
        assert_eq!(eval.name(), "P(Root Jumps) ≥0.3");
        assert_eq!(eval.short_name(), "P(RootJumps)≥0.3");
    }

    #[test]
    fn rejects_bad_settings() {
        assert!(matches!(
            CumulativeProbPathEvaluator::new(0.5, PlausibilityResult::FailHardStop, vec![]),
            Err(ConfigError::NoProbabilityCalcs)
        ));
        assert!(matches!(
            CumulativeProbPathEvaluator::new(1.5, PlausibilityResult::FailHardStop, vec![Arc::new(RootJumps)]),
            Err(ConfigError::BadProbability(_))
        ));
        assert!(matches!(
            CumulativeProbPathEvaluator::new(0.5, PlausibilityResult::Pass, vec![Arc::new(RootJumps)]),
            Err(ConfigError::PassFailureType)
        ));
    }
}
