use std::sync::Arc;

use super::section::SectionPathNavigator;
use super::{PathAddition, PathNavigator};
use crate::error::EvalError;
use crate::model::{Cluster, Rupture, Section};
use crate::range::AcceptableRange;
use crate::sources::{DistanceSource, StressSource};

/// Section navigator that replaces each jump with the most stress-favorable
/// one into the same destination cluster.
///
/// Candidates are the original jump target plus every destination section
/// within `max_search_dist` of some section of the source cluster. Each is
/// scored with the stress source against the sections visited so far, and the
/// best by the acceptable range wins. Candidates are enumerated nearest first
/// (ties by section id), and the first of equally good candidates is kept, so
/// the choice does not depend on the order sections are listed in.
pub struct FavorableSectionPathNavigator<'a> {
    inner: SectionPathNavigator<'a>,
    stress: &'a Arc<dyn StressSource>,
    distances: &'a Arc<dyn DistanceSource>,
    range: AcceptableRange,
    max_search_dist: f64,
}

impl<'a> FavorableSectionPathNavigator<'a> {
    pub fn new(
        rupture: &'a Rupture,
        nucleation: &Cluster,
        stress: &'a Arc<dyn StressSource>,
        distances: &'a Arc<dyn DistanceSource>,
        range: AcceptableRange,
        max_search_dist: f64,
    ) -> Result<Self, EvalError> {
        Ok(Self {
            inner: SectionPathNavigator::new(rupture, nucleation)?,
            stress,
            distances,
            range,
            max_search_dist,
        })
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.inner.verbose = verbose;
        self
    }
}

impl PathNavigator for FavorableSectionPathNavigator<'_> {
    fn current_sections(&self) -> &[Section] {
        self.inner.current_sections()
    }

    fn next_additions(&mut self) -> Result<Vec<PathAddition>, EvalError> {
        let Self {
            inner,
            stress,
            distances,
            range,
            max_search_dist,
        } = self;
        let (stress, distances, range, max_search_dist) = (*stress, *distances, *range, *max_search_dist);

        inner.grow(|nav, from, neighbor| {
            if neighbor.parent == from.parent {
                return Ok(neighbor);
            }
            let jump = nav
                .tree()
                .section_jump(from.id, neighbor.id)
                .ok_or_else(|| EvalError::UnknownCluster(neighbor.id.to_string()))?;

            let mut candidates: Vec<(f64, Section)> = Vec::new();
            for &sect in jump.to_cluster.sections() {
                let mut nearest = f64::INFINITY;
                for source in jump.from_cluster.sections() {
                    let d = distances
                        .distance(&sect, source)
                        .map_err(|e| EvalError::from_source(distances.name(), e))?;
                    nearest = nearest.min(d);
                }
                if sect.id == neighbor.id || nearest <= max_search_dist {
                    candidates.push((nearest, sect));
                }
            }
            candidates.sort_by(|(da, a), (db, b)| da.total_cmp(db).then(a.id.cmp(&b.id)));

            let current = nav.current_sections();
            let mut best: Option<(f64, Section)> = None;
            for (_, sect) in candidates {
                if nav.is_visited(sect.id) {
                    continue;
                }
                let value = stress
                    .calc(current, &[sect])
                    .map_err(|e| EvalError::from_source(stress.name(), e))?;
                if nav.verbose {
                    tracing::debug!("favorable jump {} -> {}: {}", from.id, sect.id, value);
                }
                match best {
                    Some((best_value, _)) if !range.is_value_better(value, best_value) => {}
                    _ => best = Some((value, sect)),
                }
            }
            Ok(best.map_or(neighbor, |(_, sect)| sect))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::model::{Jump, SectionId};

    struct ById;

    impl StressSource for ById {
        fn name(&self) -> &str {
            "by id"
        }

        fn calc(&self, _sources: &[Section], receivers: &[Section]) -> Result<f64, SourceError> {
            Ok(receivers.iter().map(|s| s.id.0 as f64).sum())
        }
    }

    struct Near;

    impl DistanceSource for Near {
        fn distance(&self, _a: &Section, _b: &Section) -> Result<f64, SourceError> {
            Ok(1.0)
        }
    }

    #[test]
    fn takes_best_destination() {
        let x = Cluster::new(vec![Section::new(0, 0), Section::new(1, 0)]).unwrap();
        let y = Cluster::new(vec![Section::new(10, 1), Section::new(11, 1), Section::new(12, 1)])
            .unwrap();
        let rup = Rupture::new(x.clone())
            .take(&Jump::new(x.end_section(), x.clone(), y.start_section(), y.clone(), 1.0))
            .unwrap();
        let stress: Arc<dyn StressSource> = Arc::new(ById);
        let dist: Arc<dyn DistanceSource> = Arc::new(Near);
        let mut nav = FavorableSectionPathNavigator::new(
            &rup,
            &x,
            &stress,
            &dist,
            AcceptableRange::at_least(0.0),
            5.0,
        )
        .unwrap();
        let step = nav.next_additions().unwrap();
        assert_eq!(step.len(), 1);
        assert_eq!(step[0].to_sections[0].id, SectionId(12));
        assert_eq!(step[0].to_cluster, y);

        while !nav.next_additions().unwrap().is_empty() {}
        assert_eq!(nav.current_sections().len(), 5);
    }
}
