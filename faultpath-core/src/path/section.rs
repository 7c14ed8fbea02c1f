use std::collections::HashSet;

use super::{PathAddition, PathNavigator};
use crate::error::EvalError;
use crate::model::{Cluster, Rupture, Section, SectionId, TreeNavigator};

/// Grows a rupture one section at a time, starting from every section of the
/// nucleation cluster.
#[derive(Debug)]
pub struct SectionPathNavigator<'a> {
    nav: &'a TreeNavigator,
    current: Vec<Section>,
    visited: HashSet<SectionId>,
    growth_points: Vec<Section>,
    pub(super) verbose: bool,
}

impl<'a> SectionPathNavigator<'a> {
    pub fn new(rupture: &'a Rupture, nucleation: &Cluster) -> Result<Self, EvalError> {
        let nav = rupture.navigator();
        if nav.cluster_for(nucleation.start_section().id) != Some(nucleation) {
            return Err(EvalError::UnknownCluster(nucleation.to_string()));
        }
        Ok(Self {
            nav,
            current: nucleation.sections().to_vec(),
            visited: nucleation.sections().iter().map(|s| s.id).collect(),
            growth_points: nucleation.sections().to_vec(),
            verbose: false,
        })
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub(super) fn tree(&self) -> &'a TreeNavigator {
        self.nav
    }

    pub(super) fn is_visited(&self, id: SectionId) -> bool {
        self.visited.contains(&id)
    }

    fn neighbors(&self, sect: Section) -> Vec<Section> {
        let mut out: Vec<Section> = self.nav.section_predecessor(sect.id).into_iter().collect();
        out.extend(self.nav.section_descendants(sect.id));
        out
    }

    /// One growth step. `resolve` maps each unvisited neighbor of a growth
    /// point to the section actually added; it sees the pre-step state.
    pub(super) fn grow<F>(&mut self, mut resolve: F) -> Result<Vec<PathAddition>, EvalError>
    where
        F: FnMut(&Self, Section, Section) -> Result<Section, EvalError>,
    {
        let mut additions = Vec::new();
        let mut added = HashSet::new();
        for &from in &self.growth_points {
            for neighbor in self.neighbors(from) {
                if self.visited.contains(&neighbor.id) {
                    continue;
                }
                let dest = resolve(self, from, neighbor)?;
                if self.visited.contains(&dest.id) || !added.insert(dest.id) {
                    continue;
                }
                additions.push(self.addition(from, dest)?);
            }
        }
        self.growth_points = additions.iter().flat_map(|a| a.to_sections.iter().copied()).collect();
        for &sect in &self.growth_points {
            self.visited.insert(sect.id);
            self.current.push(sect);
        }
        if self.verbose {
            tracing::debug!(
                "section path: {} additions, {} sections visited",
                additions.len(),
                self.current.len()
            );
        }
        Ok(additions)
    }

    fn addition(&self, from: Section, to: Section) -> Result<PathAddition, EvalError> {
        let cluster_of = |sect: Section| {
            self.nav
                .cluster_for(sect.id)
                .cloned()
                .ok_or_else(|| EvalError::UnknownCluster(sect.id.to_string()))
        };
        Ok(PathAddition {
            from_section: from,
            from_cluster: cluster_of(from)?,
            to_sections: vec![to],
            to_cluster: cluster_of(to)?,
        })
    }
}

impl PathNavigator for SectionPathNavigator<'_> {
    fn current_sections(&self) -> &[Section] {
        &self.current
    }

    fn next_additions(&mut self) -> Result<Vec<PathAddition>, EvalError> {
        self.grow(|_, _, neighbor| Ok(neighbor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Jump;

    fn cluster(parent: u32, ids: &[u32]) -> Cluster {
        Cluster::new(ids.iter().map(|&id| Section::new(id, parent)).collect()).unwrap()
    }

    fn ids(additions: &[PathAddition]) -> Vec<u32> {
        additions.iter().map(|a| a.to_sections[0].id.0).collect()
    }

    #[test]
    fn steps_one_section_at_a_time() {
        let a = cluster(0, &[0, 1]);
        let b = cluster(1, &[2, 3, 4]);
        let rup = Rupture::new(a.clone())
            .take(&Jump::new(a.end_section(), a.clone(), b.start_section(), b.clone(), 1.0))
            .unwrap();

        let mut nav = SectionPathNavigator::new(&rup, &a).unwrap();
        assert_eq!(ids(&nav.next_additions().unwrap()), vec![2]);
        assert_eq!(ids(&nav.next_additions().unwrap()), vec![3]);
        assert_eq!(ids(&nav.next_additions().unwrap()), vec![4]);
        assert!(nav.next_additions().unwrap().is_empty());
        assert_eq!(nav.current_sections().len(), rup.total_sections());

        let mut back = SectionPathNavigator::new(&rup, &b).unwrap();
        let step = back.next_additions().unwrap();
        assert_eq!(ids(&step), vec![1]);
        assert_eq!(step[0].from_section.id, SectionId(2));
        assert_eq!(step[0].to_cluster, a);
        assert_eq!(ids(&back.next_additions().unwrap()), vec![0]);
    }
}
