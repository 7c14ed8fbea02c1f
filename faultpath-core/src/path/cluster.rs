use std::collections::HashSet;

use super::{PathAddition, PathNavigator};
use crate::error::EvalError;
use crate::model::{Cluster, Rupture, Section, SectionId, TreeNavigator};

/// Grows a rupture one whole cluster at a time.
#[derive(Debug)]
pub struct ClusterPathNavigator<'a> {
    nav: &'a TreeNavigator,
    current: Vec<Section>,
    visited: HashSet<SectionId>,
    frontier: Vec<Cluster>,
    verbose: bool,
}

impl<'a> ClusterPathNavigator<'a> {
    pub fn new(rupture: &'a Rupture, nucleation: &Cluster) -> Result<Self, EvalError> {
        let nav = rupture.navigator();
        if nav.cluster_for(nucleation.start_section().id) != Some(nucleation) {
            return Err(EvalError::UnknownCluster(nucleation.to_string()));
        }
        Ok(Self {
            nav,
            current: nucleation.sections().to_vec(),
            visited: nucleation.sections().iter().map(|s| s.id).collect(),
            frontier: vec![nucleation.clone()],
            verbose: false,
        })
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl PathNavigator for ClusterPathNavigator<'_> {
    fn current_sections(&self) -> &[Section] {
        &self.current
    }

    fn next_additions(&mut self) -> Result<Vec<PathAddition>, EvalError> {
        let nav = self.nav;
        let mut additions = Vec::new();
        let mut next_frontier = Vec::new();
        for from in &self.frontier {
            let neighbors = nav
                .predecessor(from)
                .into_iter()
                .chain(nav.descendants(from));
            for to in neighbors {
                if self.visited.contains(&to.start_section().id) {
                    continue;
                }
                let jump = nav
                    .jump(from, to)
                    .ok_or_else(|| EvalError::UnknownCluster(to.to_string()))?;
                self.visited.extend(to.sections().iter().map(|s| s.id));
                additions.push(PathAddition {
                    from_section: jump.from_section,
                    from_cluster: from.clone(),
                    to_sections: to.sections().to_vec(),
                    to_cluster: to.clone(),
                });
                next_frontier.push(to.clone());
            }
        }
        for addition in &additions {
            self.current.extend_from_slice(&addition.to_sections);
        }
        if self.verbose {
            tracing::debug!(
                "cluster path: {} additions, {} sections visited",
                additions.len(),
                self.current.len()
            );
        }
        self.frontier = next_frontier;
        Ok(additions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Jump;

    fn cluster(parent: u32, ids: &[u32]) -> Cluster {
        Cluster::new(ids.iter().map(|&id| Section::new(id, parent)).collect()).unwrap()
    }

    #[test]
    fn grows_both_directions_from_middle() {
        let a = cluster(0, &[0, 1]);
        let b = cluster(1, &[2, 3]);
        let c = cluster(2, &[4, 5]);
        let rup = Rupture::new(a.clone())
            .take(&Jump::new(a.end_section(), a.clone(), b.start_section(), b.clone(), 1.0))
            .unwrap()
            .take(&Jump::new(b.end_section(), b.clone(), c.start_section(), c.clone(), 1.0))
            .unwrap();

        let mut nav = ClusterPathNavigator::new(&rup, &b).unwrap();
        assert_eq!(nav.current_sections().len(), 2);
        let step = nav.next_additions().unwrap();
        let reached: Vec<_> = step.iter().map(|a| a.to_cluster.clone()).collect();
        assert_eq!(reached, vec![a.clone(), c.clone()]);
        assert_eq!(step[0].from_section.id, SectionId(2));
        assert_eq!(step[1].from_section.id, SectionId(3));
        assert!(nav.next_additions().unwrap().is_empty());
        assert_eq!(nav.current_sections().len(), 6);
    }

    #[test]
    fn rejects_foreign_cluster() {
        let a = cluster(0, &[0]);
        let rup = Rupture::new(a);
        let other = cluster(9, &[9]);
        assert!(matches!(
            ClusterPathNavigator::new(&rup, &other),
            Err(EvalError::UnknownCluster(_))
        ));
    }
}
