use std::collections::HashMap;

use super::cluster::Cluster;
use super::jump::Jump;
use super::rupture::Rupture;
use super::section::{Section, SectionId};

/// Predecessor/descendant lookups over a rupture's clusters and sections.
///
/// Cluster edges follow the rupture's jumps. Section edges run outward from
/// each cluster's start section; the start section's predecessor is the
/// section the rupture jumped from, and a section's descendants include the
/// start sections of every cluster jumped to from it.
#[derive(Debug, Clone)]
pub struct TreeNavigator {
    clusters: Vec<Cluster>,
    cluster_of: HashMap<SectionId, usize>,
    jumps: Vec<Jump>,
    incoming: Vec<Option<usize>>,
    outgoing: Vec<Vec<usize>>,
    jumps_from: HashMap<SectionId, Vec<usize>>,
}

impl TreeNavigator {
    pub fn new(rupture: &Rupture) -> Self {
        let clusters: Vec<Cluster> = rupture.all_clusters().into_iter().cloned().collect();
        let mut cluster_of = HashMap::with_capacity(rupture.total_sections());
        for (idx, cluster) in clusters.iter().enumerate() {
            for sect in cluster.sections() {
                cluster_of.insert(sect.id, idx);
            }
        }
        let jumps: Vec<Jump> = rupture.all_jumps().into_iter().cloned().collect();
        let mut incoming = vec![None; clusters.len()];
        let mut outgoing = vec![Vec::new(); clusters.len()];
        let mut jumps_from: HashMap<SectionId, Vec<usize>> = HashMap::new();
        for (j, jump) in jumps.iter().enumerate() {
            let (Some(&from), Some(&to)) = (
                cluster_of.get(&jump.from_section.id),
                cluster_of.get(&jump.to_section.id),
            ) else {
                continue;
            };
            incoming[to] = Some(j);
            outgoing[from].push(j);
            jumps_from.entry(jump.from_section.id).or_default().push(j);
        }
        Self {
            clusters,
            cluster_of,
            jumps,
            incoming,
            outgoing,
            jumps_from,
        }
    }

    fn index_of(&self, cluster: &Cluster) -> Option<usize> {
        let idx = *self.cluster_of.get(&cluster.start_section().id)?;
        (self.clusters[idx] == *cluster).then_some(idx)
    }

    /// Cluster holding the given section.
    pub fn cluster_for(&self, id: SectionId) -> Option<&Cluster> {
        self.cluster_of.get(&id).map(|&idx| &self.clusters[idx])
    }

    pub fn predecessor(&self, cluster: &Cluster) -> Option<&Cluster> {
        let idx = self.index_of(cluster)?;
        let jump = self.incoming[idx]?;
        Some(&self.jumps[jump].from_cluster)
    }

    pub fn descendants(&self, cluster: &Cluster) -> Vec<&Cluster> {
        match self.index_of(cluster) {
            Some(idx) => self.outgoing[idx]
                .iter()
                .map(|&j| &self.jumps[j].to_cluster)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Jump between two adjacent clusters, oriented from `from` to `to`.
    pub fn jump(&self, from: &Cluster, to: &Cluster) -> Option<Jump> {
        let from_idx = self.index_of(from)?;
        let to_idx = self.index_of(to)?;
        if let Some(j) = self.incoming[to_idx] {
            if self.index_of(&self.jumps[j].from_cluster) == Some(from_idx) {
                return Some(self.jumps[j].clone());
            }
        }
        if let Some(j) = self.incoming[from_idx] {
            if self.index_of(&self.jumps[j].from_cluster) == Some(to_idx) {
                return Some(self.jumps[j].reversed());
            }
        }
        None
    }

    pub fn section_predecessor(&self, id: SectionId) -> Option<Section> {
        let idx = *self.cluster_of.get(&id)?;
        let cluster = &self.clusters[idx];
        let pos = cluster.position(id)?;
        let start = cluster.start_index();
        let sections = cluster.sections();
        if pos < start {
            Some(sections[pos + 1])
        } else if pos > start {
            Some(sections[pos - 1])
        } else {
            self.incoming[idx].map(|j| self.jumps[j].from_section)
        }
    }

    pub fn section_descendants(&self, id: SectionId) -> Vec<Section> {
        let Some(&idx) = self.cluster_of.get(&id) else {
            return Vec::new();
        };
        let cluster = &self.clusters[idx];
        let Some(pos) = cluster.position(id) else {
            return Vec::new();
        };
        let start = cluster.start_index();
        let sections = cluster.sections();
        let mut out = Vec::new();
        if pos <= start && pos > 0 {
            out.push(sections[pos - 1]);
        }
        if pos >= start && pos + 1 < sections.len() {
            out.push(sections[pos + 1]);
        }
        if let Some(jumps) = self.jumps_from.get(&id) {
            out.extend(jumps.iter().map(|&j| self.jumps[j].to_section));
        }
        out
    }

    /// Jump between two adjacent sections on different clusters, oriented
    /// from `from` to `to`.
    pub fn section_jump(&self, from: SectionId, to: SectionId) -> Option<Jump> {
        let to_idx = *self.cluster_of.get(&to)?;
        if let Some(j) = self.incoming[to_idx] {
            let jump = &self.jumps[j];
            if jump.from_section.id == from && jump.to_section.id == to {
                return Some(jump.clone());
            }
        }
        let from_idx = *self.cluster_of.get(&from)?;
        if let Some(j) = self.incoming[from_idx] {
            let jump = &self.jumps[j];
            if jump.from_section.id == to && jump.to_section.id == from {
                return Some(jump.reversed());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster(parent: u32, ids: &[u32]) -> Cluster {
        Cluster::new(ids.iter().map(|&id| Section::new(id, parent)).collect()).unwrap()
    }

    /// [0:0,1,2] -> [1:3,4] from section 2, plus a splay [2:5,6] from section 1.
    fn splayed() -> (Rupture, Cluster, Cluster, Cluster) {
        let a = cluster(0, &[0, 1, 2]);
        let b = cluster(1, &[3, 4]);
        let c = cluster(2, &[5, 6]);
        let rup = Rupture::new(a.clone())
            .take(&Jump::new(a.end_section(), a.clone(), b.start_section(), b.clone(), 2.0))
            .unwrap()
            .take(&Jump::new(a.sections()[1], a.clone(), c.start_section(), c.clone(), 3.0))
            .unwrap();
        (rup, a, b, c)
    }

    fn ids(sects: &[Section]) -> Vec<u32> {
        sects.iter().map(|s| s.id.0).collect()
    }

    #[test]
    fn cluster_edges() {
        let (rup, a, b, c) = splayed();
        let nav = rup.navigator();
        assert_eq!(nav.predecessor(&a), None);
        assert_eq!(nav.predecessor(&b), Some(&a));
        assert_eq!(nav.predecessor(&c), Some(&a));
        assert_eq!(nav.descendants(&a), vec![&b, &c]);
        assert!(nav.descendants(&b).is_empty());
    }

    #[test]
    fn jumps_in_both_directions() {
        let (rup, a, b, c) = splayed();
        let nav = rup.navigator();
        let fwd = nav.jump(&a, &c).unwrap();
        assert_eq!(fwd.from_section.id, SectionId(1));
        assert_eq!(fwd.distance, 3.0);
        let back = nav.jump(&c, &a).unwrap();
        assert_eq!(back.from_section.id, SectionId(5));
        assert_eq!(back.to_cluster, a);
        assert_eq!(back.distance, 3.0);
        assert!(nav.jump(&b, &c).is_none());
    }

    #[test]
    fn section_edges() {
        let (rup, ..) = splayed();
        let nav = rup.navigator();
        assert_eq!(nav.section_predecessor(SectionId(0)), None);
        assert_eq!(ids(&nav.section_descendants(SectionId(1))), vec![2, 5]);
        assert_eq!(ids(&nav.section_descendants(SectionId(2))), vec![3]);
        assert_eq!(nav.section_predecessor(SectionId(5)).map(|s| s.id.0), Some(1));
        assert_eq!(nav.section_predecessor(SectionId(3)).map(|s| s.id.0), Some(2));
        assert!(nav.section_jump(SectionId(5), SectionId(1)).is_some());
        assert!(nav.section_jump(SectionId(1), SectionId(2)).is_none());
    }

    #[test]
    fn interior_start_grows_both_ways() {
        let a = cluster(0, &[0]);
        let b = Cluster::starting_at(
            (10..14).map(|id| Section::new(id, 1)).collect(),
            SectionId(12),
        )
        .unwrap();
        let rup = Rupture::new(a.clone())
            .take(&Jump::new(a.end_section(), a.clone(), b.start_section(), b.clone(), 1.0))
            .unwrap();
        let nav = rup.navigator();
        assert_eq!(ids(&nav.section_descendants(SectionId(12))), vec![11, 13]);
        assert_eq!(ids(&nav.section_descendants(SectionId(11))), vec![10]);
        assert_eq!(nav.section_predecessor(SectionId(10)).map(|s| s.id.0), Some(11));
        assert_eq!(nav.section_predecessor(SectionId(12)).map(|s| s.id.0), Some(0));
    }
}
