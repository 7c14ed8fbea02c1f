use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use super::cluster::Cluster;
use super::jump::Jump;
use super::section::{Section, SectionId};
use super::tree::TreeNavigator;
use crate::error::GraphError;

/// Rooted tree of clusters: a primary strand plus splays.
///
/// Every section appears exactly once. Ruptures are immutable; `take` returns
/// a new rupture and leaves `self` untouched.
#[derive(Debug, Clone)]
pub struct Rupture {
    clusters: Vec<Cluster>,
    internal_jumps: Vec<Jump>,
    splays: Vec<(Jump, Arc<Rupture>)>,
    sections: HashSet<SectionId>,
    internal_sections: HashSet<SectionId>,
    single_strand: bool,
    navigator: OnceLock<TreeNavigator>,
}

/// Order-independent identity of a rupture: its sorted section ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RuptureKey(Vec<SectionId>);

impl RuptureKey {
    pub fn sections(&self) -> &[SectionId] {
        &self.0
    }
}

impl Rupture {
    /// Single-cluster rupture.
    pub fn new(cluster: Cluster) -> Self {
        let sections: HashSet<SectionId> = cluster.sections().iter().map(|s| s.id).collect();
        Self {
            clusters: vec![cluster],
            internal_jumps: Vec::new(),
            splays: Vec::new(),
            internal_sections: sections.clone(),
            sections,
            single_strand: true,
            navigator: OnceLock::new(),
        }
    }

    /// New rupture with `jump.to_cluster` attached.
    ///
    /// A jump from the end section of the last primary cluster extends the
    /// primary strand. A jump from any other primary section starts a splay.
    /// A jump from a section inside a splay grows that splay.
    pub fn take(&self, jump: &Jump) -> Result<Rupture, GraphError> {
        let from = jump.from_section.id;
        if !self.sections.contains(&from) {
            return Err(GraphError::UnknownFromSection(from));
        }
        if jump.to_section.id != jump.to_cluster.start_section().id {
            return Err(GraphError::NotClusterStart(jump.to_section.id));
        }
        if let Some(dup) = jump
            .to_cluster
            .sections()
            .iter()
            .find(|s| self.sections.contains(&s.id))
        {
            return Err(GraphError::DuplicateSection(dup.id));
        }

        let mut sections = self.sections.clone();
        sections.extend(jump.to_cluster.sections().iter().map(|s| s.id));

        if self.internal_sections.contains(&from) {
            let last = &self.clusters[self.clusters.len() - 1];
            if last.end_section().id == from {
                if jump.from_cluster != *last {
                    return Err(GraphError::ClusterMismatch(from));
                }
                let mut clusters = self.clusters.clone();
                clusters.push(jump.to_cluster.clone());
                let mut internal_jumps = self.internal_jumps.clone();
                internal_jumps.push(jump.clone());
                let mut internal_sections = self.internal_sections.clone();
                internal_sections.extend(jump.to_cluster.sections().iter().map(|s| s.id));
                let single_strand = self.single_strand
                    && jump.to_section.id == jump.to_cluster.first_section().id;
                return Ok(Rupture {
                    clusters,
                    internal_jumps,
                    splays: self.splays.clone(),
                    sections,
                    internal_sections,
                    single_strand,
                    navigator: OnceLock::new(),
                });
            }
            let holder = self.clusters.iter().find(|c| c.contains(from));
            if holder != Some(&jump.from_cluster) {
                return Err(GraphError::ClusterMismatch(from));
            }
            let mut splays = self.splays.clone();
            splays.push((jump.clone(), Arc::new(Rupture::new(jump.to_cluster.clone()))));
            return Ok(Rupture {
                clusters: self.clusters.clone(),
                internal_jumps: self.internal_jumps.clone(),
                splays,
                sections,
                internal_sections: self.internal_sections.clone(),
                single_strand: false,
                navigator: OnceLock::new(),
            });
        }

        let mut splays = self.splays.clone();
        let slot = splays
            .iter_mut()
            .find(|(_, splay)| splay.contains(from))
            .ok_or(GraphError::UnknownFromSection(from))?;
        slot.1 = Arc::new(slot.1.take(jump)?);
        Ok(Rupture {
            clusters: self.clusters.clone(),
            internal_jumps: self.internal_jumps.clone(),
            splays,
            sections,
            internal_sections: self.internal_sections.clone(),
            single_strand: false,
            navigator: OnceLock::new(),
        })
    }

    /// The same rupture traversed from its last cluster back to its root.
    pub fn reversed(&self) -> Result<Rupture, GraphError> {
        if !self.single_strand {
            return Err(GraphError::NotSingleStrand);
        }
        let reversed: Vec<Cluster> = self.clusters.iter().rev().map(Cluster::reversed).collect();
        let mut rupture = Rupture::new(reversed[0].clone());
        for (i, orig) in self.internal_jumps.iter().rev().enumerate() {
            let from = &reversed[i];
            let to = &reversed[i + 1];
            let jump = Jump::new(
                from.end_section(),
                from.clone(),
                to.start_section(),
                to.clone(),
                orig.distance,
            );
            rupture = rupture.take(&jump)?;
        }
        Ok(rupture)
    }

    /// Root cluster.
    pub fn root(&self) -> &Cluster {
        &self.clusters[0]
    }

    /// Primary strand clusters, root first.
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Jumps along the primary strand.
    pub fn internal_jumps(&self) -> &[Jump] {
        &self.internal_jumps
    }

    /// Splays in the order they were attached.
    pub fn splays(&self) -> impl Iterator<Item = (&Jump, &Rupture)> {
        self.splays.iter().map(|(jump, splay)| (jump, splay.as_ref()))
    }

    pub fn contains(&self, id: SectionId) -> bool {
        self.sections.contains(&id)
    }

    pub fn total_sections(&self) -> usize {
        self.sections.len()
    }

    pub fn total_jumps(&self) -> usize {
        self.internal_jumps.len()
            + self
                .splays
                .iter()
                .map(|(_, splay)| 1 + splay.total_jumps())
                .sum::<usize>()
    }

    pub fn total_clusters(&self) -> usize {
        self.clusters.len()
            + self
                .splays
                .iter()
                .map(|(_, splay)| splay.total_clusters())
                .sum::<usize>()
    }

    pub fn total_splays(&self) -> usize {
        self.splays
            .iter()
            .map(|(_, splay)| 1 + splay.total_splays())
            .sum()
    }

    pub fn is_single_strand(&self) -> bool {
        self.single_strand
    }

    pub fn is_splayed(&self) -> bool {
        !self.splays.is_empty()
    }

    /// Every cluster: the primary strand first, then each splay recursively in
    /// the order attached. This is the nucleation order used by path filters.
    pub fn all_clusters(&self) -> Vec<&Cluster> {
        let mut out = Vec::with_capacity(self.clusters.len());
        self.collect_clusters(&mut out);
        out
    }

    fn collect_clusters<'a>(&'a self, out: &mut Vec<&'a Cluster>) {
        out.extend(self.clusters.iter());
        for (_, splay) in &self.splays {
            splay.collect_clusters(out);
        }
    }

    /// Every jump: primary strand first, then each splay jump followed by the
    /// jumps inside that splay.
    pub fn all_jumps(&self) -> Vec<&Jump> {
        let mut out = Vec::with_capacity(self.internal_jumps.len());
        self.collect_jumps(&mut out);
        out
    }

    fn collect_jumps<'a>(&'a self, out: &mut Vec<&'a Jump>) {
        out.extend(self.internal_jumps.iter());
        for (jump, splay) in &self.splays {
            out.push(jump);
            splay.collect_jumps(out);
        }
    }

    /// Sections in strand order, with each splay emitted right after the
    /// section it branches from.
    pub fn ordered_sections(&self) -> Vec<Section> {
        let mut out = Vec::with_capacity(self.sections.len());
        self.collect_sections(&mut out);
        out
    }

    fn collect_sections(&self, out: &mut Vec<Section>) {
        for cluster in &self.clusters {
            for sect in cluster.sections() {
                out.push(*sect);
                for (jump, splay) in &self.splays {
                    if jump.from_section.id == sect.id {
                        splay.collect_sections(out);
                    }
                }
            }
        }
    }

    pub fn key(&self) -> RuptureKey {
        let mut ids: Vec<SectionId> = self.sections.iter().copied().collect();
        ids.sort_unstable();
        RuptureKey(ids)
    }

    /// Whether `self` is built on `other`: every cluster of `other` appears
    /// unchanged (same sections, same start) and every jump of `other` is
    /// taken between the same sections.
    pub fn extends(&self, other: &Rupture) -> bool {
        let clusters: HashSet<&Cluster> = self.all_clusters().into_iter().collect();
        let jumps: HashSet<(SectionId, SectionId)> = self
            .all_jumps()
            .iter()
            .map(|j| (j.from_section.id, j.to_section.id))
            .collect();
        other.all_clusters().iter().all(|c| clusters.contains(c))
            && other
                .all_jumps()
                .iter()
                .all(|j| jumps.contains(&(j.from_section.id, j.to_section.id)))
    }

    /// Predecessor/descendant lookups, built on first use.
    pub fn navigator(&self) -> &TreeNavigator {
        self.navigator.get_or_init(|| TreeNavigator::new(self))
    }
}

impl fmt::Display for Rupture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cluster in &self.clusters {
            write!(f, "{cluster}")?;
        }
        for (jump, splay) in &self.splays {
            write!(
                f,
                "\n\t--splay from [{}:{}]: {}",
                jump.from_cluster.parent(),
                jump.from_section.id,
                splay
            )?;
        }
        Ok(())
    }
}
