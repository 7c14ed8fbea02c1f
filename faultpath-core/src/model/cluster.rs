use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::section::{ParentId, Section, SectionId};
use crate::error::GraphError;

/// Ordered run of sections on one parent fault.
///
/// The start section is where the rupture enters the cluster (normally the
/// first one). The end section is always the last one: a jump from it extends
/// the strand, a jump from any other section starts a splay.
///
/// Clones are cheap; the section list is shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cluster {
    parent: ParentId,
    sections: Arc<[Section]>,
    start: usize,
}

impl Cluster {
    /// Cluster entered at its first section.
    pub fn new(sections: Vec<Section>) -> Result<Self, GraphError> {
        Self::build(sections, None)
    }

    /// Cluster entered at `start`, which must be one of `sections`.
    pub fn starting_at(sections: Vec<Section>, start: SectionId) -> Result<Self, GraphError> {
        Self::build(sections, Some(start))
    }

    fn build(sections: Vec<Section>, start: Option<SectionId>) -> Result<Self, GraphError> {
        let first = sections.first().ok_or(GraphError::EmptyCluster)?;
        let parent = first.parent;
        let mut seen = HashSet::with_capacity(sections.len());
        for sect in &sections {
            if sect.parent != parent {
                return Err(GraphError::MixedParents {
                    section: sect.id,
                    expected: parent,
                });
            }
            if !seen.insert(sect.id) {
                return Err(GraphError::DuplicateSection(sect.id));
            }
        }
        let start = match start {
            Some(id) => sections
                .iter()
                .position(|s| s.id == id)
                .ok_or(GraphError::StartNotInCluster(id))?,
            None => 0,
        };
        Ok(Self {
            parent,
            sections: sections.into(),
            start,
        })
    }

    pub fn parent(&self) -> ParentId {
        self.parent
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn start_section(&self) -> Section {
        self.sections[self.start]
    }

    pub fn start_index(&self) -> usize {
        self.start
    }

    pub fn first_section(&self) -> Section {
        self.sections[0]
    }

    pub fn end_section(&self) -> Section {
        self.sections[self.sections.len() - 1]
    }

    pub fn position(&self, id: SectionId) -> Option<usize> {
        self.sections.iter().position(|s| s.id == id)
    }

    pub fn contains(&self, id: SectionId) -> bool {
        self.position(id).is_some()
    }

    /// Same sections in reverse order, entered at the new first section.
    pub fn reversed(&self) -> Cluster {
        let sections: Vec<Section> = self.sections.iter().rev().copied().collect();
        Cluster {
            parent: self.parent,
            sections: sections.into(),
            start: 0,
        }
    }

    /// Same sections in reverse order, entered at `start`.
    pub fn reversed_from(&self, start: SectionId) -> Result<Cluster, GraphError> {
        let pos = self
            .position(start)
            .ok_or(GraphError::StartNotInCluster(start))?;
        let mut reversed = self.reversed();
        reversed.start = self.sections.len() - 1 - pos;
        Ok(reversed)
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:", self.parent)?;
        for (i, sect) in self.sections.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            if i == self.start && i != 0 {
                write!(f, "->")?;
            }
            write!(f, "{}", sect.id)?;
        }
        write!(f, "]")
    }
}
