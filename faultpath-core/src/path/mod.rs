//! Path navigators: grow a rupture outward from a nucleation cluster one step
//! at a time.
//!
//! Each call to `next_additions` returns every unvisited neighbor of the
//! current frontier (predecessor and descendant directions) and advances the
//! navigator so those neighbors become the new frontier. Callers read
//! `current_sections` before each call to get the sections the step grows from.

mod cluster;
mod favorable;
mod section;

use std::hash::{Hash, Hasher};

use crate::error::EvalError;
use crate::model::{Cluster, Section};

pub use cluster::ClusterPathNavigator;
pub use favorable::FavorableSectionPathNavigator;
pub use section::SectionPathNavigator;

/// One growth step: the sections reached and where they were reached from.
///
/// Equality and hashing consider `to_sections` only.
#[derive(Debug, Clone)]
pub struct PathAddition {
    pub from_section: Section,
    pub from_cluster: Cluster,
    pub to_sections: Vec<Section>,
    pub to_cluster: Cluster,
}

impl PartialEq for PathAddition {
    fn eq(&self, other: &Self) -> bool {
        self.to_sections == other.to_sections
    }
}

impl Eq for PathAddition {}

impl Hash for PathAddition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_sections.hash(state);
    }
}

/// Outward growth over a rupture's tree.
pub trait PathNavigator {
    /// Sections visited so far, in the order they were reached.
    fn current_sections(&self) -> &[Section];

    /// Next unvisited neighbors of the frontier; advances the navigator.
    /// Returns an empty list once the whole rupture has been reached.
    fn next_additions(&mut self) -> Result<Vec<PathAddition>, EvalError>;
}
