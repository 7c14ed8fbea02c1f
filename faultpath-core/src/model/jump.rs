use std::fmt;

use super::cluster::Cluster;
use super::section::Section;

/// Distance-weighted connection between a section of one cluster and the
/// start section of another.
#[derive(Debug, Clone, PartialEq)]
pub struct Jump {
    pub from_section: Section,
    pub from_cluster: Cluster,
    pub to_section: Section,
    pub to_cluster: Cluster,
    /// Distance in km.
    pub distance: f64,
}

impl Jump {
    pub fn new(
        from_section: Section,
        from_cluster: Cluster,
        to_section: Section,
        to_cluster: Cluster,
        distance: f64,
    ) -> Self {
        Self {
            from_section,
            from_cluster,
            to_section,
            to_cluster,
            distance,
        }
    }

    /// Same connection traversed the other way.
    pub fn reversed(&self) -> Jump {
        Jump {
            from_section: self.to_section,
            from_cluster: self.to_cluster.clone(),
            to_section: self.from_section,
            to_cluster: self.from_cluster.clone(),
            distance: self.distance,
        }
    }
}

impl fmt::Display for Jump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}:{}]=>[{}:{}] ({:.1} km)",
            self.from_cluster.parent(),
            self.from_section.id,
            self.to_cluster.parent(),
            self.to_section.id,
            self.distance
        )
    }
}
