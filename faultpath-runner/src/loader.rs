//! Rupture documents: JSON descriptions of ruptures to evaluate.
//!
//! ```json
//! { "ruptures": [
//!     { "clusters": [ { "parent": 3, "sections": [30, 31] },
//!                     { "parent": 4, "sections": [40, 41], "start": 40 } ],
//!       "jumps": [ { "from": 31, "to": 40, "distance": 1.2 } ] },
//!     { "clusters": [ ... ], "jumps": [ ... ], "parent": 0 }
//! ] }
//! ```
//!
//! The first cluster of each rupture is its root and jumps are taken in the
//! order listed. `parent` names an earlier rupture this one extends: every
//! cluster and jump of the parent must appear unchanged in the child.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use faultpath_core::model::{Cluster, Jump, Rupture, Section, SectionId};
use faultpath_core::GraphError;

/// Errors from loading documents, tables and run configs.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("rupture {index}: {source}")]
    Graph {
        index: usize,
        #[source]
        source: GraphError,
    },

    #[error("rupture {index}: jump references unknown section {section}")]
    UnknownSection { index: usize, section: u32 },

    #[error("rupture {index}: has no clusters")]
    NoClusters { index: usize },

    #[error("rupture {index}: parent {parent} must be an earlier rupture")]
    BadParent { index: usize, parent: usize },

    #[error("rupture {index}: does not extend its parent {parent}")]
    NotExtension { index: usize, parent: usize },
}

pub(crate) fn read_file(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ── Documents ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuptureSetDoc {
    pub ruptures: Vec<RuptureDoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuptureDoc {
    pub clusters: Vec<ClusterDoc>,
    #[serde(default)]
    pub jumps: Vec<JumpDoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterDoc {
    pub parent: u32,
    pub sections: Vec<u32>,
    /// Section the rupture enters the cluster at; defaults to the first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct JumpDoc {
    pub from: u32,
    pub to: u32,
    pub distance: f64,
}

impl ClusterDoc {
    fn build(&self, index: usize) -> Result<Cluster, LoadError> {
        let sections = self
            .sections
            .iter()
            .map(|&id| Section::new(id, self.parent))
            .collect();
        let cluster = match self.start {
            Some(start) => Cluster::starting_at(sections, SectionId(start)),
            None => Cluster::new(sections),
        };
        cluster.map_err(|source| LoadError::Graph { index, source })
    }
}

impl RuptureDoc {
    /// Builds the rupture; `index` is only used in error messages.
    pub fn build(&self, index: usize) -> Result<Rupture, LoadError> {
        let clusters = self
            .clusters
            .iter()
            .map(|c| c.build(index))
            .collect::<Result<Vec<_>, _>>()?;
        let root = clusters.first().ok_or(LoadError::NoClusters { index })?;

        let mut cluster_of: HashMap<u32, usize> = HashMap::new();
        for (i, cluster) in clusters.iter().enumerate() {
            for sect in cluster.sections() {
                cluster_of.insert(sect.id.0, i);
            }
        }
        let mut rupture = Rupture::new(root.clone());
        for jump in &self.jumps {
            let (from, from_cluster) = locate(&clusters, &cluster_of, index, jump.from)?;
            let (to, to_cluster) = locate(&clusters, &cluster_of, index, jump.to)?;
            let jump = Jump::new(from, from_cluster.clone(), to, to_cluster.clone(), jump.distance);
            rupture = rupture
                .take(&jump)
                .map_err(|source| LoadError::Graph { index, source })?;
        }
        Ok(rupture)
    }
}

fn locate<'c>(
    clusters: &'c [Cluster],
    cluster_of: &HashMap<u32, usize>,
    index: usize,
    id: u32,
) -> Result<(Section, &'c Cluster), LoadError> {
    let unknown = LoadError::UnknownSection { index, section: id };
    let Some(cluster) = cluster_of.get(&id).map(|&i| &clusters[i]) else {
        return Err(unknown);
    };
    match cluster.sections().iter().find(|s| s.id.0 == id) {
        Some(&section) => Ok((section, cluster)),
        None => Err(unknown),
    }
}

// ── Loaded sets ──────────────────────────────────────────────────────

/// Ruptures built from a document, with their parent links.
#[derive(Debug, Clone)]
pub struct RuptureSet {
    pub ruptures: Vec<Rupture>,
    pub parents: Vec<Option<usize>>,
}

impl RuptureSet {
    pub fn from_doc(doc: &RuptureSetDoc) -> Result<Self, LoadError> {
        let mut ruptures = Vec::with_capacity(doc.ruptures.len());
        let mut parents = Vec::with_capacity(doc.ruptures.len());
        for (index, rup) in doc.ruptures.iter().enumerate() {
            if let Some(parent) = rup.parent {
                if parent >= index {
                    return Err(LoadError::BadParent { index, parent });
                }
            }
            let rupture = rup.build(index)?;
            if let Some(parent) = rup.parent {
                if !rupture.extends(&ruptures[parent]) {
                    return Err(LoadError::NotExtension { index, parent });
                }
            }
            ruptures.push(rupture);
            parents.push(rup.parent);
        }
        Ok(Self { ruptures, parents })
    }

    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let doc: RuptureSetDoc = serde_json::from_str(json)?;
        Self::from_doc(&doc)
    }

    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        Self::from_json(&read_file(path)?)
    }

    pub fn len(&self) -> usize {
        self.ruptures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ruptures.is_empty()
    }

    /// Index of the first rupture in `index`'s parent chain.
    pub fn chain_root(&self, mut index: usize) -> usize {
        while let Some(parent) = self.parents[index] {
            index = parent;
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO: &str = r#"{ "ruptures": [
        { "clusters": [ { "parent": 0, "sections": [0, 1] } ] },
        { "clusters": [ { "parent": 0, "sections": [0, 1] },
                        { "parent": 1, "sections": [2, 3], "start": 3 } ],
          "jumps": [ { "from": 1, "to": 3, "distance": 2.5 } ],
          "parent": 0 }
    ] }"#;

    #[test]
    fn builds_ruptures_and_parents() {
        let set = RuptureSet::from_json(TWO).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.parents, vec![None, Some(0)]);
        let child = &set.ruptures[1];
        assert_eq!(child.total_sections(), 4);
        assert_eq!(child.internal_jumps()[0].distance, 2.5);
        assert_eq!(child.clusters()[1].start_section().id, SectionId(3));
        assert_eq!(set.chain_root(1), 0);
    }

    #[test]
    fn rejects_forward_parent() {
        let json = r#"{ "ruptures": [
            { "clusters": [ { "parent": 0, "sections": [0] } ], "parent": 0 }
        ] }"#;
        assert!(matches!(
            RuptureSet::from_json(json),
            Err(LoadError::BadParent { index: 0, parent: 0 })
        ));
    }

    #[test]
    fn rejects_parent_that_is_not_contained() {
        let json = r#"{ "ruptures": [
            { "clusters": [ { "parent": 0, "sections": [0, 1] }, { "parent": 1, "sections": [2, 3] } ],
              "jumps": [ { "from": 1, "to": 2, "distance": 1.0 } ] },
            { "clusters": [ { "parent": 0, "sections": [0, 1] }, { "parent": 2, "sections": [4, 5] } ],
              "jumps": [ { "from": 1, "to": 4, "distance": 1.0 } ],
              "parent": 0 }
        ] }"#;
        assert!(matches!(
            RuptureSet::from_json(json),
            Err(LoadError::NotExtension { index: 1, parent: 0 })
        ));
    }

    #[test]
    fn rejects_unknown_jump_section() {
        let json = r#"{ "ruptures": [
            { "clusters": [ { "parent": 0, "sections": [0] } ],
              "jumps": [ { "from": 0, "to": 9, "distance": 1.0 } ] }
        ] }"#;
        assert!(matches!(
            RuptureSet::from_json(json),
            Err(LoadError::UnknownSection { index: 0, section: 9 })
        ));
    }

    #[test]
    fn rejects_jump_into_cluster_middle() {
        let json = r#"{ "ruptures": [
            { "clusters": [ { "parent": 0, "sections": [0] }, { "parent": 1, "sections": [1, 2] } ],
              "jumps": [ { "from": 0, "to": 2, "distance": 1.0 } ] }
        ] }"#;
        assert!(matches!(
            RuptureSet::from_json(json),
            Err(LoadError::Graph { index: 0, source: GraphError::NotClusterStart(_) })
        ));
    }
}
