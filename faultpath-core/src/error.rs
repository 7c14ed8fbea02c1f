//! Error types for the engine.
//!
//! - `GraphError`: a rupture graph operation was given inconsistent input
//! - `ConfigError`: an evaluator or filter was constructed with invalid settings
//! - `EvalError`: an evaluation aborted (source failure or internal inconsistency)

use crate::model::{ParentId, SectionId};

/// Boxed error returned by external stress, distance and probability sources.
pub type SourceError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    #[error("Cluster must contain at least one section")]
    EmptyCluster,
    #[error("Section {section} does not belong to parent {expected}")]
    MixedParents { section: SectionId, expected: ParentId },
    #[error("Section {0} appears more than once")]
    DuplicateSection(SectionId),
    #[error("Start section {0} is not part of the cluster")]
    StartNotInCluster(SectionId),
    #[error("Jump departs from section {0}, which is not in the rupture")]
    UnknownFromSection(SectionId),
    #[error("Jump target {0} must be the start section of the destination cluster")]
    NotClusterStart(SectionId),
    #[error("Jump from section {0} does not match the cluster that holds it")]
    ClusterMismatch(SectionId),
    #[error("Only single-strand ruptures can be reversed")]
    NotSingleStrand,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Must supply at least one path evaluator")]
    EmptyEvaluators,
    #[error("Pass threshold must be in [0, 1], got {0}")]
    BadThreshold(f32),
    #[error("Failure type cannot be PASS")]
    PassFailureType,
    #[error("Favorable jump search distance must be positive, got {0}")]
    BadSearchDistance(f64),
    #[error("Favorable jump search requires a distance source")]
    MissingDistanceSource,
    #[error("Must supply at least one probability calculator")]
    NoProbabilityCalcs,
    #[error("Minimum probability must be in [0, 1], got {0}")]
    BadProbability(f64),
    #[error("Unknown stress source: {0}")]
    UnknownStressSource(String),
    #[error("Invalid value for {name}: {value}")]
    BadParameter { name: &'static str, value: f64 },
}

#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    /// A stress, distance or probability source failed. The error is wrapped
    /// once with the source's name and kept intact as the `#[source]`; it is
    /// never retried.
    #[error("{name} failed")]
    Source {
        name: String,
        #[source]
        source: SourceError,
    },
    #[error("Processed {visited} sections but rupture has {total}: {rupture}")]
    IncompleteTraversal {
        visited: usize,
        total: usize,
        rupture: String,
    },
    #[error("Re-rooted rupture at {nucleation} has {actual} sections, expected {expected}")]
    IncompleteReroot {
        nucleation: String,
        expected: usize,
        actual: usize,
    },
    #[error("{name} returned probability {value}, outside [0, 1]")]
    BadProbability { name: String, value: f64 },
    #[error("Cluster {0} is not part of the rupture")]
    UnknownCluster(String),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl EvalError {
    pub(crate) fn from_source(name: &str, source: SourceError) -> Self {
        EvalError::Source {
            name: name.to_string(),
            source,
        }
    }
}
