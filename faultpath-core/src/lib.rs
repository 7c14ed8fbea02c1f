//! FaultPath Core: path-based plausibility filtering for multi-fault ruptures.
//!
//! This crate contains the engine:
//! - Rupture graph model (sections, clusters, jumps, ruptures) and tree navigation
//! - Path navigators that grow a rupture outward from a nucleation cluster
//! - Nucleation evaluators (Coulomb stress, cumulative jump probability)
//! - Path plausibility filters with skip-cache support
//! - Serializable filter configuration and the factory that builds filters from it

pub mod config;
pub mod error;
pub mod evaluator;
pub mod factory;
pub mod filter;
pub mod model;
pub mod path;
pub mod prob;
pub mod range;
pub mod result;
pub mod sources;

pub use error::{ConfigError, EvalError, GraphError, SourceError};
pub use filter::{FilterId, PathPlausibilityFilter, ScalarPathPlausibilityFilter, SkipCache};
pub use model::{Cluster, Jump, Rupture, Section, SectionId};
pub use range::AcceptableRange;
pub use result::PlausibilityResult;
