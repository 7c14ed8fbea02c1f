//! TOML run configuration: which filter to build and where its sources live.
//!
//! ```toml
//! distance = "distances.csv"
//!
//! [filter]
//! fract_pass_threshold = 0.5
//!
//! [[filter.evaluators]]
//! type = "CLUSTER_COULOMB"
//! source = "cff"
//! range = { type = "AT_LEAST", value = 0.0 }
//!
//! [[stress]]
//! name = "cff"
//! path = "cff.csv"
//! units = "MPa"
//! ```
//!
//! Relative table paths resolve against the directory holding the config.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use faultpath_core::config::FilterConfig;
use faultpath_core::factory::{create_filter, BuiltFilter, SourceRegistry};

use crate::loader::{read_file, LoadError};
use crate::tables::{DistanceTable, StressTable};

/// Content hash of a run configuration.
pub type Fingerprint = String;

/// A stress table registered under the name evaluators refer to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StressTableConfig {
    pub name: String,
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    /// Distance table for favorable-jump evaluators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<PathBuf>,

    pub filter: FilterConfig,

    #[serde(default)]
    pub stress: Vec<StressTableConfig>,
}

impl RunConfig {
    pub fn from_toml(text: &str) -> Result<Self, LoadError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        Self::from_toml(&read_file(path)?)
    }

    /// Deterministic hash of this configuration, so verdict files can be
    /// matched to the run that produced them.
    pub fn fingerprint(&self) -> Result<Fingerprint, LoadError> {
        let json = serde_json::to_string(self)?;
        let hash = blake3::hash(json.as_bytes());
        Ok(format!("{}", hash.to_hex()))
    }

    /// Loads every table this config names.
    pub fn build_sources(&self, base_dir: &Path) -> Result<SourceRegistry, LoadError> {
        let mut registry = SourceRegistry::new();
        for table in &self.stress {
            let path = resolve(base_dir, &table.path);
            let loaded = StressTable::from_path(table.name.clone(), table.units.clone(), &path)?;
            registry = registry.with_stress(table.name.clone(), Arc::new(loaded));
        }
        if let Some(path) = &self.distance {
            let loaded = DistanceTable::from_path(&resolve(base_dir, path))?;
            registry = registry.with_distance(Arc::new(loaded));
        }
        Ok(registry)
    }

    /// Loads the sources and builds the configured filter.
    pub fn build_filter(&self, base_dir: &Path) -> anyhow::Result<BuiltFilter> {
        let sources = self.build_sources(base_dir)?;
        let filter = create_filter(&self.filter, &sources)?;
        tracing::info!(filter = filter.name(), id = %filter.id(), "built filter");
        Ok(filter)
    }
}

fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
