//! FaultPath Runner: batch evaluation on top of `faultpath-core`.
//!
//! This crate provides:
//! - JSON rupture documents with parent links between extended ruptures
//! - CSV-backed stress and distance sources
//! - TOML run configuration with content fingerprints
//! - Parallel batch evaluation with per-chain skip caches
//! - JSON and CSV export of verdicts

pub mod batch;
pub mod config;
pub mod export;
pub mod loader;
pub mod tables;

pub use batch::{evaluate_batch, nucleation_values, BatchSummary, NucleationValues, RuptureVerdict};
pub use config::{Fingerprint, RunConfig, StressTableConfig};
pub use export::{export_json, export_values_csv, export_verdicts_csv, import_json, VerdictReport};
pub use loader::{LoadError, RuptureSet, RuptureSetDoc};
pub use tables::{DistanceTable, StressTable};

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<RuptureSet>();
        require_sync::<RuptureSet>();
        require_send::<StressTable>();
        require_sync::<StressTable>();
        require_send::<DistanceTable>();
        require_sync::<DistanceTable>();
        require_send::<RuptureVerdict>();
        require_send::<LoadError>();
        require_sync::<LoadError>();
    }
}
