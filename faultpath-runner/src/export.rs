//! Verdict export: JSON reports and CSV tables.
//!
//! JSON reports carry a `schema_version`; unknown versions are rejected on
//! load.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::batch::{BatchSummary, NucleationValues, RuptureVerdict};
use crate::config::Fingerprint;

pub const SCHEMA_VERSION: u32 = 1;

/// Everything one `evaluate` run produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerdictReport {
    pub schema_version: u32,
    pub fingerprint: Fingerprint,
    pub filter: String,
    pub summary: BatchSummary,
    pub verdicts: Vec<RuptureVerdict>,
}

impl VerdictReport {
    pub fn new(fingerprint: Fingerprint, filter: impl Into<String>, verdicts: Vec<RuptureVerdict>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            fingerprint,
            filter: filter.into(),
            summary: BatchSummary::from_verdicts(&verdicts),
            verdicts,
        }
    }
}

// ─── JSON ───────────────────────────────────────────────────────────

pub fn export_json(report: &VerdictReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize verdict report")
}

pub fn import_json(json: &str) -> Result<VerdictReport> {
    let report: VerdictReport =
        serde_json::from_str(json).context("failed to deserialize verdict report")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Columns: index, result, value, sections, clusters. `value` is empty when
/// the filter has none for that rupture.
pub fn export_verdicts_csv(verdicts: &[RuptureVerdict]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["index", "result", "value", "sections", "clusters"])?;
    for v in verdicts {
        wtr.write_record([
            v.index.to_string(),
            v.result.to_string(),
            v.value.map(|x| x.to_string()).unwrap_or_default(),
            v.sections.to_string(),
            v.clusters.to_string(),
        ])?;
    }
    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

/// One row per (rupture, nucleation value).
pub fn export_values_csv(values: &[NucleationValues]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["index", "nucleation", "value"])?;
    for rupture in values {
        for (i, value) in rupture.values.iter().enumerate() {
            wtr.write_record([rupture.index.to_string(), i.to_string(), value.to_string()])?;
        }
    }
    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use faultpath_core::PlausibilityResult;

    fn verdicts() -> Vec<RuptureVerdict> {
        vec![
            RuptureVerdict {
                index: 0,
                result: PlausibilityResult::Pass,
                value: None,
                sections: 2,
                clusters: 1,
            },
            RuptureVerdict {
                index: 1,
                result: PlausibilityResult::FailHardStop,
                value: Some(-0.25),
                sections: 4,
                clusters: 2,
            },
        ]
    }

    #[test]
    fn json_round_trip() {
        let report = VerdictReport::new("abc".into(), "Path Cluster [CFF] ≥0", verdicts());
        assert_eq!(report.summary.passed, 1);
        let json = export_json(&report).unwrap();
        assert!(json.contains("FAIL_HARD_STOP"));
        assert_eq!(import_json(&json).unwrap(), report);
    }

    #[test]
    fn rejects_newer_schema() {
        let mut report = VerdictReport::new("abc".into(), "f", verdicts());
        report.schema_version = SCHEMA_VERSION + 1;
        let json = export_json(&report).unwrap();
        assert!(import_json(&json).is_err());
    }

    #[test]
    fn verdict_csv_has_blank_missing_values() {
        let csv = export_verdicts_csv(&verdicts()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "index,result,value,sections,clusters");
        assert_eq!(lines[1], "0,PASS,,2,1");
        assert_eq!(lines[2], "1,FAIL_HARD_STOP,-0.25,4,2");
    }

    #[test]
    fn values_csv_flattens() {
        let values = vec![
            NucleationValues { index: 3, values: vec![1.0, -2.5] },
            NucleationValues { index: 4, values: vec![] },
        ];
        let csv = export_values_csv(&values).unwrap();
        assert_eq!(csv, "index,nucleation,value\n3,0,1\n3,1,-2.5\n");
    }
}
