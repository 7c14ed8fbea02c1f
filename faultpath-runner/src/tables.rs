//! CSV-backed stress and distance sources.
//!
//! Stress tables hold one row per (source, receiver) section pair:
//!
//! ```csv
//! source,target,value
//! 30,40,0.12
//! ```
//!
//! Distance tables hold one row per unordered section pair:
//!
//! ```csv
//! a,b,distance
//! 31,40,1.2
//! ```

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use faultpath_core::error::SourceError;
use faultpath_core::model::Section;
use faultpath_core::sources::{DistanceSource, StressSource};

use crate::loader::LoadError;

// ─── Stress ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct StressRow {
    source: u32,
    target: u32,
    value: f64,
}

/// Pairwise stress table. The aggregate for a set of sources on a set of
/// receivers is the sum over every pair; absent pairs contribute zero.
#[derive(Debug, Clone)]
pub struct StressTable {
    name: String,
    units: Option<String>,
    values: HashMap<(u32, u32), f64>,
}

impl StressTable {
    pub fn from_reader<R: Read>(
        name: impl Into<String>,
        units: Option<String>,
        reader: R,
    ) -> Result<Self, LoadError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut values = HashMap::new();
        for row in rdr.deserialize() {
            let row: StressRow = row?;
            *values.entry((row.source, row.target)).or_insert(0.0) += row.value;
        }
        let name = name.into();
        tracing::debug!(table = %name, pairs = values.len(), "loaded stress table");
        Ok(Self { name, units, values })
    }

    pub fn from_path(
        name: impl Into<String>,
        units: Option<String>,
        path: &Path,
    ) -> Result<Self, LoadError> {
        let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(name, units, file)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl StressSource for StressTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn units(&self) -> Option<&str> {
        self.units.as_deref()
    }

    fn calc(&self, sources: &[Section], receivers: &[Section]) -> Result<f64, SourceError> {
        let mut total = 0.0;
        for receiver in receivers {
            for source in sources {
                if let Some(v) = self.values.get(&(source.id.0, receiver.id.0)) {
                    total += v;
                }
            }
        }
        Ok(total)
    }
}

// ─── Distance ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct DistanceRow {
    a: u32,
    b: u32,
    distance: f64,
}

/// Symmetric section-to-section distances. Unlisted pairs are infinitely far
/// apart, except a section from itself.
#[derive(Debug, Clone)]
pub struct DistanceTable {
    distances: HashMap<(u32, u32), f64>,
}

fn ordered(a: u32, b: u32) -> (u32, u32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl DistanceTable {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut distances = HashMap::new();
        for row in rdr.deserialize() {
            let row: DistanceRow = row?;
            distances.insert(ordered(row.a, row.b), row.distance);
        }
        tracing::debug!(pairs = distances.len(), "loaded distance table");
        Ok(Self { distances })
    }

    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }
}

impl DistanceSource for DistanceTable {
    fn name(&self) -> &str {
        "distance table"
    }

    fn distance(&self, a: &Section, b: &Section) -> Result<f64, SourceError> {
        if a.id == b.id {
            return Ok(0.0);
        }
        Ok(self
            .distances
            .get(&ordered(a.id.0, b.id.0))
            .copied()
            .unwrap_or(f64::INFINITY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sect(id: u32) -> Section {
        Section::new(id, id / 10)
    }

    #[test]
    fn stress_sums_all_pairs() {
        let csv = "source,target,value\n10,20,1.5\n11,20,-0.5\n10,21,2.0\n";
        let table = StressTable::from_reader("CFF", Some("MPa".into()), csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.units(), Some("MPa"));

        let value = table.calc(&[sect(10), sect(11)], &[sect(20), sect(21)]).unwrap();
        assert!((value - 3.0).abs() < 1e-12);
        // direction matters
        assert_eq!(table.calc(&[sect(20)], &[sect(10)]).unwrap(), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let csv = "a,b,distance\n1,2,3.5\n";
        let table = DistanceTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.distance(&sect(1), &sect(2)).unwrap(), 3.5);
        assert_eq!(table.distance(&sect(2), &sect(1)).unwrap(), 3.5);
        assert_eq!(table.distance(&sect(1), &sect(1)).unwrap(), 0.0);
        assert!(table.distance(&sect(1), &sect(9)).unwrap().is_infinite());
    }

    #[test]
    fn malformed_rows_are_errors() {
        let csv = "source,target,value\n10,20,abc\n";
        assert!(matches!(
            StressTable::from_reader("bad", None, csv.as_bytes()),
            Err(LoadError::Csv(_))
        ));
    }
}
