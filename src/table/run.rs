use std::collections::BTreeMap;
use std::path::PathBuf;

/// Raw timestamp tokens of one row, e.g. `["+0.000000ns", "+1500000000.000000ns"]`.
pub type Row = Vec<String>;

/// One block of a consolidated data file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Run {
    pub rows: Vec<Row>,
}

impl Run {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Every run recorded for one node count, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeGroup {
    pub size: u32,
    /// Results directory the group was loaded from (used for plot titles).
    pub source: PathBuf,
    pub runs: Vec<Run>,
}

impl SizeGroup {
    /// Number of runs that carry at least one row.
    pub fn usable_runs(&self) -> usize {
        self.runs.iter().filter(|r| !r.is_empty()).count()
    }
}

/// Size groups keyed (and therefore sorted) by node count.
pub type RunTable = BTreeMap<u32, SizeGroup>;
