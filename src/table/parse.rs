use crate::table::run::{Row, Run, SizeGroup};
use anyhow::Context;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::warn;

/// Block header written by the extractor and by the simulator itself.
const BLOCK_MARKER: &str = "RUN";
/// Block header used by older result files.
const LEGACY_BLOCK_MARKER: &str = "new";

fn is_block_marker(line: &str) -> bool {
    line.contains(BLOCK_MARKER) || line.contains(LEGACY_BLOCK_MARKER)
}

/// Split a data line into trimmed fields. Returns `None` for lines that carry
/// fewer than two fields.
fn split_row(line: &str) -> Option<Row> {
    let body = line.trim().trim_matches(',').trim();
    if body.is_empty() {
        return None;
    }
    let fields: Row = body.split(',').map(|f| f.trim().to_string()).collect();
    (fields.len() > 1).then_some(fields)
}

/// Parse a consolidated data file into its runs.
///
/// Format:
/// ```text
///
/// RUN:
/// +0.000000ns,+1500000000.000000ns
/// +1500000000.000000ns,+3000000000.000000ns
/// ```
///
/// Every line containing `RUN` (or the legacy `new`) starts a run. Blank and
/// single-field lines are skipped. Rows that show up before the first block
/// header belong to no run; they are reported and dropped.
pub fn parse_runs<R: BufRead>(reader: R, origin: &str) -> anyhow::Result<Vec<Run>> {
    let mut runs: Vec<Run> = Vec::new();

    for (lineno, line) in reader.lines().enumerate() {
        let lno = lineno + 1;
        let line = line.with_context(|| format!("read {}:{}", origin, lno))?;

        if is_block_marker(&line) {
            runs.push(Run::default());
            continue;
        }

        let Some(row) = split_row(&line) else {
            continue;
        };

        match runs.last_mut() {
            Some(run) => run.rows.push(row),
            None => warn!(
                "{}:{}: row before any block header, skipped: {:?}",
                origin, lno, line
            ),
        }
    }

    Ok(runs)
}

/// Read `path` as the data file of the `size` group found under `source`.
pub fn parse_data_file(path: &Path, size: u32, source: &Path) -> anyhow::Result<SizeGroup> {
    let origin = path.display().to_string();
    let file = File::open(path).with_context(|| format!("open data file {}", origin))?;
    let runs = parse_runs(BufReader::new(file), &origin)?;

    Ok(SizeGroup {
        size,
        source: source.to_path_buf(),
        runs,
    })
}
