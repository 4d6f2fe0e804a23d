//! Turn raw simulator logs into consolidated per-size data files.
//!
//! Layout: `<experiment>/<size>/<run_index>` are raw logs written by the
//! launcher; `<experiment>/<size>/data` is the consolidated file read by the
//! analyzer.

pub mod chain;
pub mod scan;

pub use chain::ChainWriter;
pub use scan::scan_log;

use anyhow::Context;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name of the consolidated data file inside a size directory.
pub const DATA_FILE: &str = "data";

/// Result of consolidating one size directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consolidated {
    pub dir: PathBuf,
    pub files: usize,
    pub rows: usize,
}

/// Raw log files of a size directory in execution order: numeric run indices
/// ascending, then anything else by name. Names containing `data` are skipped.
pub fn raw_logs(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut logs: Vec<(Option<u64>, String, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let entry = entry.with_context(|| format!("read entry in {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.contains(DATA_FILE) {
            continue;
        }
        logs.push((name.parse().ok(), name, path));
    }

    logs.sort_by(|a, b| match (a.0, b.0) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.1.cmp(&b.1),
    });

    Ok(logs.into_iter().map(|(_, _, p)| p).collect())
}

/// Rebuild `<dir>/data` from every raw log in `dir`, one block per log.
pub fn consolidate_size_dir(dir: &Path) -> anyhow::Result<Consolidated> {
    let logs = raw_logs(dir)?;
    let out_path = dir.join(DATA_FILE);
    let out = File::create(&out_path).with_context(|| format!("create {}", out_path.display()))?;
    let mut out = BufWriter::new(out);

    let mut rows = 0;
    for log in &logs {
        let origin = log.display().to_string();
        let file = File::open(log).with_context(|| format!("open {}", origin))?;

        let mut writer = ChainWriter::new(&mut out);
        let stats = scan_log(BufReader::new(file), &origin, &mut writer)?;
        let written = writer
            .finish()
            .with_context(|| format!("write {}", out_path.display()))?;
        debug!(
            "{}: {} lines, {} starts, {} completions, {} rows",
            origin, stats.lines, stats.starts, stats.completions, written
        );
        rows += written;
    }

    info!(
        "{}: consolidated {} logs into {} rows",
        dir.display(),
        logs.len(),
        rows
    );
    Ok(Consolidated {
        dir: dir.to_path_buf(),
        files: logs.len(),
        rows,
    })
}

/// Consolidate every size directory below an experiment root.
pub fn consolidate_experiment(root: &Path) -> anyhow::Result<Vec<Consolidated>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(root).with_context(|| format!("read dir {}", root.display()))? {
        let entry = entry.with_context(|| format!("read entry in {}", root.display()))?;
        if entry.path().is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();

    dirs.iter().map(|d| consolidate_size_dir(d)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::parse_runs;
    use pretty_assertions::assert_eq;

    fn write(dir: &Path, name: &str, text: &str) {
        fs::write(dir.join(name), text).unwrap();
    }

    #[test]
    fn orders_logs_by_run_index() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["10", "2", "0", "notes", "data"] {
            write(tmp.path(), name, "");
        }
        fs::create_dir(tmp.path().join("sub")).unwrap();

        let names: Vec<String> = raw_logs(tmp.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["0", "2", "10", "notes"]);
    }

    #[test]
    fn one_block_per_log_file() {
        let tmp = tempfile::tempdir().unwrap();
        let size_dir = tmp.path().join("4");
        fs::create_dir(&size_dir).unwrap();
        write(
            &size_dir,
            "0",
            "+0.0s RUN: 0\n+1.5s RUN: 1\n+3.0s LOG TIMESTAMP: all nodes are done\n",
        );
        write(&size_dir, "1", "+0.0s RUN: 0\n+2.0s LOG TIMESTAMP: all nodes are done\n");
        write(&size_dir, "2", "waf: build failed\n");

        let result = consolidate_experiment(tmp.path()).unwrap();
        assert_eq!(
            result,
            vec![Consolidated {
                dir: size_dir.clone(),
                files: 3,
                rows: 3
            }]
        );

        let text = fs::read_to_string(size_dir.join(DATA_FILE)).unwrap();
        let runs = parse_runs(text.as_bytes(), "data").unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(
            runs[0].rows,
            vec![
                vec!["+0.000000ns", "+1500000000.000000ns"],
                vec!["+1500000000.000000ns", "+3000000000.000000ns"],
            ]
        );
        assert_eq!(runs[1].rows, vec![vec!["+0.000000ns", "+2000000000.000000ns"]]);
    }

    #[test]
    fn extract_then_parse_reproduces_marker_sequence() {
        let marks = [0.0, 0.25, 0.5, 1.0, 1.75, 2.0];
        let mut log = String::new();
        for (i, t) in marks[..marks.len() - 1].iter().enumerate() {
            log.push_str(&format!("+{}s RUN: {}\n", t, i));
            log.push_str(&format!("+{}s node 0 sent 1 bytes\n", t));
        }
        log.push_str(&format!("+{}s all nodes are done\n", marks[marks.len() - 1]));

        let mut buf = Vec::new();
        let mut writer = ChainWriter::new(&mut buf);
        scan_log(log.as_bytes(), "synthetic", &mut writer).unwrap();
        writer.finish().unwrap();

        let runs = parse_runs(buf.as_slice(), "synthetic").unwrap();
        assert_eq!(runs.len(), 1);

        // Undo the chaining: first field of each row, then the last row's end.
        let rows = &runs[0].rows;
        let mut tokens: Vec<String> = rows.iter().map(|r| r[0].clone()).collect();
        tokens.push(rows[rows.len() - 1][1].clone());
        let expected: Vec<String> = marks
            .iter()
            .map(|s| crate::time::Timestamp::from_secs(*s).to_string())
            .collect();
        assert_eq!(tokens, expected);

        for pair in rows.windows(2) {
            assert_eq!(pair[0][1], pair[1][0]);
        }
    }
}
