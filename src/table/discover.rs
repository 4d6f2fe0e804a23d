use crate::extract::DATA_FILE;
use crate::table::parse::parse_data_file;
use crate::table::run::RunTable;
use anyhow::Context;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Find the size directories below each results directory.
///
/// Each integer-named sub-directory is a size. When several results
/// directories contain the same size, the one listed last wins.
pub fn discover_sizes(results: &[PathBuf]) -> anyhow::Result<BTreeMap<u32, PathBuf>> {
    let mut sizes: BTreeMap<u32, PathBuf> = BTreeMap::new();

    for dir in results {
        let entries =
            fs::read_dir(dir).with_context(|| format!("read results dir {}", dir.display()))?;
        for entry in entries {
            let entry = entry.with_context(|| format!("read entry in {}", dir.display()))?;
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let Ok(size) = name.parse::<u32>() else {
                warn!(
                    "{}: skipping directory {:?}, not a node count",
                    dir.display(),
                    name
                );
                continue;
            };
            if let Some(prev) = sizes.insert(size, dir.clone()) {
                debug!(
                    "size {} found in {} and {}, using the latter",
                    size,
                    prev.display(),
                    dir.display()
                );
            }
        }
    }

    Ok(sizes)
}

/// Discover sizes and parse each `<results>/<size>/data` file.
pub fn load_run_table(results: &[PathBuf]) -> anyhow::Result<RunTable> {
    let mut table = RunTable::new();
    for (size, source) in discover_sizes(results)? {
        let path = source.join(size.to_string()).join(DATA_FILE);
        let group = parse_data_file(&path, size, &source)?;
        debug!(
            "size {}: {} runs ({} usable) from {}",
            size,
            group.runs.len(),
            group.usable_runs(),
            path.display()
        );
        table.insert(size, group);
    }
    Ok(table)
}
