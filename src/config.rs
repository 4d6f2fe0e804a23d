//! Analyzer settings, fixed once the command line is parsed.

use anyhow::bail;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzeConfig {
    /// Experiment directories holding `<size>/data` files.
    pub results: Vec<PathBuf>,
    /// Where the HTML report is written.
    pub output: PathBuf,
    /// One latency-per-round figure for every size.
    pub plot_dist: bool,
    /// One figure of mean latency against size.
    pub plot_avg: bool,
    /// Also emit pgfplots coordinate lists.
    pub latex: bool,
    /// Expected number of event columns per data point. Defaults to the
    /// column count of each size's first data point.
    pub columns: Option<usize>,
}

impl AnalyzeConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.results.is_empty() {
            bail!("at least one results directory is required");
        }
        if !self.plot_dist && !self.plot_avg {
            bail!("nothing to plot: pass --plot-dist and/or --plot-avg");
        }
        if self.columns == Some(0) {
            bail!("--columns must be at least 1");
        }
        Ok(())
    }

    /// Title of the average figure: the results directories.
    pub fn title(&self) -> String {
        self.results
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
