//! Plotting on top of the [`Canvas`] capability, and the HTML report.

pub mod canvas;
pub mod coords;
pub mod html;

pub use canvas::{Canvas, CoordinateExport, ErrorBar, Figure, FigureSet};
pub use html::render_html_report;

use crate::Result;
use crate::config::AnalyzeConfig;
use crate::stats::{self, SizeSummary};
use crate::table::{RunTable, SizeGroup};
use anyhow::Context;
use serde::Serialize;
use tracing::{info, warn};

const LATENCY_LABEL: &str = "latency (s)";

/// One line of the per-size summary table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeRow {
    pub size: u32,
    pub source: String,
    pub runs: usize,
    pub usable_runs: usize,
    pub data_points: usize,
    /// None when the size has no usable data.
    pub final_mean: Option<f64>,
    pub upper: Option<f64>,
    pub lower: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportData {
    pub title: String,
    pub sizes: Vec<SizeRow>,
    pub figures: Vec<Figure>,
    pub exports: Vec<CoordinateExport>,
}

/// Latency of every round, one line per run. Returns false (and draws
/// nothing) for a group without usable runs.
pub fn plot_distribution<C: Canvas>(canvas: &mut C, group: &SizeGroup, latex: bool) -> Result<bool> {
    if group.usable_runs() == 0 {
        warn!("size {}: no runs with data, no distribution plot", group.size);
        return Ok(false);
    }

    canvas.new_figure(
        &format!("{}/{}", group.source.display(), group.size),
        "number of runs",
        LATENCY_LABEL,
    );

    let mut coordinates = String::new();
    for (idx, run) in group.runs.iter().enumerate() {
        if run.is_empty() {
            continue;
        }
        let latencies = stats::run_latencies(run)
            .with_context(|| format!("size {} run {}", group.size, idx))?;
        let points: Vec<(f64, f64)> = latencies
            .iter()
            .enumerate()
            .map(|(i, v)| (i as f64, *v))
            .collect();
        canvas.plot_series(&format!("run {}", idx), &points);

        if latex {
            coordinates.push_str(&coords::indexed_series(&latencies));
        }
    }

    if latex {
        canvas.export_coordinates(&group.size.to_string(), &coordinates);
    }
    Ok(true)
}

/// Data points scattered against their size, one mean line per column, and
/// error bars on the final column. Sizes without a summary do not appear.
pub fn plot_average<C: Canvas>(canvas: &mut C, summaries: &[SizeSummary], title: &str, latex: bool) {
    if summaries.is_empty() {
        warn!("no size has usable data, no average plot");
        return;
    }

    let mut ordered: Vec<&SizeSummary> = summaries.iter().collect();
    ordered.sort_by_key(|s| s.size);

    canvas.new_figure(title, "number of nodes", LATENCY_LABEL);

    let scattered: Vec<(f64, f64)> = ordered
        .iter()
        .flat_map(|s| {
            let x = f64::from(s.size);
            s.points.iter().flatten().map(move |v| (x, *v))
        })
        .collect();
    canvas.scatter_points("runs", &scattered);

    let columns = ordered.iter().map(|s| s.mean.len()).max().unwrap_or(0);
    for col in 0..columns {
        let line: Vec<(f64, f64)> = ordered
            .iter()
            .filter_map(|s| s.mean.get(col).map(|y| (f64::from(s.size), *y)))
            .collect();
        canvas.plot_series(&format!("mean, event {}", col + 1), &line);
    }

    let bars: Vec<ErrorBar> = ordered
        .iter()
        .filter_map(|s| {
            s.mean.last().map(|y| ErrorBar {
                x: f64::from(s.size),
                y: *y,
                upper: s.spread.upper,
                lower: s.spread.lower,
            })
        })
        .collect();
    canvas.annotate_error_bars(&bars);

    if latex {
        canvas.export_coordinates("average", &coords::final_column_with_errors(&ordered));
    }
}

/// Summarize every size and draw the requested figures.
pub fn build_report(cfg: &AnalyzeConfig, table: &RunTable) -> Result<ReportData> {
    let mut canvas = FigureSet::new();

    if cfg.plot_dist {
        for group in table.values() {
            plot_distribution(&mut canvas, group, cfg.latex)?;
        }
    }

    let mut rows = Vec::new();
    let mut summaries = Vec::new();
    for group in table.values() {
        let summary = stats::summarize(group, cfg.columns)?;
        rows.push(SizeRow {
            size: group.size,
            source: group.source.display().to_string(),
            runs: group.runs.len(),
            usable_runs: group.usable_runs(),
            data_points: summary.as_ref().map(|s| s.points.len()).unwrap_or(0),
            final_mean: summary.as_ref().and_then(|s| s.mean.last().copied()),
            upper: summary.as_ref().map(|s| s.spread.upper),
            lower: summary.as_ref().map(|s| s.spread.lower),
        });
        match summary {
            Some(s) => summaries.push(s),
            None => warn!("size {}: no data, skipped", group.size),
        }
    }

    if cfg.plot_avg {
        plot_average(&mut canvas, &summaries, &cfg.title(), cfg.latex);
    }

    info!(
        "{} sizes, {} with data, {} figures",
        rows.len(),
        summaries.len(),
        canvas.figures.len()
    );
    Ok(ReportData {
        title: cfg.title(),
        sizes: rows,
        figures: canvas.figures,
        exports: canvas.exports,
    })
}
