//! Latency statistics over the runs of one size group.
//!
//! A run's rows are successive rounds of the same experiment; early rounds
//! are noisy (connection setup, slow start), so each run is summarized by the
//! average over its trailing rows only.

use crate::table::{Run, SizeGroup};
use crate::time::Timestamp;
use anyhow::Context;
use serde::Serialize;
use tracing::{debug, warn};

/// Per-run averaged elapsed seconds, one entry per event column.
pub type DataPoint = Vec<f64>;

/// Smallest trailing window used when averaging a run.
pub const MIN_WINDOW: usize = 5;

/// Asymmetric error bar around the mean of the final column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Spread {
    /// `max - mean`
    pub upper: f64,
    /// `mean - min`
    pub lower: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeSummary {
    pub size: u32,
    /// Data points that agree on the column count, in run order.
    pub points: Vec<DataPoint>,
    /// Element-wise mean of `points`.
    pub mean: Vec<f64>,
    /// Spread of the final column.
    pub spread: Spread,
}

/// Trailing window for a run with `row_count` rows.
pub fn window_len(row_count: usize) -> usize {
    MIN_WINDOW.max(row_count / 2)
}

fn secs(token: &str) -> anyhow::Result<f64> {
    Ok(Timestamp::parse_ns(token)
        .with_context(|| format!("bad timestamp {:?}", token))?
        .as_secs())
}

/// Average elapsed time per column over the trailing rows of `run`.
///
/// Each row is measured against its own first field. The column count comes
/// from the first row; extra fields in later rows are ignored and missing
/// ones contribute nothing. Sums are always divided by the full window, so a
/// run shorter than [`MIN_WINDOW`] is scaled down. Returns `None` for a run
/// without rows.
pub fn data_point(run: &Run) -> anyhow::Result<Option<DataPoint>> {
    let Some(first) = run.rows.first() else {
        return Ok(None);
    };
    let columns = first.len().saturating_sub(1);
    let n = run.rows.len();
    let window = window_len(n);
    let used = window.min(n);

    let mut sums = vec![0.0f64; columns];
    let mut extra_fields = 0usize;
    for row in &run.rows[n - used..] {
        let Some((head, tail)) = row.split_first() else {
            continue;
        };
        let start = secs(head)?;
        for (i, token) in tail.iter().enumerate() {
            match sums.get_mut(i) {
                Some(sum) => *sum += secs(token)? - start,
                None => extra_fields += 1,
            }
        }
    }
    if extra_fields > 0 {
        warn!(
            "run rows wider than the first row ({} columns), ignored {} extra fields",
            columns, extra_fields
        );
    }

    for sum in &mut sums {
        *sum /= window as f64;
    }
    Ok(Some(sums))
}

/// One data point per non-empty run of the group.
pub fn data_points(group: &SizeGroup) -> anyhow::Result<Vec<DataPoint>> {
    let mut points = Vec::new();
    for (idx, run) in group.runs.iter().enumerate() {
        let point = data_point(run)
            .with_context(|| format!("size {} run {} ({})", group.size, idx, group.source.display()))?;
        if let Some(point) = point {
            debug!(
                "size {} run {}: {} rows, window {}",
                group.size,
                idx,
                run.rows.len(),
                window_len(run.rows.len())
            );
            points.push(point);
        }
    }
    Ok(points)
}

/// Drop data points whose length differs from `expected` (or, when not
/// given, from the first point's length).
pub fn consistent_points(points: Vec<DataPoint>, expected: Option<usize>) -> Vec<DataPoint> {
    let Some(expected) = expected.or_else(|| points.first().map(Vec::len)) else {
        return points;
    };

    let total = points.len();
    let kept: Vec<DataPoint> = points.into_iter().filter(|p| p.len() == expected).collect();
    if kept.len() < total {
        warn!(
            "skipped {} of {} data points without {} columns",
            total - kept.len(),
            total,
            expected
        );
    }
    kept
}

/// Element-wise mean. All points must have the same length.
pub fn mean(points: &[DataPoint]) -> Option<Vec<f64>> {
    let first = points.first()?;
    let mut sums = vec![0.0f64; first.len()];
    for point in points {
        for (sum, v) in sums.iter_mut().zip(point) {
            *sum += v;
        }
    }
    for sum in &mut sums {
        *sum /= points.len() as f64;
    }
    Some(sums)
}

/// Spread of the final column around its mean.
pub fn spread(points: &[DataPoint], mean: &[f64]) -> Option<Spread> {
    let last = mean.len().checked_sub(1)?;
    let avg = mean[last];

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in points.iter().filter_map(|p| p.get(last)) {
        min = min.min(*v);
        max = max.max(*v);
    }
    if !min.is_finite() || !max.is_finite() {
        return None;
    }

    Some(Spread {
        upper: max - avg,
        lower: avg - min,
    })
}

/// Summarize a size group, or `None` when it has no usable data.
pub fn summarize(group: &SizeGroup, expected: Option<usize>) -> anyhow::Result<Option<SizeSummary>> {
    let points = consistent_points(data_points(group)?, expected);
    let Some(mean) = mean(&points) else {
        return Ok(None);
    };
    let Some(spread) = spread(&points, &mean) else {
        return Ok(None);
    };

    Ok(Some(SizeSummary {
        size: group.size,
        points,
        mean,
        spread,
    }))
}

/// Elapsed seconds of every row (last field minus first field).
pub fn run_latencies(run: &Run) -> anyhow::Result<Vec<f64>> {
    let mut out = Vec::with_capacity(run.rows.len());
    for row in &run.rows {
        let (Some(first), Some(last)) = (row.first(), row.last()) else {
            continue;
        };
        out.push(secs(last)? - secs(first)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    /// A run whose rows chain, with the given per-row latencies in seconds.
    fn chained_run(latencies: &[f64]) -> Run {
        let mut t = 0.0;
        let mut rows = Vec::new();
        for lat in latencies {
            let start = Timestamp::from_secs(t).to_string();
            t += lat;
            rows.push(vec![start, Timestamp::from_secs(t).to_string()]);
        }
        Run { rows }
    }

    fn group(size: u32, runs: Vec<Run>) -> SizeGroup {
        SizeGroup {
            size,
            source: PathBuf::from("results"),
            runs,
        }
    }

    #[test]
    fn window_is_at_least_five() {
        assert_eq!(window_len(0), 5);
        assert_eq!(window_len(1), 5);
        assert_eq!(window_len(11), 5);
        assert_eq!(window_len(12), 6);
        assert_eq!(window_len(31), 15);
    }

    #[test]
    fn averages_only_trailing_rows() {
        let mut lat = vec![100.0; 6];
        lat.extend([1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);
        // 12 rows -> window 6 -> only the last six rows count.
        assert_eq!(data_point(&chained_run(&lat)).unwrap(), Some(vec![2.0]));
    }

    #[test]
    fn short_run_sums_every_row_over_full_window() {
        let run = chained_run(&[1.0, 2.0, 3.0]);
        // 3 rows summed, divided by the window of 5.
        assert_eq!(data_point(&run).unwrap(), Some(vec![6.0 / 5.0]));
    }

    #[test]
    fn columns_are_relative_to_row_start() {
        let run = Run {
            rows: vec![
                vec!["+0ns".into(), "+1000000000ns".into(), "+3000000000ns".into()],
                vec!["+3000000000ns".into(), "+5000000000ns".into(), "+6000000000ns".into()],
            ],
        };
        assert_eq!(data_point(&run).unwrap(), Some(vec![3.0 / 5.0, 6.0 / 5.0]));
    }

    #[test]
    fn wider_rows_are_clipped_to_first_row() {
        let run = Run {
            rows: vec![
                vec!["+0ns".into(), "+2000000000ns".into()],
                vec!["+0ns".into(), "+4000000000ns".into(), "+9000000000ns".into()],
            ],
        };
        assert_eq!(data_point(&run).unwrap(), Some(vec![6.0 / 5.0]));
    }

    #[test]
    fn empty_run_has_no_data_point() {
        assert_eq!(data_point(&Run::default()).unwrap(), None);
        let g = group(4, vec![Run::default(), chained_run(&[5.0])]);
        assert_eq!(data_points(&g).unwrap(), vec![vec![1.0]]);
    }

    #[test]
    fn two_round_example_latencies() {
        let run = Run {
            rows: vec![
                vec!["+0.000000ns".into(), "+1500000000.000000ns".into()],
                vec!["+1500000000.000000ns".into(), "+3000000000.000000ns".into()],
            ],
        };
        assert_eq!(run_latencies(&run).unwrap(), vec![1.5, 1.5]);
        assert_eq!(data_point(&run).unwrap(), Some(vec![3.0 / 5.0]));
    }

    #[test]
    fn identical_runs_have_zero_spread() {
        let run = chained_run(&[0.5, 1.5, 1.0, 2.0]);
        let own = data_point(&run).unwrap().unwrap();
        let summary = summarize(&group(8, vec![run.clone(), run]), None)
            .unwrap()
            .unwrap();

        assert_eq!(summary.points, vec![own.clone(), own.clone()]);
        assert_eq!(summary.mean, own);
        assert_eq!(summary.spread, Spread { upper: 0.0, lower: 0.0 });
    }

    #[test]
    fn spread_brackets_final_column() {
        let g = group(
            16,
            vec![
                chained_run(&[1.0; 5]),
                chained_run(&[2.0; 5]),
                chained_run(&[6.0; 5]),
            ],
        );
        let summary = summarize(&g, None).unwrap().unwrap();
        assert_eq!(summary.mean, vec![3.0]);
        assert_eq!(summary.spread, Spread { upper: 3.0, lower: 2.0 });
    }

    #[test]
    fn mismatched_points_are_skipped() {
        let points = vec![vec![1.0, 2.0], vec![3.0], vec![5.0, 6.0]];
        assert_eq!(
            consistent_points(points.clone(), None),
            vec![vec![1.0, 2.0], vec![5.0, 6.0]]
        );
        assert_eq!(consistent_points(points, Some(1)), vec![vec![3.0]]);
    }

    #[test]
    fn group_without_rows_is_absent() {
        let g = group(32, vec![Run::default(), Run::default()]);
        assert_eq!(summarize(&g, None).unwrap(), None);
        assert_eq!(summarize(&group(32, vec![]), None).unwrap(), None);
        assert_eq!(summarize(&group(4, vec![chained_run(&[1.0])]), Some(3)).unwrap(), None);
    }

    #[test]
    fn malformed_token_fails() {
        let run = Run {
            rows: vec![vec!["+0ns".into(), "+soonns".into()]],
        };
        assert!(data_point(&run).is_err());
        assert!(run_latencies(&run).is_err());
    }
}
