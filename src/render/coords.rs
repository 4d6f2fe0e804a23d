//! pgfplots `coordinates{...}` snippets.

use crate::stats::SizeSummary;

/// `coordinates{(0,a)(1,b)...};` followed by a newline.
pub fn indexed_series(values: &[f64]) -> String {
    let mut out = String::from("coordinates{");
    for (i, v) in values.iter().enumerate() {
        out.push_str(&format!("({},{})", i, v));
    }
    out.push_str("};\n");
    out
}

/// Final-column means with asymmetric error bars:
/// `coordinates{(4,1.5) += (0, 0.5) -= (0, 0.25)...}`.
pub fn final_column_with_errors(summaries: &[&SizeSummary]) -> String {
    let mut out = String::from("coordinates{");
    for s in summaries {
        let Some(y) = s.mean.last() else {
            continue;
        };
        out.push_str(&format!(
            "({},{}) += (0, {}) -= (0, {})",
            s.size, y, s.spread.upper, s.spread.lower
        ));
    }
    out.push('}');
    out
}
