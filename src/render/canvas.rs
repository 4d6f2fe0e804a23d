use serde::Serialize;

/// One (x, y) pair as drawn.
pub type Point = (f64, f64);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ErrorBar {
    pub x: f64,
    pub y: f64,
    pub upper: f64,
    pub lower: f64,
}

/// Drawing operations the plotting code needs. Implementations decide how
/// (or whether) things end up on screen.
pub trait Canvas {
    /// Start a new figure; later calls draw into it.
    fn new_figure(&mut self, title: &str, x_label: &str, y_label: &str);

    /// A connected line with markers.
    fn plot_series(&mut self, label: &str, points: &[Point]);

    /// Unconnected markers.
    fn scatter_points(&mut self, label: &str, points: &[Point]);

    fn annotate_error_bars(&mut self, bars: &[ErrorBar]);

    /// Plain-text coordinates for external typesetting (pgfplots).
    fn export_coordinates(&mut self, heading: &str, text: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    Line,
    Scatter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub label: String,
    pub kind: SeriesKind,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub number: usize,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
    pub error_bars: Vec<ErrorBar>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinateExport {
    pub heading: String,
    pub text: String,
}

/// Canvas that records figures so they can be serialized into a report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FigureSet {
    pub figures: Vec<Figure>,
    pub exports: Vec<CoordinateExport>,
}

impl FigureSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn current(&mut self) -> &mut Figure {
        if self.figures.is_empty() {
            self.new_figure("", "", "");
        }
        let last = self.figures.len() - 1;
        &mut self.figures[last]
    }
}

impl Canvas for FigureSet {
    fn new_figure(&mut self, title: &str, x_label: &str, y_label: &str) {
        let number = self.figures.len();
        self.figures.push(Figure {
            number,
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            series: Vec::new(),
            error_bars: Vec::new(),
        });
    }

    fn plot_series(&mut self, label: &str, points: &[Point]) {
        self.current().series.push(Series {
            label: label.to_string(),
            kind: SeriesKind::Line,
            points: points.to_vec(),
        });
    }

    fn scatter_points(&mut self, label: &str, points: &[Point]) {
        self.current().series.push(Series {
            label: label.to_string(),
            kind: SeriesKind::Scatter,
            points: points.to_vec(),
        });
    }

    fn annotate_error_bars(&mut self, bars: &[ErrorBar]) {
        self.current().error_bars.extend_from_slice(bars);
    }

    fn export_coordinates(&mut self, heading: &str, text: &str) {
        self.exports.push(CoordinateExport {
            heading: heading.to_string(),
            text: text.to_string(),
        });
    }
}
