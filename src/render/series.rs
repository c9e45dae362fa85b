use crate::data::parser::latex_to_unicode;
use crate::state::session::Session;

/// Per-dataset line colors, cycled by load order.
pub const COLOR_PALETTE: [[u8; 4]; 10] = [
    [31, 119, 180, 255],  // Blue
    [255, 127, 14, 255],  // Orange
    [44, 160, 44, 255],   // Green
    [214, 39, 40, 255],   // Red
    [148, 103, 189, 255], // Purple
    [140, 86, 75, 255],   // Brown
    [227, 119, 194, 255], // Pink
    [127, 127, 127, 255], // Gray
    [188, 189, 34, 255],  // Olive
    [23, 190, 207, 255],  // Cyan
];

pub fn color_for_index(index: usize) -> [u8; 4] {
    COLOR_PALETTE[index % COLOR_PALETTE.len()]
}

/// One dataset drawn as a line with point markers.
///
/// A row with a missing X or Y breaks the line, so `segments` holds the
/// contiguous runs of valid points.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSeries {
    pub dataset: usize,
    pub label: String,
    pub color: [u8; 4],
    pub segments: Vec<Vec<[f64; 2]>>,
}

impl PlotSeries {
    pub fn color32(&self) -> egui::Color32 {
        let [r, g, b, a] = self.color;
        egui::Color32::from_rgba_unmultiplied(r, g, b, a)
    }

    pub fn points(&self) -> impl Iterator<Item = &[f64; 2]> {
        self.segments.iter().flatten()
    }
}

/// Axis-aligned extent of plotted data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl DataBounds {
    fn include(bounds: Option<Self>, x: f64, y: f64) -> Self {
        match bounds {
            None => Self {
                x_min: x,
                x_max: x,
                y_min: y,
                y_max: y,
            },
            Some(b) => Self {
                x_min: b.x_min.min(x),
                x_max: b.x_max.max(x),
                y_min: b.y_min.min(y),
                y_max: b.y_max.max(y),
            },
        }
    }
}

/// Everything the painter needs for one redraw: a series per dataset that
/// has both active columns, plus the axis labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlotFrame {
    pub series: Vec<PlotSeries>,
    pub x_label: String,
    pub y_label: String,
}

impl PlotFrame {
    pub fn build(session: &Session) -> Self {
        let Some((x_col, y_col)) = session.active_columns() else {
            return Self::default();
        };

        let series = session
            .datasets()
            .iter()
            .enumerate()
            .filter_map(|(index, ds)| {
                let xs = ds.table.numeric(&x_col)?;
                let ys = ds.table.numeric(&y_col)?;
                let mut segments = Vec::new();
                let mut run: Vec<[f64; 2]> = Vec::new();
                for (x, y) in xs.into_iter().zip(ys) {
                    match (x, y) {
                        (Some(x), Some(y)) => run.push([x, y]),
                        _ if !run.is_empty() => segments.push(std::mem::take(&mut run)),
                        _ => {}
                    }
                }
                if !run.is_empty() {
                    segments.push(run);
                }
                Some(PlotSeries {
                    dataset: index,
                    label: ds.label(),
                    color: color_for_index(index),
                    segments,
                })
            })
            .collect();

        Self {
            series,
            x_label: latex_to_unicode(&x_col),
            y_label: latex_to_unicode(&y_col),
        }
    }

    /// Extent of every plotted point, `None` when nothing is plotted.
    pub fn bounds(&self) -> Option<DataBounds> {
        self.series
            .iter()
            .flat_map(PlotSeries::points)
            .fold(None, |acc, p| Some(DataBounds::include(acc, p[0], p[1])))
    }

    pub fn point_count(&self) -> usize {
        self.series.iter().map(|s| s.points().count()).sum()
    }
}
