use std::collections::BTreeMap;

use crate::data::table::Dataset;
use crate::render::plot_interaction::PlotViewState;

/// The data point picked by a click.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointHit {
    pub dataset: usize,
    /// Row position inside the dataset's table.
    pub row: usize,
    pub x: f64,
    pub y: f64,
    pub distance_px: f64,
}

/// Find the plotted point closest to `pointer` in screen pixels.
///
/// Every dataset that has both columns is scanned in load order, rows in
/// order; only a strictly smaller distance replaces the current best, so
/// ties go to the earliest point. Points farther than `tolerance_px` are
/// never picked.
pub fn nearest_point(
    datasets: &[Dataset],
    x_col: &str,
    y_col: &str,
    view: &PlotViewState,
    pointer: egui::Pos2,
    tolerance_px: f64,
) -> Option<PointHit> {
    let (px, py) = (pointer.x as f64, pointer.y as f64);
    let mut best: Option<PointHit> = None;

    for (dataset, ds) in datasets.iter().enumerate() {
        let Some(points) = ds.table.xy_points(x_col, y_col) else {
            continue;
        };
        for (row, x, y) in points {
            let (sx, sy) = view.data_to_pixel(x, y);
            let distance_px = (sx - px).hypot(sy - py);
            if distance_px > tolerance_px {
                continue;
            }
            if best.map_or(true, |b| distance_px < b.distance_px) {
                best = Some(PointHit {
                    dataset,
                    row,
                    x,
                    y,
                    distance_px,
                });
            }
        }
    }
    best
}

/// A rectangle in data coordinates with `min <= max` on both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataRect {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl DataRect {
    /// The bounding box of two opposite corners, in any order.
    pub fn from_corners(a: (f64, f64), b: (f64, f64)) -> Self {
        Self {
            x_min: a.0.min(b.0),
            x_max: a.0.max(b.0),
            y_min: a.1.min(b.1),
            y_max: a.1.max(b.1),
        }
    }

    /// Inclusive on all four edges.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.x_min <= x && x <= self.x_max && self.y_min <= y && y <= self.y_max
    }
}

/// Rows inside a rectangle, grouped by dataset index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionHit {
    pub rows: BTreeMap<usize, Vec<usize>>,
}

impl RegionHit {
    pub fn total(&self) -> usize {
        self.rows.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Collect every row of every dataset whose (x, y) lies inside `rect`.
pub fn points_in_region(datasets: &[Dataset], x_col: &str, y_col: &str, rect: &DataRect) -> RegionHit {
    let mut hit = RegionHit::default();
    for (dataset, ds) in datasets.iter().enumerate() {
        let Some(points) = ds.table.xy_points(x_col, y_col) else {
            continue;
        };
        let rows: Vec<usize> = points
            .into_iter()
            .filter(|&(_, x, y)| rect.contains(x, y))
            .map(|(row, _, _)| row)
            .collect();
        if !rows.is_empty() {
            hit.rows.insert(dataset, rows);
        }
    }
    hit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::table::{Column, Table};

    fn dataset(name: &str, xs: &[f64], ys: &[f64]) -> Dataset {
        Dataset::new(
            name,
            Table::new(vec![Column::numeric("x", xs), Column::numeric("y", ys)]),
        )
    }

    /// 100x100 px plot showing [0, 10] on both axes: 1 data unit = 10 px.
    fn view() -> PlotViewState {
        let mut v = PlotViewState::new();
        v.set_plot_rect(egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(100.0, 100.0)));
        v.x_max = 10.0;
        v.y_max = 10.0;
        v
    }

    #[test]
    fn picks_closest_point_within_tolerance() {
        let data = [dataset("a", &[1.0, 5.0], &[5.0, 5.0])];
        // Pointer at data (4.7, 5) is 3 px from (5, 5).
        let hit = nearest_point(&data, "x", "y", &view(), egui::pos2(47.0, 50.0), 10.0).unwrap();
        assert_eq!((hit.dataset, hit.row), (0, 1));
        assert!((hit.distance_px - 3.0).abs() < 1e-6);

        // Nothing within 10 px of data (3, 8).
        assert!(nearest_point(&data, "x", "y", &view(), egui::pos2(30.0, 20.0), 10.0).is_none());
    }

    #[test]
    fn ties_go_to_first_dataset_in_load_order() {
        let data = [
            dataset("a", &[4.0], &[5.0]),
            dataset("b", &[6.0], &[5.0]),
        ];
        let hit = nearest_point(&data, "x", "y", &view(), egui::pos2(50.0, 50.0), 10.0).unwrap();
        assert_eq!(hit.dataset, 0);
    }

    #[test]
    fn datasets_missing_a_column_are_skipped() {
        let other = Dataset::new("c", Table::new(vec![Column::numeric("x", &[5.0])]));
        let data = [other, dataset("a", &[5.0], &[5.0])];
        let hit = nearest_point(&data, "x", "y", &view(), egui::pos2(50.0, 50.0), 10.0).unwrap();
        assert_eq!(hit.dataset, 1);
    }

    #[test]
    fn region_is_inclusive_and_grouped() {
        let data = [
            dataset("a", &[1.0, 2.0, 5.0], &[1.0, 2.0, 5.0]),
            dataset("b", &[3.0, 3.1], &[0.0, 0.0]),
        ];
        let rect = DataRect::from_corners((3.0, 3.0), (0.0, 0.0));
        let hit = points_in_region(&data, "x", "y", &rect);
        assert_eq!(hit.rows.get(&0), Some(&vec![0, 1]));
        assert_eq!(hit.rows.get(&1), Some(&vec![0]));
        assert_eq!(hit.total(), 3);
    }

    #[test]
    fn corners_normalize() {
        let r = DataRect::from_corners((4.0, -1.0), (-2.0, 3.0));
        assert_eq!((r.x_min, r.x_max, r.y_min, r.y_max), (-2.0, 4.0, -1.0, 3.0));
        assert!(r.contains(4.0, 3.0));
        assert!(!r.contains(4.0001, 0.0));
    }
}
