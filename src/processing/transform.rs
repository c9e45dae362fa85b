use crate::data::table::Table;
use crate::error::SessionError;

/// Default number of largest values averaged by [`normalize`].
pub const DEFAULT_TOP_N: usize = 20;

fn valid(values: &[Option<f64>]) -> impl Iterator<Item = f64> + '_ {
    values.iter().flatten().copied()
}

/// Shift a column so its extremes are symmetric around zero.
///
/// Missing entries stay missing. A column with no values is returned as is.
pub fn center(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let max = valid(values).fold(f64::NEG_INFINITY, f64::max);
    let min = valid(values).fold(f64::INFINITY, f64::min);
    if !max.is_finite() || !min.is_finite() {
        return values.to_vec();
    }
    let mid = (max + min) / 2.0;
    values.iter().map(|v| v.map(|v| v - mid)).collect()
}

/// Output of [`normalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub values: Vec<Option<f64>>,
    /// Mean of the largest values after centering; `None` when the column
    /// had nothing to average.
    pub top_n_avg: Option<f64>,
}

/// Center, then scale by the mean of the `top_n` largest values and clip to
/// `[-1, 1]`. Values beyond the envelope saturate.
pub fn normalize(values: &[Option<f64>], top_n: usize) -> Normalized {
    let centered = center(values);
    let mut sorted: Vec<f64> = valid(&centered).collect();
    if sorted.is_empty() {
        return Normalized {
            values: centered,
            top_n_avg: None,
        };
    }
    sorted.sort_by(|a, b| b.total_cmp(a));
    let take = top_n.clamp(1, sorted.len());
    let avg = sorted[..take].iter().sum::<f64>() / take as f64;

    if avg == 0.0 {
        return Normalized {
            values: centered,
            top_n_avg: Some(0.0),
        };
    }

    let values = centered
        .iter()
        .map(|v| {
            v.map(|v| {
                if v > avg {
                    1.0
                } else if v < -avg {
                    -1.0
                } else {
                    v / avg
                }
            })
        })
        .collect();
    Normalized {
        values,
        top_n_avg: Some(avg),
    }
}

/// A fitted straight line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn eval(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Least-squares line through the points. `None` for an empty slice.
/// When all x coincide the fit degenerates to a horizontal line at mean y.
pub fn fit_line(points: &[(f64, f64)]) -> Option<LinearFit> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
    let sxx: f64 = points.iter().map(|p| (p.0 - mean_x).powi(2)).sum();
    let sxy: f64 = points.iter().map(|p| (p.0 - mean_x) * (p.1 - mean_y)).sum();

    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    Some(LinearFit {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}

/// Fit a line to the rows with `x_min <= x <= x_max` and subtract it from
/// `y_col` over the whole table.
///
/// `dataset` only labels the error. A window that selects no rows leaves
/// the table untouched and returns [`SessionError::DegenerateWindow`].
pub fn subtract_linear_background(
    table: &mut Table,
    x_col: &str,
    y_col: &str,
    x_min: f64,
    x_max: f64,
    dataset: usize,
) -> Result<LinearFit, SessionError> {
    let missing = |column: &str| SessionError::MissingColumn {
        column: column.to_string(),
    };
    let xs = table.numeric(x_col).ok_or_else(|| missing(x_col))?;
    let ys = table.numeric(y_col).ok_or_else(|| missing(y_col))?;

    let window: Vec<(f64, f64)> = xs
        .iter()
        .zip(&ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .filter(|(x, _)| x_min <= *x && *x <= x_max)
        .collect();
    let fit = fit_line(&window).ok_or(SessionError::DegenerateWindow { dataset })?;

    let corrected: Vec<Option<f64>> = xs
        .iter()
        .zip(&ys)
        .map(|(x, y)| Some((*y)? - fit.eval((*x)?)))
        .collect();
    table.set_numeric(y_col, &corrected);
    Ok(fit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::table::Column;

    const EPS: f64 = 1e-12;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    fn extremes(values: &[Option<f64>]) -> (f64, f64) {
        let vals: Vec<f64> = values.iter().flatten().copied().collect();
        (
            vals.iter().copied().fold(f64::INFINITY, f64::min),
            vals.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        )
    }

    #[test]
    fn center_makes_extremes_symmetric() {
        let y = vec![Some(3.0), None, Some(7.0), Some(4.5), Some(-1.0)];
        let c = center(&y);
        let (min, max) = extremes(&c);
        assert!((max + min).abs() < EPS);
        assert_eq!(c[1], None);
        assert!((c[0].unwrap() - 0.0).abs() < EPS);
    }

    #[test]
    fn center_is_idempotent() {
        let y = some(&[0.3, 12.0, -4.25, 8.0, 1.0e-3]);
        let once = center(&y);
        let twice = center(&once);
        for (a, b) in once.iter().zip(&twice) {
            assert!((a.unwrap() - b.unwrap()).abs() < EPS);
        }
    }

    #[test]
    fn center_without_values_is_noop() {
        let y = vec![None, None];
        assert_eq!(center(&y), y);
        assert!(center(&[]).is_empty());
    }

    #[test]
    fn normalize_stays_within_unit_range() {
        let y: Vec<Option<f64>> = (0..100)
            .map(|i| Some((i as f64 * 0.37).sin() * 5.0 + i as f64 * 0.01))
            .chain([None])
            .collect();
        let n = normalize(&y, DEFAULT_TOP_N);
        assert!(n.top_n_avg.unwrap() > 0.0);
        assert!(n.values.iter().flatten().all(|v| (-1.0..=1.0).contains(v)));
        assert_eq!(n.values.last(), Some(&None));
    }

    #[test]
    fn normalize_saturates_beyond_envelope() {
        // centered: [-10, -1, 0, 1, 10]; top-2 average = 5.5
        let n = normalize(&some(&[-10.0, -1.0, 0.0, 1.0, 10.0]), 2);
        assert_eq!(n.top_n_avg, Some(5.5));
        assert_eq!(n.values[0], Some(-1.0));
        assert_eq!(n.values[4], Some(1.0));
        assert!((n.values[3].unwrap() - 1.0 / 5.5).abs() < EPS);
    }

    #[test]
    fn normalize_of_flat_column_reports_zero_average() {
        let n = normalize(&some(&[0.0, 0.0, 0.0]), DEFAULT_TOP_N);
        assert_eq!(n.top_n_avg, Some(0.0));
        assert_eq!(n.values, some(&[0.0, 0.0, 0.0]));
    }

    #[test]
    fn normalize_uses_all_values_when_fewer_than_top_n() {
        // centered: [-1, 1] → average of both is 0
        let n = normalize(&some(&[2.0, 4.0]), DEFAULT_TOP_N);
        assert_eq!(n.top_n_avg, Some(0.0));
        let n = normalize(&[None], DEFAULT_TOP_N);
        assert_eq!(n.top_n_avg, None);
    }

    #[test]
    fn fit_line_recovers_slope_and_intercept() {
        let pts: Vec<(f64, f64)> = (0..10).map(|i| (i as f64, 2.0 * i as f64 - 3.0)).collect();
        let fit = fit_line(&pts).unwrap();
        assert!((fit.slope - 2.0).abs() < EPS);
        assert!((fit.intercept + 3.0).abs() < EPS);
        let flat = fit_line(&[(1.0, 2.0), (1.0, 4.0)]).unwrap();
        assert_eq!(flat, LinearFit { slope: 0.0, intercept: 3.0 });
        assert!(fit_line(&[]).is_none());
    }

    #[test]
    fn background_is_fit_in_window_and_removed_everywhere() {
        // y = 0.5 x + 1 plus a bump at x = 5 outside the window
        let xs = [0.0, 1.0, 2.0, 3.0, 5.0];
        let ys = [1.0, 1.5, 2.0, 2.5, 10.0];
        let mut t = Table::new(vec![Column::numeric("H", &xs), Column::numeric("M", &ys)]);
        let fit = subtract_linear_background(&mut t, "H", "M", 0.0, 3.0, 0).unwrap();
        assert!((fit.slope - 0.5).abs() < EPS);
        let m = t.numeric("M").unwrap();
        for v in &m[..4] {
            assert!(v.unwrap().abs() < EPS);
        }
        assert!((m[4].unwrap() - 6.5).abs() < EPS);
    }

    #[test]
    fn empty_window_leaves_table_untouched() {
        let mut t = Table::new(vec![
            Column::numeric("H", &[0.0, 1.0]),
            Column::numeric("M", &[3.0, 4.0]),
        ]);
        let before = t.clone();
        let err = subtract_linear_background(&mut t, "H", "M", 10.0, 20.0, 2).unwrap_err();
        assert_eq!(err, SessionError::DegenerateWindow { dataset: 2 });
        assert_eq!(t, before);
        // Inverted bounds select nothing either.
        assert!(subtract_linear_background(&mut t, "H", "M", 1.0, 0.0, 2).is_err());
    }
}
