use crate::config::Settings;
use crate::data::table::Dataset;
use crate::error::SessionError;
use crate::processing::hit_test::{self, DataRect, PointHit, RegionHit};
use crate::processing::transform;
use crate::render::plot_interaction::{format_tick_value, PlotViewState, ScrollDirection};
use crate::state::history::History;
use crate::state::selection::{SelectionOutcome, SelectionState};
use crate::state::session::Session;

/// A deletion waiting for the user's yes/no.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingDeletion {
    Point(PointHit),
    Region { rect: DataRect, hit: RegionHit },
}

impl PendingDeletion {
    /// Question shown in the confirmation window.
    pub fn prompt(&self) -> String {
        match self {
            PendingDeletion::Point(hit) => format!(
                "Delete the point x = {}, y = {}?",
                format_tick_value(hit.x),
                format_tick_value(hit.y)
            ),
            PendingDeletion::Region { hit, .. } => {
                format!("Delete {} point(s) inside the selected region?", hit.total())
            }
        }
    }
}

/// Click marker in data coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Highlight {
    /// The point picked for deletion.
    Hit { x: f64, y: f64 },
    /// A click that found nothing within tolerance.
    Miss { x: f64, y: f64 },
}

/// One row of the background-window dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundTarget {
    pub dataset: usize,
    /// Identity of the dataset when the row was made.
    pub source_id: String,
    pub file_name: String,
    /// Extent of the X column, shown as a hint. `None` when the dataset
    /// lacks the active columns.
    pub x_extent: Option<(f64, f64)>,
}

/// Per-dataset result of a background subtraction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackgroundReport {
    pub corrected: Vec<usize>,
    /// No window given or the dataset lacks a column.
    pub skipped: Vec<usize>,
    /// The window selected no rows.
    pub degenerate: Vec<usize>,
}

/// Owns the session, its undo history, the view and the gesture state, and
/// sequences every user action: snapshot, mutate, redraw, report.
pub struct SessionCoordinator {
    session: Session,
    history: History,
    view: PlotViewState,
    selection: SelectionState,
    pending: Option<PendingDeletion>,
    highlight: Option<Highlight>,
    status: String,
    settings: Settings,
}

impl Default for SessionCoordinator {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl SessionCoordinator {
    pub fn new(settings: Settings) -> Self {
        Self {
            session: Session::new(),
            history: History::new(settings.history_capacity),
            view: PlotViewState::new(),
            selection: SelectionState::default(),
            pending: None,
            highlight: None,
            status: "Open or drop a data file to begin".to_string(),
            settings,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn datasets(&self) -> &[Dataset] {
        self.session.datasets()
    }

    pub fn view(&self) -> &PlotViewState {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut PlotViewState {
        &mut self.view
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn pending(&self) -> Option<&PendingDeletion> {
        self.pending.as_ref()
    }

    pub fn highlight(&self) -> Option<Highlight> {
        self.highlight
    }

    /// The rubber band being dragged, or the region awaiting confirmation.
    pub fn selection_rect(&self) -> Option<DataRect> {
        self.selection.rect().or(match &self.pending {
            Some(PendingDeletion::Region { rect, .. }) => Some(*rect),
            _ => None,
        })
    }

    /// Cursor readout for the status bar.
    pub fn hover_readout(&self, pos: egui::Pos2) -> Option<String> {
        if !self.view.contains(pos) || !self.view.initialized {
            return None;
        }
        let (x, y) = self.view.screen_to_data(pos);
        Some(format!("x = {}, y = {}", format_tick_value(x), format_tick_value(y)))
    }

    // -----------------------------------------------------------------------
    // Datasets and columns
    // -----------------------------------------------------------------------

    pub fn load_dataset(&mut self, dataset: Dataset) {
        self.drop_pending();
        let name = dataset.file_name();
        let rows = dataset.table.row_count();
        self.session.add(dataset);
        self.redraw(false);
        tracing::info!("Loaded {} ({} rows)", name, rows);
        self.status = format!("Loaded {name} ({rows} rows, {} file(s) open)", self.session.len());
    }

    pub fn set_x_column(&mut self, name: &str) {
        if self.session.x_column() == Some(name) {
            return;
        }
        self.drop_pending();
        self.session.set_x_column(name);
        self.redraw(false);
    }

    pub fn set_y_column(&mut self, name: &str) {
        if self.session.y_column() == Some(name) {
            return;
        }
        self.drop_pending();
        self.session.set_y_column(name);
        self.redraw(false);
    }

    /// Redraw every dataset with the chosen columns and autoscale.
    pub fn plot_selected(&mut self) -> Result<(), SessionError> {
        let result = self.require_columns();
        let (x, y) = self.report(result)?;
        self.redraw(false);
        if self.view.frame().series.is_empty() {
            let holds = |column: &str| self.session.datasets().iter().any(|d| d.table.has_column(column));
            let err = match (holds(&x), holds(&y)) {
                (false, _) => SessionError::MissingColumn { column: x },
                (_, false) => SessionError::MissingColumn { column: y },
                _ => SessionError::UnpairedColumns { x, y },
            };
            return self.report(Err(err));
        }
        self.status = format!("Plotted {y} against {x}");
        Ok(())
    }

    /// Drop every dataset and the undo history.
    pub fn clear_session(&mut self) {
        self.drop_pending();
        self.selection.cancel();
        self.session.clear();
        self.history.clear();
        self.redraw(false);
        tracing::info!("Session cleared");
        self.status = "Cleared all data".to_string();
    }

    // -----------------------------------------------------------------------
    // Transforms
    // -----------------------------------------------------------------------

    /// Center the Y column of every dataset that has it.
    pub fn apply_center(&mut self) -> Result<usize, SessionError> {
        let result = self.transform_y(|values, _| transform::center(values));
        let count = self.report(result)?;
        self.status = format!("Centered {count} dataset(s)");
        Ok(count)
    }

    /// Center and scale the Y column of every dataset that has it.
    pub fn apply_normalize(&mut self) -> Result<usize, SessionError> {
        let top_n = self.settings.normalize_top_n;
        let result = self.transform_y(|values, label| {
            let normalized = transform::normalize(values, top_n);
            match normalized.top_n_avg {
                Some(avg) if avg != 0.0 => {
                    tracing::debug!("Normalized {label}: top-{top_n} average {avg}")
                }
                _ => tracing::warn!("Normalized {label}: zero envelope, only centered"),
            }
            normalized.values
        });
        let count = self.report(result)?;
        self.status = format!("Normalized {count} dataset(s)");
        Ok(count)
    }

    /// Rows for the background-window dialog, one per dataset.
    pub fn background_targets(&self) -> Result<Vec<BackgroundTarget>, SessionError> {
        let (x_col, y_col) = self.require_columns()?;
        Ok(self
            .session
            .datasets()
            .iter()
            .enumerate()
            .map(|(dataset, ds)| {
                let xs = match ds.table.has_column(&y_col) {
                    true => ds.table.numeric(&x_col),
                    false => None,
                };
                let x_extent = xs.and_then(|xs| {
                    let (min, max) = xs
                        .iter()
                        .flatten()
                        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                            (lo.min(v), hi.max(v))
                        });
                    (min <= max).then_some((min, max))
                });
                BackgroundTarget {
                    dataset,
                    source_id: ds.source_id.clone(),
                    file_name: ds.file_name(),
                    x_extent,
                }
            })
            .collect())
    }

    /// Whether `targets` still describe the loaded datasets one for one.
    pub fn targets_current(&self, targets: &[BackgroundTarget]) -> bool {
        targets.len() == self.session.len()
            && targets.iter().all(|t| {
                self.session
                    .dataset(t.dataset)
                    .is_some_and(|d| d.source_id == t.source_id)
            })
    }

    /// Subtract a straight line fitted inside each dataset's window.
    ///
    /// `windows[i]` is the `(x_min, x_max)` for dataset `i`; `None` or a
    /// missing entry skips that dataset.
    pub fn subtract_background(
        &mut self,
        windows: &[Option<(f64, f64)>],
    ) -> Result<BackgroundReport, SessionError> {
        let result = self.subtract_background_inner(windows);
        let report = self.report(result)?;
        let mut status = format!("Background removed from {} dataset(s)", report.corrected.len());
        if !report.degenerate.is_empty() {
            status.push_str(&format!(
                "; window selected no rows in {} dataset(s)",
                report.degenerate.len()
            ));
        }
        self.status = status;
        Ok(report)
    }

    fn subtract_background_inner(
        &mut self,
        windows: &[Option<(f64, f64)>],
    ) -> Result<BackgroundReport, SessionError> {
        let (x_col, y_col) = self.require_columns()?;
        let mut report = BackgroundReport::default();
        let mut corrected_tables = Vec::new();

        for (index, ds) in self.session.datasets().iter().enumerate() {
            let Some((x_min, x_max)) = windows.get(index).copied().flatten() else {
                report.skipped.push(index);
                continue;
            };
            let mut table = ds.table.clone();
            match transform::subtract_linear_background(&mut table, &x_col, &y_col, x_min, x_max, index) {
                Ok(fit) => {
                    tracing::info!(
                        "Removed background from {} ({}): slope {}, intercept {}",
                        ds.file_name(),
                        y_col,
                        fit.slope,
                        fit.intercept
                    );
                    report.corrected.push(index);
                    corrected_tables.push((index, table));
                }
                Err(SessionError::DegenerateWindow { .. }) => {
                    tracing::warn!("Background window [{x_min}, {x_max}] selects no rows in {}", ds.file_name());
                    report.degenerate.push(index);
                }
                Err(e) => {
                    tracing::debug!("Skipping {}: {e}", ds.file_name());
                    report.skipped.push(index);
                }
            }
        }

        if corrected_tables.is_empty() {
            return Err(match report.degenerate.first() {
                Some(&dataset) => SessionError::DegenerateWindow { dataset },
                None => SessionError::NoEffect,
            });
        }

        self.drop_pending();
        self.history.push(self.session.datasets());
        for (index, table) in corrected_tables {
            if let Some(ds) = self.session.dataset_mut(index) {
                ds.table = table;
            }
        }
        self.redraw(false);
        Ok(report)
    }

    /// Apply `f` to the Y column of every dataset holding at least one
    /// numeric Y value. Pushes one snapshot first, and none when no dataset
    /// qualifies.
    fn transform_y<F>(&mut self, mut f: F) -> Result<usize, SessionError>
    where
        F: FnMut(&[Option<f64>], &str) -> Vec<Option<f64>>,
    {
        if self.session.is_empty() {
            return Err(SessionError::NoData);
        }
        let y_col = self.session.y_column().ok_or(SessionError::NoColumns)?.to_string();
        if !self.session.datasets().iter().any(|d| d.table.has_column(&y_col)) {
            return Err(SessionError::MissingColumn { column: y_col });
        }

        let mut updates = Vec::new();
        for (index, ds) in self.session.datasets().iter().enumerate() {
            let Some(values) = ds.table.numeric(&y_col) else {
                tracing::debug!("{} has no column '{}', skipped", ds.file_name(), y_col);
                continue;
            };
            if values.iter().all(Option::is_none) {
                tracing::debug!("{} has no numeric values in '{}', skipped", ds.file_name(), y_col);
                continue;
            }
            updates.push((index, f(&values, &ds.file_name())));
        }
        if updates.is_empty() {
            return Err(SessionError::NoEffect);
        }

        self.drop_pending();
        self.history.push(self.session.datasets());
        let mut count = 0;
        for (index, values) in updates {
            if let Some(ds) = self.session.dataset_mut(index) {
                if ds.table.set_numeric(&y_col, &values) {
                    count += 1;
                }
            }
        }
        self.redraw(false);
        Ok(count)
    }

    // -----------------------------------------------------------------------
    // Undo
    // -----------------------------------------------------------------------

    pub fn undo(&mut self) -> Result<(), SessionError> {
        let result = self.history.pop();
        let snapshot = self.report(result)?;
        self.drop_pending();
        self.selection.cancel();
        self.session.replace_datasets(snapshot);
        self.redraw(false);
        tracing::info!("Undo ({} snapshot(s) left)", self.history.len());
        self.status = format!("Undone ({} step(s) left)", self.history.len());
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Pointer gestures
    // -----------------------------------------------------------------------

    pub fn pointer_pressed(&mut self, button: egui::PointerButton, pos: egui::Pos2) {
        if self.pending.is_some() || !self.view.contains(pos) {
            return;
        }
        match button {
            egui::PointerButton::Secondary => self.view.begin_pan(pos),
            egui::PointerButton::Primary => {
                let data = self.view.screen_to_data(pos);
                self.selection.press(pos, data);
            }
            _ => {}
        }
    }

    pub fn pointer_moved(&mut self, pos: egui::Pos2) {
        if self.view.is_panning() {
            if self.view.contains(pos) {
                self.view.pan_to(pos);
            }
            return;
        }
        if self.pending.is_some() {
            return;
        }
        let data = self.view.contains(pos).then(|| self.view.screen_to_data(pos));
        self.selection.drag(pos, data, self.settings.drag_threshold_px);
    }

    pub fn pointer_released(&mut self, button: egui::PointerButton, pos: egui::Pos2) {
        match button {
            egui::PointerButton::Secondary => self.view.end_pan(),
            egui::PointerButton::Primary => match self.selection.release(pos) {
                SelectionOutcome::Click(at) => self.resolve_click(at),
                SelectionOutcome::Region(rect) => self.resolve_region(rect),
                SelectionOutcome::Nothing => {}
            },
            _ => {}
        }
    }

    pub fn scrolled(&mut self, pos: egui::Pos2, direction: ScrollDirection) {
        if !self.view.contains(pos) {
            return;
        }
        self.view.zoom_at(pos, direction, self.settings.zoom_step);
    }

    fn resolve_click(&mut self, pos: egui::Pos2) {
        if !self.view.contains(pos) {
            return;
        }
        let (cx, cy) = self.view.screen_to_data(pos);
        let hit = self.session.active_columns().and_then(|(x_col, y_col)| {
            hit_test::nearest_point(
                self.session.datasets(),
                &x_col,
                &y_col,
                &self.view,
                pos,
                self.settings.hit_tolerance_px as f64,
            )
        });

        match hit {
            Some(hit) => {
                tracing::debug!("Picked row {} of dataset {} ({:.1} px)", hit.row, hit.dataset, hit.distance_px);
                self.highlight = Some(Highlight::Hit { x: hit.x, y: hit.y });
                let pending = PendingDeletion::Point(hit);
                self.status = pending.prompt();
                self.pending = Some(pending);
            }
            None => {
                self.highlight = Some(Highlight::Miss { x: cx, y: cy });
                self.status = SessionError::NoSelection.to_string();
            }
        }
    }

    fn resolve_region(&mut self, rect: DataRect) {
        self.highlight = None;
        let Some((x_col, y_col)) = self.session.active_columns() else {
            self.status = SessionError::NoColumns.to_string();
            return;
        };
        let hit = hit_test::points_in_region(self.session.datasets(), &x_col, &y_col, &rect);
        if hit.is_empty() {
            self.status = "No points in the selected region".to_string();
            return;
        }
        let pending = PendingDeletion::Region { rect, hit };
        self.status = pending.prompt();
        self.pending = Some(pending);
    }

    /// Answer the pending confirmation. Returns the number of rows deleted.
    pub fn confirm_pending(&mut self, accept: bool) -> usize {
        let Some(pending) = self.pending.take() else {
            return 0;
        };
        self.highlight = None;
        if !accept {
            self.status = "Deletion cancelled".to_string();
            return 0;
        }

        self.history.push(self.session.datasets());
        let removed = match pending {
            PendingDeletion::Point(hit) => self.session.remove_rows(hit.dataset, &[hit.row]),
            PendingDeletion::Region { hit, .. } => hit
                .rows
                .iter()
                .map(|(&dataset, rows)| self.session.remove_rows(dataset, rows))
                .sum::<usize>(),
        };
        self.redraw(true);
        tracing::info!("Deleted {removed} point(s)");
        self.status = format!("Deleted {removed} point(s)");
        removed
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn require_columns(&self) -> Result<(String, String), SessionError> {
        if self.session.is_empty() {
            return Err(SessionError::NoData);
        }
        self.session.active_columns().ok_or(SessionError::NoColumns)
    }

    fn redraw(&mut self, preserve_view: bool) {
        self.view
            .redraw(&self.session, preserve_view, self.settings.autoscale_padding);
    }

    fn drop_pending(&mut self) {
        self.pending = None;
        self.highlight = None;
    }

    /// Mirror an error into the status line before handing it back.
    fn report<T>(&mut self, result: Result<T, SessionError>) -> Result<T, SessionError> {
        if let Err(e) = &result {
            tracing::warn!("{e}");
            self.status = capitalize(&e.to_string());
        }
        result
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
