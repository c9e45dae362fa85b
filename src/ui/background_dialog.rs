use crate::render::plot_interaction::format_tick_value;
use crate::state::coordinator::BackgroundTarget;

/// One editable row: a dataset and the text of its fit window.
pub struct BackgroundRow {
    pub target: BackgroundTarget,
    pub x_min: String,
    pub x_max: String,
}

/// State for the background-window dialog, opened from the toolbar.
pub struct BackgroundDialogState {
    pub x_column: String,
    pub rows: Vec<BackgroundRow>,
}

impl BackgroundDialogState {
    pub fn new(targets: Vec<BackgroundTarget>, x_column: impl Into<String>) -> Self {
        Self {
            x_column: x_column.into(),
            rows: targets
                .into_iter()
                .map(|target| BackgroundRow {
                    target,
                    x_min: String::new(),
                    x_max: String::new(),
                })
                .collect(),
        }
    }

    pub fn targets(&self) -> Vec<BackgroundTarget> {
        self.rows.iter().map(|r| r.target.clone()).collect()
    }

    /// Window per dataset index. Rows left blank or not parseable skip
    /// their dataset.
    pub fn windows(&self) -> Vec<Option<(f64, f64)>> {
        let len = self.rows.iter().map(|r| r.target.dataset + 1).max().unwrap_or(0);
        let mut windows = vec![None; len];
        for row in &self.rows {
            windows[row.target.dataset] = parse_window(&row.x_min, &row.x_max);
        }
        windows
    }
}

fn parse_window(min: &str, max: &str) -> Option<(f64, f64)> {
    let min = min.trim().parse::<f64>().ok()?;
    let max = max.trim().parse::<f64>().ok()?;
    Some((min, max))
}

/// Result of the background dialog interaction each frame.
pub enum DialogResult {
    Ok(Vec<Option<(f64, f64)>>),
    Cancel,
}

/// Show the background dialog as an egui window.
///
/// Returns `Some(DialogResult)` when the user presses OK or Cancel,
/// or `None` while the dialog is still open.
pub fn show_background_dialog(
    ctx: &egui::Context,
    state: &mut BackgroundDialogState,
) -> Option<DialogResult> {
    use egui_extras::{Column, TableBuilder};

    let mut result = None;

    egui::Window::new("Linear Background Windows")
        .collapsible(false)
        .resizable(true)
        .default_width(520.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(
                egui::RichText::new(format!(
                    "Enter the fit range in units of '{}'. Leave a row blank to skip that file.",
                    state.x_column
                ))
                .weak(),
            );
            ui.add_space(8.0);

            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
                .column(Column::auto().at_least(180.0))
                .column(Column::auto().at_least(100.0))
                .column(Column::auto().at_least(100.0))
                .min_scrolled_height(200.0)
                .header(20.0, |mut header| {
                    header.col(|ui| {
                        ui.strong("File");
                    });
                    header.col(|ui| {
                        ui.strong("x_min");
                    });
                    header.col(|ui| {
                        ui.strong("x_max");
                    });
                })
                .body(|mut body| {
                    for row in &mut state.rows {
                        body.row(24.0, |mut table_row| {
                            table_row.col(|ui| {
                                let label = ui.label(row.target.file_name.as_str());
                                if let Some((lo, hi)) = row.target.x_extent {
                                    label.on_hover_text(format!(
                                        "X spans {} to {}",
                                        format_tick_value(lo),
                                        format_tick_value(hi)
                                    ));
                                }
                            });
                            table_row.col(|ui| {
                                ui.add(egui::TextEdit::singleline(&mut row.x_min).desired_width(90.0));
                            });
                            table_row.col(|ui| {
                                ui.add(egui::TextEdit::singleline(&mut row.x_max).desired_width(90.0));
                            });
                        });
                    }
                });

            ui.add_space(12.0);

            ui.horizontal(|ui| {
                let ok_btn = ui.add(
                    egui::Button::new(egui::RichText::new("OK").strong())
                        .min_size(egui::vec2(100.0, 32.0)),
                );
                if ok_btn.clicked() {
                    result = Some(DialogResult::Ok(state.windows()));
                }
                if ui.add(egui::Button::new("Cancel").min_size(egui::vec2(100.0, 32.0))).clicked() {
                    result = Some(DialogResult::Cancel);
                }
            });
        });

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(dataset: usize) -> BackgroundTarget {
        BackgroundTarget {
            dataset,
            source_id: format!("/data/{dataset}.csv"),
            file_name: format!("{dataset}.csv"),
            x_extent: None,
        }
    }

    #[test]
    fn blank_or_invalid_rows_are_skipped() {
        let mut state = BackgroundDialogState::new(vec![target(0), target(1), target(2)], "H");
        state.rows[0].x_min = " -5 ".into();
        state.rows[0].x_max = "5".into();
        state.rows[1].x_min = "abc".into();
        state.rows[1].x_max = "1".into();
        assert_eq!(state.windows(), vec![Some((-5.0, 5.0)), None, None]);
    }
}
