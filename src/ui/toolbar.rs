use crate::state::coordinator::SessionCoordinator;
use crate::state::theme::Theme;

/// Actions that the toolbar can request from the app.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolbarAction {
    None,
    Open,
    Export,
    SaveFigure,
    CopyFigure,
    Undo,
    Center,
    Normalize,
    RemoveBackground,
    Clear,
    Plot,
    ToggleTheme,
    SetX(String),
    SetY(String),
}

/// Helper to create a toolbar button with consistent min size.
fn toolbar_btn(ui: &mut egui::Ui, label: &str) -> egui::Response {
    ui.add(egui::Button::new(label).min_size(egui::vec2(0.0, 26.0)))
}

fn column_combo(
    ui: &mut egui::Ui,
    id: &str,
    current: Option<&str>,
    choices: &[String],
) -> Option<String> {
    let mut picked = None;
    egui::ComboBox::from_id_salt(id)
        .selected_text(current.unwrap_or("(none)"))
        .width(160.0)
        .show_ui(ui, |ui| {
            for name in choices {
                if ui.selectable_label(current == Some(name.as_str()), name).clicked() {
                    picked = Some(name.clone());
                }
            }
        });
    picked
}

/// Render the toolbar. Returns the action the user clicked, if any.
pub fn show_toolbar(ui: &mut egui::Ui, coordinator: &SessionCoordinator, theme: Theme) -> ToolbarAction {
    let mut action = ToolbarAction::None;
    let session = coordinator.session();
    let has_data = !session.is_empty();

    ui.horizontal_wrapped(|ui| {
        if toolbar_btn(ui, "Open").clicked() {
            action = ToolbarAction::Open;
        }
        ui.add_enabled_ui(has_data, |ui| {
            if toolbar_btn(ui, "Export").clicked() {
                action = ToolbarAction::Export;
            }
            if toolbar_btn(ui, "Save Figure").clicked() {
                action = ToolbarAction::SaveFigure;
            }
            if toolbar_btn(ui, "Copy Figure").clicked() {
                action = ToolbarAction::CopyFigure;
            }
        });

        ui.separator();

        let undo = ui
            .add_enabled(
                coordinator.history().can_undo(),
                egui::Button::new("Undo").min_size(egui::vec2(0.0, 26.0)),
            )
            .on_hover_text(format!("{} step(s) available (Ctrl+Z)", coordinator.history().len()));
        if undo.clicked() {
            action = ToolbarAction::Undo;
        }
        if toolbar_btn(ui, "Center").clicked() {
            action = ToolbarAction::Center;
        }
        if toolbar_btn(ui, "Normalize").clicked() {
            action = ToolbarAction::Normalize;
        }
        if toolbar_btn(ui, "Remove Background").clicked() {
            action = ToolbarAction::RemoveBackground;
        }
        if toolbar_btn(ui, "Clear").clicked() {
            action = ToolbarAction::Clear;
        }

        ui.separator();

        ui.label("X");
        if let Some(name) = column_combo(ui, "x_column", session.x_column(), session.column_choices()) {
            action = ToolbarAction::SetX(name);
        }
        ui.label("Y");
        if let Some(name) = column_combo(ui, "y_column", session.y_column(), session.column_choices()) {
            action = ToolbarAction::SetY(name);
        }
        if toolbar_btn(ui, "Plot").clicked() {
            action = ToolbarAction::Plot;
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button(theme.toggle_label()).clicked() {
                action = ToolbarAction::ToggleTheme;
            }
        });
    });

    action
}
