use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use eframe::egui;

use crate::config::Settings;
use crate::data::{export, loader};
use crate::state::coordinator::SessionCoordinator;
use crate::state::theme::Theme;
use crate::ui::background_dialog::{self, BackgroundDialogState, DialogResult};
use crate::ui::confirm_dialog;
use crate::ui::plot_panel;
use crate::ui::toolbar::{self, ToolbarAction};

/// What to do when a screenshot arrives.
enum PendingScreenshot {
    SaveFile,
    Clipboard,
}

/// Pending async file load result.
struct PendingLoad {
    path: PathBuf,
    result: Arc<Mutex<Option<Result<loader::LoadedData, String>>>>,
}

/// The main InstPlot application.
pub struct InstPlotApp {
    coordinator: SessionCoordinator,
    theme: Theme,
    /// Active background-window dialog.
    background_dialog: Option<BackgroundDialogState>,
    /// File loads in progress, in the order they were requested.
    pending_loads: Vec<PendingLoad>,
    /// Pending screenshot action (save file or clipboard).
    pending_screenshot: Option<PendingScreenshot>,
    /// Plot panel area in the last frame, used to crop screenshots.
    last_plot_rect: Option<egui::Rect>,
    /// Cursor position in data coordinates, shown in the status bar.
    hover_readout: Option<String>,
}

impl InstPlotApp {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: Settings) -> Self {
        let theme = Theme::from_dark_flag(settings.dark_theme);

        // --- Global UI style ---
        let ctx = &cc.egui_ctx;
        let mut style = (*ctx.style()).clone();
        style.text_styles.insert(egui::TextStyle::Body, egui::FontId::proportional(14.5));
        style.text_styles.insert(egui::TextStyle::Button, egui::FontId::proportional(14.0));
        style.spacing.button_padding = egui::vec2(10.0, 5.0);
        style.spacing.item_spacing = egui::vec2(8.0, 6.0);
        style.visuals.window_corner_radius = egui::CornerRadius::same(8);
        ctx.set_style(style);
        ctx.set_visuals(theme.visuals());

        Self {
            coordinator: SessionCoordinator::new(settings),
            theme,
            background_dialog: None,
            pending_loads: Vec::new(),
            pending_screenshot: None,
            last_plot_rect: None,
            hover_readout: None,
        }
    }

    /// Open a native file dialog and load every picked file.
    fn open_file_dialog(&mut self) {
        if let Some(paths) = rfd::FileDialog::new()
            .add_filter("Data Files", &["csv", "txt", "dat", "tsv", "xls", "xlsx"])
            .add_filter("All Files", &["*"])
            .pick_files()
        {
            for path in paths {
                self.load_file(&path);
            }
        }
    }

    /// Parse a data file on a worker thread so the UI stays responsive.
    fn load_file(&mut self, path: &Path) {
        let path_buf = path.to_path_buf();
        let result: Arc<Mutex<Option<Result<loader::LoadedData, String>>>> =
            Arc::new(Mutex::new(None));
        let result_clone = Arc::clone(&result);

        std::thread::spawn(move || {
            let loaded = loader::load_file(&path_buf).map_err(|e| e.to_string());
            if let Ok(mut slot) = result_clone.lock() {
                *slot = Some(loaded);
            }
        });

        self.pending_loads.push(PendingLoad {
            path: path.to_path_buf(),
            result,
        });
    }

    /// Hand finished loads to the session, keeping request order.
    fn poll_loads(&mut self) {
        while let Some(pending) = self.pending_loads.first() {
            let finished = match pending.result.lock() {
                Ok(mut slot) => slot.take(),
                Err(_) => Some(Err("loader thread panicked".to_string())),
            };
            let Some(result) = finished else {
                break;
            };
            let pending = self.pending_loads.remove(0);
            match result {
                Ok(loaded) => {
                    let format = match loaded.encoding {
                        Some(encoding) => format!("{}, {encoding}", loaded.format.describe()),
                        None => loaded.format.describe(),
                    };
                    self.coordinator.load_dataset(loaded.dataset);
                    let status = format!("{} [{format}]", self.coordinator.status());
                    self.coordinator.set_status(status);
                }
                Err(e) => {
                    tracing::error!("Failed to load {:?}: {e}", pending.path);
                    self.coordinator
                        .set_status(format!("Failed to load {}: {e}", pending.path.display()));
                }
            }
        }
    }

    /// Export every dataset via a save dialog.
    fn export_data(&mut self) {
        if self.coordinator.datasets().is_empty() {
            return;
        }
        let Some(path) = rfd::FileDialog::new()
            .set_file_name("export.csv")
            .add_filter("Excel Files", &["xlsx"])
            .add_filter("CSV Files", &["csv"])
            .add_filter("Text Files", &["txt"])
            .save_file()
        else {
            return;
        };
        match export::export_datasets(&path, self.coordinator.datasets()) {
            Ok(()) => self
                .coordinator
                .set_status(format!("Exported to {}", path.display())),
            Err(e) => {
                tracing::error!("Export failed: {e}");
                self.coordinator.set_status(format!("Export failed: {e}"));
            }
        }
    }

    fn open_background_dialog(&mut self) {
        match self.coordinator.background_targets() {
            Ok(targets) => {
                let x_column = self.coordinator.session().x_column().unwrap_or_default();
                self.background_dialog = Some(BackgroundDialogState::new(targets, x_column));
            }
            Err(e) => self.coordinator.set_status(e.to_string()),
        }
    }

    fn handle_toolbar(&mut self, ctx: &egui::Context, action: ToolbarAction) {
        // Errors are already mirrored into the status line by the coordinator.
        match action {
            ToolbarAction::None => {}
            ToolbarAction::Open => self.open_file_dialog(),
            ToolbarAction::Export => self.export_data(),
            ToolbarAction::SaveFigure => {
                self.pending_screenshot = Some(PendingScreenshot::SaveFile);
                ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot(egui::UserData::default()));
            }
            ToolbarAction::CopyFigure => {
                self.pending_screenshot = Some(PendingScreenshot::Clipboard);
                ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot(egui::UserData::default()));
            }
            ToolbarAction::Undo => {
                let _ = self.coordinator.undo();
            }
            ToolbarAction::Center => {
                let _ = self.coordinator.apply_center();
            }
            ToolbarAction::Normalize => {
                let _ = self.coordinator.apply_normalize();
            }
            ToolbarAction::RemoveBackground => self.open_background_dialog(),
            ToolbarAction::Clear => self.coordinator.clear_session(),
            ToolbarAction::Plot => {
                let _ = self.coordinator.plot_selected();
            }
            ToolbarAction::ToggleTheme => self.theme = self.theme.toggle(),
            ToolbarAction::SetX(name) => self.coordinator.set_x_column(&name),
            ToolbarAction::SetY(name) => self.coordinator.set_y_column(&name),
        }
    }

    /// Crop a screenshot to the plot panel and save or copy it.
    fn finish_screenshot(&mut self, ctx: &egui::Context, color_image: &egui::ColorImage) {
        let Some(action) = self.pending_screenshot.take() else {
            return;
        };

        let ppp = ctx.pixels_per_point();
        let full_w = color_image.width();
        let (rgba, width, height) = if let Some(rect) = self.last_plot_rect {
            let x0 = ((rect.left() * ppp) as usize).min(full_w);
            let y0 = ((rect.top() * ppp) as usize).min(color_image.height());
            let x1 = ((rect.right() * ppp).ceil() as usize).min(full_w);
            let y1 = ((rect.bottom() * ppp).ceil() as usize).min(color_image.height());
            let cw = x1.saturating_sub(x0);
            let ch = y1.saturating_sub(y0);
            let mut cropped = Vec::with_capacity(cw * ch * 4);
            for row in y0..y1 {
                for col in x0..x1 {
                    let c = color_image.pixels[row * full_w + col];
                    cropped.extend_from_slice(&[c.r(), c.g(), c.b(), c.a()]);
                }
            }
            (cropped, cw, ch)
        } else {
            let rgba: Vec<u8> = color_image
                .pixels
                .iter()
                .flat_map(|c| [c.r(), c.g(), c.b(), c.a()])
                .collect();
            (rgba, color_image.width(), color_image.height())
        };

        match action {
            PendingScreenshot::SaveFile => {
                let Some(path) = rfd::FileDialog::new()
                    .set_file_name("plot.png")
                    .add_filter("PNG Image", &["png"])
                    .save_file()
                else {
                    return;
                };
                let Some(img) = image::RgbaImage::from_raw(width as u32, height as u32, rgba) else {
                    return;
                };
                match img.save(&path) {
                    Ok(()) => {
                        tracing::info!("Saved figure to {:?}", path);
                        self.coordinator
                            .set_status(format!("Figure saved to {}", path.display()));
                    }
                    Err(e) => {
                        tracing::error!("Failed to save figure: {e}");
                        self.coordinator.set_status(format!("Failed to save figure: {e}"));
                    }
                }
            }
            PendingScreenshot::Clipboard => match arboard::Clipboard::new() {
                Ok(mut clipboard) => {
                    let img_data = arboard::ImageData {
                        width,
                        height,
                        bytes: std::borrow::Cow::Owned(rgba),
                    };
                    match clipboard.set_image(img_data) {
                        Ok(()) => {
                            tracing::info!("Copied figure to clipboard");
                            self.coordinator.set_status("Figure copied to clipboard");
                        }
                        Err(e) => {
                            self.coordinator
                                .set_status(format!("Failed to copy to clipboard: {e}"));
                        }
                    }
                }
                Err(e) => {
                    self.coordinator
                        .set_status(format!("Failed to access clipboard: {e}"));
                }
            },
        }
    }
}

impl eframe::App for InstPlotApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(self.theme.visuals());

        // ------------------------------------------------------------------
        // 0. Handle screenshot events from previous frame
        // ------------------------------------------------------------------
        if self.pending_screenshot.is_some() {
            let mut screenshot_image: Option<Arc<egui::ColorImage>> = None;
            ctx.input(|i| {
                for event in &i.raw.events {
                    if let egui::Event::Screenshot { image, .. } = event {
                        screenshot_image = Some(image.clone());
                    }
                }
            });
            if let Some(color_image) = screenshot_image {
                self.finish_screenshot(ctx, &color_image);
            }
        }

        // ------------------------------------------------------------------
        // 1. Handle dropped files
        // ------------------------------------------------------------------
        let dropped_paths: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .collect()
        });
        for path in dropped_paths {
            self.load_file(&path);
        }

        // ------------------------------------------------------------------
        // 2. Keyboard shortcuts
        // ------------------------------------------------------------------
        // The background dialog is modal: nothing else may touch the
        // datasets its rows refer to until it closes.
        let modal = self.background_dialog.is_some();
        let dialog_open = modal || self.coordinator.pending().is_some();
        if !dialog_open && ctx.input_mut(|i| i.consume_key(egui::Modifiers::COMMAND, egui::Key::Z)) {
            let _ = self.coordinator.undo();
        }

        // ------------------------------------------------------------------
        // 3. Toolbar, status bar, plot
        // ------------------------------------------------------------------
        let mut action = ToolbarAction::None;
        egui::TopBottomPanel::top("toolbar")
            .frame(egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::symmetric(12, 8)))
            .show(ctx, |ui| {
                ui.add_enabled_ui(!modal, |ui| {
                    action = toolbar::show_toolbar(ui, &self.coordinator, self.theme);
                });
            });

        // The cursor readout lags one frame: side panels must be laid out
        // before the central plot that produces it.
        egui::TopBottomPanel::bottom("status")
            .frame(egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::symmetric(12, 4)))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(self.coordinator.status());
                    if let Some(text) = &self.hover_readout {
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            ui.monospace(text);
                        });
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            let output = plot_panel::show_plot_panel(ui, &mut self.coordinator, &self.theme, !modal);
            self.last_plot_rect = Some(output.total_rect);
            self.hover_readout = output.hover;
        });

        self.handle_toolbar(ctx, action);

        // ------------------------------------------------------------------
        // 4. Poll async file loads
        // ------------------------------------------------------------------
        if !modal {
            self.poll_loads();
        }
        if !self.pending_loads.is_empty() {
            egui::Window::new("Loading")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label(format!("Loading {} file(s)...", self.pending_loads.len()));
                    });
                });
            ctx.request_repaint();
        }

        // ------------------------------------------------------------------
        // 5. Dialogs
        // ------------------------------------------------------------------
        if let Some(prompt) = self.coordinator.pending().map(|p| p.prompt()) {
            if let Some(accept) = confirm_dialog::show_confirm_dialog(ctx, &prompt) {
                self.coordinator.confirm_pending(accept);
            }
        }

        let mut close_background = false;
        if let Some(state) = &mut self.background_dialog {
            match background_dialog::show_background_dialog(ctx, state) {
                Some(DialogResult::Ok(windows)) => {
                    if self.coordinator.targets_current(&state.targets()) {
                        let _ = self.coordinator.subtract_background(&windows);
                    } else {
                        tracing::warn!("Datasets changed while the background dialog was open");
                        self.coordinator
                            .set_status("Datasets changed, background windows discarded");
                    }
                    close_background = true;
                }
                Some(DialogResult::Cancel) => close_background = true,
                None => {} // dialog still open
            }
        }
        if close_background {
            self.background_dialog = None;
        }
    }
}
