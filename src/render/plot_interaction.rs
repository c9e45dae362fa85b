use crate::render::series::{DataBounds, PlotFrame};
use crate::state::session::Session;

/// Direction of one scroll-wheel notch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    /// Wheel away from the user: zoom in.
    Up,
    /// Wheel toward the user: zoom out.
    Down,
}

/// View state for the plot. Tracks the visible data window, the screen
/// rectangle it is drawn into, and handles pan/zoom interaction.
#[derive(Debug, Clone)]
pub struct PlotViewState {
    /// Current view bounds in data coordinates
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    /// Screen area of the plot as laid out in the last frame.
    pub plot_rect: egui::Rect,
    /// Track if we've ever been fitted to data
    pub initialized: bool,
    /// Last pointer position while a secondary-button pan is active.
    last_mouse_pos: Option<egui::Pos2>,
    frame: PlotFrame,
}

impl Default for PlotViewState {
    fn default() -> Self {
        Self {
            x_min: 0.0,
            x_max: 1.0,
            y_min: 0.0,
            y_max: 1.0,
            plot_rect: egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(800.0, 600.0)),
            initialized: false,
            last_mouse_pos: None,
            frame: PlotFrame::default(),
        }
    }
}

impl PlotViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(&self) -> &PlotFrame {
        &self.frame
    }

    /// Visible window as `(x_min, x_max, y_min, y_max)`.
    pub fn window(&self) -> (f64, f64, f64, f64) {
        (self.x_min, self.x_max, self.y_min, self.y_max)
    }

    pub fn set_plot_rect(&mut self, rect: egui::Rect) {
        self.plot_rect = rect;
    }

    pub fn contains(&self, pos: egui::Pos2) -> bool {
        self.plot_rect.contains(pos)
    }

    /// Rebuild the plotted series from the session. With `preserve_view`
    /// the current window is kept, otherwise the view is refit to the data.
    pub fn redraw(&mut self, session: &Session, preserve_view: bool, padding: f64) {
        self.frame = PlotFrame::build(session);
        if preserve_view {
            return;
        }
        if let Some(bounds) = self.frame.bounds() {
            self.fit_to_bounds(bounds, padding);
        }
    }

    /// Fit the view bounds to the data extent with `padding` (a fraction of
    /// the span) on each side. A zero span is widened by 0.5 either way.
    pub fn fit_to_bounds(&mut self, bounds: DataBounds, padding: f64) {
        let x_pad = (bounds.x_max - bounds.x_min) * padding;
        let y_pad = (bounds.y_max - bounds.y_min) * padding;
        let x_pad = if x_pad.abs() < 1e-15 { 0.5 } else { x_pad };
        let y_pad = if y_pad.abs() < 1e-15 { 0.5 } else { y_pad };

        self.x_min = bounds.x_min - x_pad;
        self.x_max = bounds.x_max + x_pad;
        self.y_min = bounds.y_min - y_pad;
        self.y_max = bounds.y_max + y_pad;
        self.initialized = true;
    }

    pub fn begin_pan(&mut self, pos: egui::Pos2) {
        self.last_mouse_pos = Some(pos);
    }

    pub fn end_pan(&mut self) {
        self.last_mouse_pos = None;
    }

    pub fn is_panning(&self) -> bool {
        self.last_mouse_pos.is_some()
    }

    /// Shift the window so the data under the pointer follows it.
    pub fn pan_to(&mut self, pos: egui::Pos2) {
        let Some(last) = self.last_mouse_pos else {
            return;
        };
        let rect = self.plot_rect;
        let delta = pos - last;
        let dx = -(delta.x as f64) * (self.x_max - self.x_min) / rect.width() as f64;
        let dy = (delta.y as f64) * (self.y_max - self.y_min) / rect.height() as f64;
        self.x_min += dx;
        self.x_max += dx;
        self.y_min += dy;
        self.y_max += dy;
        self.last_mouse_pos = Some(pos);
    }

    /// Zoom by `step` per notch, keeping the data point under `pos` fixed.
    pub fn zoom_at(&mut self, pos: egui::Pos2, direction: ScrollDirection, step: f64) {
        let zoom_factor = match direction {
            ScrollDirection::Up => 1.0 / step,
            ScrollDirection::Down => step,
        };
        let (cx, cy) = self.screen_to_data(pos);
        self.x_min = cx + (self.x_min - cx) * zoom_factor;
        self.x_max = cx + (self.x_max - cx) * zoom_factor;
        self.y_min = cy + (self.y_min - cy) * zoom_factor;
        self.y_max = cy + (self.y_max - cy) * zoom_factor;
    }

    /// Convert screen position to data coordinates.
    pub fn screen_to_data(&self, pos: egui::Pos2) -> (f64, f64) {
        let rect = self.plot_rect;
        let t_x = (pos.x - rect.left()) as f64 / rect.width() as f64;
        let t_y = 1.0 - (pos.y - rect.top()) as f64 / rect.height() as f64;
        let data_x = self.x_min + t_x * (self.x_max - self.x_min);
        let data_y = self.y_min + t_y * (self.y_max - self.y_min);
        (data_x, data_y)
    }

    /// Data coordinates to screen pixels, kept in `f64` for distance tests.
    pub fn data_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let rect = self.plot_rect;
        let t_x = (x - self.x_min) / (self.x_max - self.x_min);
        let t_y = 1.0 - (y - self.y_min) / (self.y_max - self.y_min);
        (
            rect.left() as f64 + t_x * rect.width() as f64,
            rect.top() as f64 + t_y * rect.height() as f64,
        )
    }

    /// Convert data coordinates to screen position.
    pub fn data_to_screen(&self, x: f64, y: f64) -> egui::Pos2 {
        let (px, py) = self.data_to_pixel(x, y);
        egui::Pos2::new(px as f32, py as f32)
    }
}

/// Compute nice grid line positions for an axis range.
/// Returns (value, is_major) pairs.
pub fn compute_grid_lines(min: f64, max: f64) -> Vec<(f64, bool)> {
    let range = max - min;
    if range <= 0.0 || !range.is_finite() {
        return Vec::new();
    }

    let raw_step = range / 8.0;
    let order = 10f64.powf(raw_step.log10().floor());
    let normalized = raw_step / order;

    let nice_step = if normalized <= 1.0 {
        order
    } else if normalized <= 2.0 {
        2.0 * order
    } else if normalized <= 5.0 {
        5.0 * order
    } else {
        10.0 * order
    };

    let minor_step = nice_step / 5.0;

    let start = (min / minor_step).floor() as i64;
    let end = (max / minor_step).ceil() as i64;

    let mut lines = Vec::new();
    for i in start..=end {
        let val = i as f64 * minor_step;
        if val >= min && val <= max {
            let is_major = ((val / nice_step).round() * nice_step - val).abs() < nice_step * 0.01;
            lines.push((val, is_major));
        }
    }
    lines
}

/// Format a numeric value for axis tick labels and the cursor readout.
pub fn format_tick_value(val: f64) -> String {
    if val.abs() >= 1e6 || (val != 0.0 && val.abs() < 1e-3) {
        format!("{val:.2e}")
    } else if val == 0.0 {
        "0".to_string()
    } else {
        let s = format!("{val:.6}");
        let s = s.trim_end_matches('0');
        let s = s.trim_end_matches('.');
        s.to_string()
    }
}
