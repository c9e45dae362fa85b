use crate::render::plot_interaction::{self, PlotViewState, ScrollDirection};
use crate::render::series::PlotFrame;
use crate::state::coordinator::{Highlight, SessionCoordinator};
use crate::state::theme::Theme;

/// What the plot panel reports back to the app each frame.
pub struct PlotPanelOutput {
    /// Whole panel area including axes, for cropping screenshots.
    pub total_rect: egui::Rect,
    /// Cursor readout in data coordinates, when hovering the plot.
    pub hover: Option<String>,
}

/// Render the plot and, when `interactive`, route pointer input to the
/// coordinator.
pub fn show_plot_panel(
    ui: &mut egui::Ui,
    coordinator: &mut SessionCoordinator,
    theme: &Theme,
    interactive: bool,
) -> PlotPanelOutput {
    // --- Layout: left margin for Y axis, main plot area, bottom margin for X axis ---
    let left_margin = 80.0_f32;
    let right_margin = 20.0_f32;
    let bottom_margin = 44.0_f32;
    let top_margin = 10.0_f32;

    let available = ui.available_size();
    let total_rect = ui.allocate_space(available).1;
    let plot_rect = egui::Rect::from_min_max(
        egui::Pos2::new(total_rect.left() + left_margin, total_rect.top() + top_margin),
        egui::Pos2::new(total_rect.right() - right_margin, total_rect.bottom() - bottom_margin),
    );
    coordinator.view_mut().set_plot_rect(plot_rect);

    let painter = ui.painter_at(total_rect);
    painter.rect_filled(plot_rect, 0.0, theme.plot_bg());

    if coordinator.session().is_empty() {
        painter.text(
            plot_rect.center(),
            egui::Align2::CENTER_CENTER,
            "Open or drag-and-drop a data file to get started.",
            egui::FontId::proportional(15.0),
            ui.visuals().weak_text_color(),
        );
        return PlotPanelOutput {
            total_rect,
            hover: None,
        };
    }

    // --- Handle mouse interaction ---
    let response = ui.interact(plot_rect, egui::Id::new("plot_area"), egui::Sense::click_and_drag());
    if interactive {
        route_pointer_input(ui, &response, coordinator);
    }

    // --- Grid, series, overlays ---
    let view = coordinator.view();
    let x_grid = plot_interaction::compute_grid_lines(view.x_min, view.x_max);
    let y_grid = plot_interaction::compute_grid_lines(view.y_min, view.y_max);
    draw_grid(&painter, view, plot_rect, &x_grid, &y_grid, theme);

    let data_painter = painter.with_clip_rect(plot_rect);
    draw_series(&data_painter, view);
    draw_overlays(&data_painter, coordinator, theme);

    draw_axes_and_labels(&painter, view, view.frame(), plot_rect, total_rect, &x_grid, &y_grid);
    draw_legend(&painter, view.frame(), plot_rect);

    let hover = response
        .hover_pos()
        .and_then(|pos| coordinator.hover_readout(pos));

    PlotPanelOutput { total_rect, hover }
}

/// Forward this frame's pointer events. Presses only count when the plot is
/// the topmost thing under the pointer; releases and moves always do, so a
/// gesture that leaves the plot still ends.
fn route_pointer_input(ui: &egui::Ui, response: &egui::Response, coordinator: &mut SessionCoordinator) {
    let (events, scroll) = ui.input(|i| (i.raw.events.clone(), i.raw_scroll_delta.y));
    let hovered = response.hovered();

    for event in events {
        match event {
            egui::Event::PointerButton {
                pos,
                button,
                pressed: true,
                ..
            } if hovered => coordinator.pointer_pressed(button, pos),
            egui::Event::PointerButton {
                pos,
                button,
                pressed: false,
                ..
            } => coordinator.pointer_released(button, pos),
            egui::Event::PointerMoved(pos) => coordinator.pointer_moved(pos),
            _ => {}
        }
    }

    if hovered && scroll != 0.0 {
        if let Some(pos) = response.hover_pos() {
            let direction = if scroll > 0.0 {
                ScrollDirection::Up
            } else {
                ScrollDirection::Down
            };
            coordinator.scrolled(pos, direction);
        }
    }
}

fn draw_grid(
    painter: &egui::Painter,
    view: &PlotViewState,
    plot_rect: egui::Rect,
    x_grid: &[(f64, bool)],
    y_grid: &[(f64, bool)],
    theme: &Theme,
) {
    let grid = theme.grid_color();
    for &(xval, is_major) in x_grid {
        let x = view.data_to_screen(xval, view.y_min).x;
        let stroke = egui::Stroke::new(if is_major { 1.0 } else { 0.5 }, grid);
        painter.vline(x, plot_rect.y_range(), stroke);
    }
    for &(yval, is_major) in y_grid {
        let y = view.data_to_screen(view.x_min, yval).y;
        let stroke = egui::Stroke::new(if is_major { 1.0 } else { 0.5 }, grid);
        painter.hline(plot_rect.x_range(), y, stroke);
    }
}

fn draw_series(painter: &egui::Painter, view: &PlotViewState) {
    for series in &view.frame().series {
        let color = series.color32();
        for segment in &series.segments {
            let points: Vec<egui::Pos2> = segment
                .iter()
                .map(|p| view.data_to_screen(p[0], p[1]))
                .collect();
            for p in &points {
                painter.circle_filled(*p, 2.5, color);
            }
            if points.len() > 1 {
                painter.add(egui::Shape::line(points, egui::Stroke::new(1.5, color)));
            }
        }
    }
}

fn draw_overlays(painter: &egui::Painter, coordinator: &SessionCoordinator, theme: &Theme) {
    let view = coordinator.view();

    if let Some(rect) = coordinator.selection_rect() {
        let a = view.data_to_screen(rect.x_min, rect.y_min);
        let b = view.data_to_screen(rect.x_max, rect.y_max);
        let r = egui::Rect::from_two_pos(a, b);
        painter.rect_filled(r, 0.0, theme.selection_color().gamma_multiply(0.12));
        let outline = [r.left_top(), r.right_top(), r.right_bottom(), r.left_bottom(), r.left_top()];
        painter.extend(egui::Shape::dashed_line(
            &outline,
            egui::Stroke::new(1.2, theme.selection_color()),
            6.0,
            4.0,
        ));
    }

    match coordinator.highlight() {
        Some(Highlight::Hit { x, y }) => {
            let p = view.data_to_screen(x, y);
            painter.circle_stroke(p, 7.0, egui::Stroke::new(2.0, theme.highlight_color()));
        }
        Some(Highlight::Miss { x, y }) => {
            let p = view.data_to_screen(x, y);
            let stroke = egui::Stroke::new(1.5, painter.ctx().style().visuals.weak_text_color());
            painter.line_segment([p + egui::vec2(-4.0, -4.0), p + egui::vec2(4.0, 4.0)], stroke);
            painter.line_segment([p + egui::vec2(-4.0, 4.0), p + egui::vec2(4.0, -4.0)], stroke);
        }
        None => {}
    }
}

fn draw_axes_and_labels(
    painter: &egui::Painter,
    view: &PlotViewState,
    frame: &PlotFrame,
    plot_rect: egui::Rect,
    total_rect: egui::Rect,
    x_grid: &[(f64, bool)],
    y_grid: &[(f64, bool)],
) {
    let text_color = painter.ctx().style().visuals.text_color();
    let dim_color = text_color.gamma_multiply(0.6);

    // --- Plot border ---
    painter.rect_stroke(plot_rect, 0.0, egui::Stroke::new(1.0, dim_color), egui::StrokeKind::Outside);

    // --- X-axis tick labels ---
    for &(xval, is_major) in x_grid {
        if !is_major {
            continue;
        }
        let screen_x = view.data_to_screen(xval, view.y_min).x;
        if screen_x < plot_rect.left() || screen_x > plot_rect.right() {
            continue;
        }
        painter.text(
            egui::Pos2::new(screen_x, plot_rect.bottom() + 4.0),
            egui::Align2::CENTER_TOP,
            plot_interaction::format_tick_value(xval),
            egui::FontId::proportional(10.0),
            dim_color,
        );
    }

    painter.text(
        egui::Pos2::new(plot_rect.center().x, total_rect.bottom() - 4.0),
        egui::Align2::CENTER_BOTTOM,
        &frame.x_label,
        egui::FontId::proportional(12.0),
        text_color,
    );

    // --- Y-axis tick labels ---
    for &(yval, is_major) in y_grid {
        if !is_major {
            continue;
        }
        let screen_y = view.data_to_screen(view.x_min, yval).y;
        if screen_y < plot_rect.top() || screen_y > plot_rect.bottom() {
            continue;
        }
        painter.text(
            egui::Pos2::new(plot_rect.left() - 4.0, screen_y),
            egui::Align2::RIGHT_CENTER,
            plot_interaction::format_tick_value(yval),
            egui::FontId::proportional(10.0),
            dim_color,
        );
    }

    painter.text(
        egui::Pos2::new(total_rect.left() + 2.0, plot_rect.top()),
        egui::Align2::LEFT_BOTTOM,
        &frame.y_label,
        egui::FontId::proportional(12.0),
        text_color,
    );
}

// ---------------------------------------------------------------------------
// Legend
// ---------------------------------------------------------------------------

fn draw_legend(painter: &egui::Painter, frame: &PlotFrame, plot_rect: egui::Rect) {
    if frame.series.is_empty() {
        return;
    }

    let text_color = painter.ctx().style().visuals.text_color();
    let bg_color = painter.ctx().style().visuals.window_fill;
    let mut y = plot_rect.top() + 8.0;
    let x = plot_rect.right() - 8.0;

    let font = egui::FontId::proportional(11.0);
    let max_width = frame
        .series
        .iter()
        .map(|s| {
            painter
                .layout_no_wrap(s.label.clone(), font.clone(), text_color)
                .rect
                .width()
        })
        .fold(0.0_f32, f32::max);

    let legend_width = max_width + 24.0; // color swatch + padding
    let legend_height = frame.series.len() as f32 * 16.0 + 8.0;

    let legend_rect = egui::Rect::from_min_size(
        egui::Pos2::new(x - legend_width - 4.0, y - 4.0),
        egui::Vec2::new(legend_width + 8.0, legend_height),
    );
    painter.rect_filled(legend_rect, 4.0, bg_color.gamma_multiply(0.85));
    painter.rect_stroke(
        legend_rect,
        4.0,
        egui::Stroke::new(0.5, text_color.gamma_multiply(0.3)),
        egui::StrokeKind::Outside,
    );

    for series in &frame.series {
        let swatch_rect = egui::Rect::from_min_size(
            egui::Pos2::new(x - legend_width, y),
            egui::Vec2::new(12.0, 12.0),
        );
        painter.rect_filled(swatch_rect, 2.0, series.color32());
        painter.text(
            egui::Pos2::new(x - legend_width + 16.0, y + 6.0),
            egui::Align2::LEFT_CENTER,
            &series.label,
            font.clone(),
            text_color,
        );
        y += 16.0;
    }
}
