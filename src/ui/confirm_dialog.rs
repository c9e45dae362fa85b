/// Ask a yes/no question in a centered window.
///
/// Returns `Some(true)` for Yes, `Some(false)` for No, `None` while open.
pub fn show_confirm_dialog(ctx: &egui::Context, prompt: &str) -> Option<bool> {
    let mut answer = None;

    egui::Window::new("Confirm Deletion")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(prompt);
            ui.add_space(12.0);
            ui.horizontal(|ui| {
                let yes = egui::Button::new(egui::RichText::new("Yes").strong())
                    .min_size(egui::vec2(90.0, 30.0));
                if ui.add(yes).clicked() {
                    answer = Some(true);
                }
                if ui.add(egui::Button::new("No").min_size(egui::vec2(90.0, 30.0))).clicked() {
                    answer = Some(false);
                }
            });
        });

    if answer.is_none() {
        ctx.input(|i| {
            if i.key_pressed(egui::Key::Enter) {
                answer = Some(true);
            } else if i.key_pressed(egui::Key::Escape) {
                answer = Some(false);
            }
        });
    }

    answer
}
