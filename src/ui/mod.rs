pub mod background_dialog;
pub mod confirm_dialog;
pub mod plot_panel;
pub mod toolbar;
