pub mod plot_interaction;
pub mod series;
