//! Interactive editing of measurement curves: load several tabular files,
//! plot one column against another, and clean the data in place (delete
//! points, center, normalize, subtract a linear background) with undo.

pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod processing;
pub mod render;
pub mod state;
pub mod ui;
