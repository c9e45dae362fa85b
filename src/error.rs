use thiserror::Error;

/// Recoverable conditions raised by session operations.
///
/// None of these end the session: the coordinator turns every variant into
/// a status line and leaves the data untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no data loaded, open a file first")]
    NoData,
    #[error("select an X and a Y column first")]
    NoColumns,
    #[error("no dataset contains column '{column}'")]
    MissingColumn { column: String },
    #[error("no dataset has both '{x}' and '{y}'")]
    UnpairedColumns { x: String, y: String },
    #[error("nothing to undo")]
    EmptyHistory,
    #[error("background window selects no rows in dataset {dataset}")]
    DegenerateWindow { dataset: usize },
    #[error("no data point near the pointer")]
    NoSelection,
    #[error("operation had no effect")]
    NoEffect,
}

/// Failures while reading or writing data files.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("cannot read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed delimited text: {0}")]
    Csv(#[from] csv::Error),
    #[error("cannot read workbook: {0}")]
    Excel(String),
    #[error("cannot write workbook: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error("unsupported file format: .{0}")]
    Unsupported(String),
    #[error("file is empty or has only blank lines")]
    Empty,
}

/// Failures while loading the settings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings: {0}")]
    Json(#[from] serde_json::Error),
}
