use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

// ---------------------------------------------------------------------------
// Cell: a single value in a column
// ---------------------------------------------------------------------------

/// One table cell as handed over by ingestion.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    /// Classify a raw text field: blank → `Empty`, parseable → `Number`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(v) => Cell::Number(v),
            Err(_) => Cell::Text(trimmed.to_string()),
        }
    }

    /// Numeric coercion. Anything that is not a finite number is missing.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            Cell::Number(v) => *v,
            Cell::Text(s) => s.trim().parse::<f64>().ok()?,
            Cell::Empty => return None,
        };
        v.is_finite().then_some(v)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Number(v)
    }
}

impl From<Option<f64>> for Cell {
    fn from(v: Option<f64>) -> Self {
        v.map_or(Cell::Empty, Cell::Number)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(v) => write!(f, "{v}"),
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Empty => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Column / Table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }

    pub fn numeric(name: impl Into<String>, values: &[f64]) -> Self {
        Self::new(name, values.iter().copied().map(Cell::from).collect())
    }
}

/// A rectangular table of named columns. All columns have `row_count` cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Build a table, padding short columns with `Empty` so it is rectangular.
    pub fn new(mut columns: Vec<Column>) -> Self {
        let row_count = columns.iter().map(|c| c.cells.len()).max().unwrap_or(0);
        for col in &mut columns {
            col.cells.resize(row_count, Cell::Empty);
        }
        Self { columns, row_count }
    }

    /// Build a table from row-major records. Missing trailing fields become `Empty`.
    pub fn from_rows(headers: Vec<String>, rows: &[Vec<Cell>]) -> Self {
        let columns = headers
            .into_iter()
            .enumerate()
            .map(|(col_idx, name)| {
                let cells = rows
                    .iter()
                    .map(|row| row.get(col_idx).cloned().unwrap_or(Cell::Empty))
                    .collect();
                Column { name, cells }
            })
            .collect();
        Self::new(columns)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Coerce a column to numbers. `None` when the column does not exist.
    pub fn numeric(&self, name: &str) -> Option<Vec<Option<f64>>> {
        self.column(name)
            .map(|c| c.cells.iter().map(Cell::as_f64).collect())
    }

    /// Overwrite a column with numeric values. A missing value leaves a
    /// non-numeric cell as it was and blanks a numeric one. Returns `false`
    /// when the column is absent or the length does not match the table.
    pub fn set_numeric(&mut self, name: &str, values: &[Option<f64>]) -> bool {
        if values.len() != self.row_count {
            return false;
        }
        let Some(col) = self.columns.iter_mut().find(|c| c.name == name) else {
            return false;
        };
        for (cell, value) in col.cells.iter_mut().zip(values) {
            match value {
                Some(v) => *cell = Cell::Number(*v),
                None if cell.as_f64().is_some() => *cell = Cell::Empty,
                None => {}
            }
        }
        true
    }

    /// Rows where both columns coerce to numbers, as `(row, x, y)`.
    /// `None` when either column is absent.
    pub fn xy_points(&self, x_col: &str, y_col: &str) -> Option<Vec<(usize, f64, f64)>> {
        let xs = self.column(x_col)?;
        let ys = self.column(y_col)?;
        Some(
            xs.cells
                .iter()
                .zip(&ys.cells)
                .enumerate()
                .filter_map(|(row, (x, y))| Some((row, x.as_f64()?, y.as_f64()?)))
                .collect(),
        )
    }

    /// Delete the given row positions. Later rows shift down so positions
    /// stay contiguous from zero. Out-of-range and repeated positions are
    /// ignored. Returns the number of rows removed.
    pub fn remove_rows(&mut self, positions: &[usize]) -> usize {
        let doomed: BTreeSet<usize> = positions
            .iter()
            .copied()
            .filter(|&p| p < self.row_count)
            .collect();
        if doomed.is_empty() {
            return 0;
        }
        for col in &mut self.columns {
            let mut row = 0;
            col.cells.retain(|_| {
                let keep = !doomed.contains(&row);
                row += 1;
                keep
            });
        }
        self.row_count -= doomed.len();
        doomed.len()
    }
}

// ---------------------------------------------------------------------------
// Dataset: one loaded source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Path or other identifier of the source.
    pub source_id: String,
    pub table: Table,
}

impl Dataset {
    pub fn new(source_id: impl Into<String>, table: Table) -> Self {
        Self {
            source_id: source_id.into(),
            table,
        }
    }

    /// Short name for legends and dialogs: the file stem of the source.
    pub fn label(&self) -> String {
        Path::new(&self.source_id)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.source_id)
            .to_string()
    }

    /// File name (with extension) of the source.
    pub fn file_name(&self) -> String {
        Path::new(&self.source_id)
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.source_id)
            .to_string()
    }
}
