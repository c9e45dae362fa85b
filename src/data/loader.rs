use std::path::Path;

use crate::data::parser::{self, Delimiter};
use crate::data::table::{Cell, Dataset, Table};
use crate::error::DataError;

/// Lines skipped before the data block of a VSM export.
const VSM_HEADER_LINES: usize = 31;
/// Field and moment columns of a VSM export.
const VSM_COLUMNS: [(usize, &str); 2] = [(3, "B (Oe)"), (4, "M (emu)")];

/// How a file was interpreted, for the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFormat {
    Excel,
    Vsm,
    Delimited(Delimiter),
}

impl SourceFormat {
    pub fn describe(&self) -> String {
        match self {
            SourceFormat::Excel => "Excel workbook".to_string(),
            SourceFormat::Vsm => "VSM export".to_string(),
            SourceFormat::Delimited(d) => format!("{}-separated text", d.label()),
        }
    }
}

/// A parsed file ready to hand to the session.
pub struct LoadedData {
    pub dataset: Dataset,
    pub format: SourceFormat,
    /// Text encoding the file was decoded with; `None` for workbooks.
    pub encoding: Option<&'static str>,
}

/// Load a text or Excel file into a dataset.
pub fn load_file(path: &Path) -> Result<LoadedData, DataError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let (table, format, encoding) = match ext.as_str() {
        "xls" | "xlsx" => (load_excel(path)?, SourceFormat::Excel, None),
        _ => {
            let bytes = std::fs::read(path)?;
            let (text, encoding) = parser::decode_text(&bytes);
            let (table, format) = parse_text(&text)?;
            (table, format, Some(encoding.name()))
        }
    };

    tracing::debug!(
        "Parsed {:?} ({}): {} rows, columns {:?}",
        path,
        encoding.unwrap_or("workbook"),
        table.row_count(),
        table.column_names().collect::<Vec<_>>()
    );

    Ok(LoadedData {
        dataset: Dataset::new(path.to_string_lossy(), table),
        format,
        encoding,
    })
}

/// Parse decoded text: VSM layout if the preamble mentions it, otherwise a
/// delimited table with the first non-empty line as the header.
pub fn parse_text(text: &str) -> Result<(Table, SourceFormat), DataError> {
    let is_vsm = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(10)
        .any(|l| l.to_lowercase().contains("vsm"));
    if is_vsm {
        return Ok((parse_vsm(text)?, SourceFormat::Vsm));
    }

    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header_line = lines.next().ok_or(DataError::Empty)?;
    let data_line = lines.next().unwrap_or(header_line);
    let delimiter = parser::detect_delimiter(header_line, data_line);

    let mut records = match delimiter {
        Delimiter::Byte(b) => read_delimited(text, b)?,
        Delimiter::Whitespace => text
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| parser::split_fields(l, Delimiter::Whitespace))
            .collect(),
    };
    if records.is_empty() {
        return Err(DataError::Empty);
    }

    let headers = parser::normalize_headers(&records.remove(0));
    let rows: Vec<Vec<Cell>> = records
        .iter()
        .map(|r| r.iter().map(|s| Cell::parse(s)).collect())
        .collect();
    Ok((Table::from_rows(headers, &rows), SourceFormat::Delimited(delimiter)))
}

fn read_delimited(text: &str, delimiter: u8) -> Result<Vec<Vec<String>>, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        records.push(record.iter().map(|s| s.trim().to_string()).collect());
    }
    Ok(records)
}

fn parse_vsm(text: &str) -> Result<Table, DataError> {
    let data = text.lines().skip(VSM_HEADER_LINES).collect::<Vec<_>>().join("\n");
    let records = read_delimited(&data, b',')?;
    if records.is_empty() {
        return Err(DataError::Empty);
    }
    let headers = VSM_COLUMNS.iter().map(|(_, name)| name.to_string()).collect();
    let rows: Vec<Vec<Cell>> = records
        .iter()
        .map(|r| {
            VSM_COLUMNS
                .iter()
                .map(|(idx, _)| r.get(*idx).map_or(Cell::Empty, |s| Cell::parse(s)))
                .collect()
        })
        .collect();
    Ok(Table::from_rows(headers, &rows))
}

fn load_excel(path: &Path) -> Result<Table, DataError> {
    use calamine::{open_workbook_auto, Data, Reader};

    let mut workbook =
        open_workbook_auto(path).map_err(|e| DataError::Excel(e.to_string()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| DataError::Excel("no sheets found".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| DataError::Excel(e.to_string()))?;

    let mut rows = range.rows();
    let header_row = rows.next().ok_or(DataError::Empty)?;
    let headers: Vec<String> = header_row.iter().map(|c| c.to_string()).collect();
    let headers = parser::normalize_headers(&headers);

    let cells: Vec<Vec<Cell>> = rows
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Data::Empty => Cell::Empty,
                    Data::Float(f) => Cell::Number(*f),
                    Data::Int(i) => Cell::Number(*i as f64),
                    Data::String(s) => Cell::parse(s),
                    Data::Bool(b) => Cell::Text(b.to_string()),
                    Data::DateTime(dt) => Cell::Number(dt.as_f64()),
                    Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
                    Data::Error(e) => Cell::Text(format!("{e:?}")),
                })
                .collect()
        })
        .collect();

    Ok(Table::from_rows(headers, &cells))
}
