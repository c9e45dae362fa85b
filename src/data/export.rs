use std::io::Write;
use std::path::Path;

use rust_xlsxwriter::Workbook;

use crate::data::table::{Cell, Dataset};
use crate::error::DataError;

/// Characters Excel refuses in sheet names.
const SHEET_NAME_FORBIDDEN: [char; 8] = ['[', ']', ':', '*', '?', '/', '\\', '\''];

/// Write every dataset to `path`.
///
/// `.xlsx` gets one sheet per dataset. `.csv` is one comma separated file
/// and anything else one tab separated file; there each dataset is preceded
/// by a `# File: <name>` line and followed by a blank line.
pub fn export_datasets(path: &Path, datasets: &[Dataset]) -> Result<(), DataError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    let delimiter = match ext.as_str() {
        "xlsx" => {
            write_workbook(path, datasets)?;
            tracing::info!("Exported {} sheet(s) to {:?}", datasets.len(), path);
            return Ok(());
        }
        "xls" => return Err(DataError::Unsupported(ext)),
        "csv" => b',',
        _ => b'\t',
    };

    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
    write_datasets(&mut file, datasets, delimiter)?;
    file.flush()?;
    tracing::info!("Exported {} dataset(s) to {:?}", datasets.len(), path);
    Ok(())
}

/// Sheet name for the `index`-th dataset: `<index>_<first 20 chars of the
/// file name>`, with characters Excel rejects replaced by `_`.
pub fn sheet_name(index: usize, file_name: &str) -> String {
    let stem: String = file_name
        .chars()
        .take(20)
        .map(|c| if SHEET_NAME_FORBIDDEN.contains(&c) { '_' } else { c })
        .collect();
    format!("{index}_{stem}")
}

fn write_workbook(path: &Path, datasets: &[Dataset]) -> Result<(), DataError> {
    let mut workbook = Workbook::new();
    for (index, dataset) in datasets.iter().enumerate() {
        let sheet = workbook.add_worksheet();
        sheet.set_name(sheet_name(index, &dataset.file_name()))?;
        for (col, column) in dataset.table.columns().iter().enumerate() {
            let col = col as u16;
            sheet.write_string(0, col, column.name.as_str())?;
            for (row, cell) in column.cells.iter().enumerate() {
                let row = row as u32 + 1;
                match cell {
                    Cell::Number(v) if v.is_finite() => {
                        sheet.write_number(row, col, *v)?;
                    }
                    Cell::Text(text) => {
                        sheet.write_string(row, col, text.as_str())?;
                    }
                    Cell::Number(_) | Cell::Empty => {}
                }
            }
        }
    }
    workbook.save(path)?;
    Ok(())
}

pub fn write_datasets<W: Write>(
    out: &mut W,
    datasets: &[Dataset],
    delimiter: u8,
) -> Result<(), DataError> {
    for dataset in datasets {
        writeln!(out, "# File: {}", dataset.file_name())?;
        {
            let mut writer = csv::WriterBuilder::new()
                .delimiter(delimiter)
                .from_writer(&mut *out);
            let table = &dataset.table;
            writer.write_record(table.column_names())?;
            for row in 0..table.row_count() {
                writer.write_record(table.columns().iter().map(|c| c.cells[row].to_string()))?;
            }
            writer.flush()?;
        }
        writeln!(out)?;
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::table::{Column, Table};

    #[test]
    fn one_block_per_dataset() {
        let a = Dataset::new(
            "/data/a.csv",
            Table::new(vec![
                Column::numeric("x", &[1.0, 2.0]),
                Column::new("y", vec![Cell::Number(0.5), Cell::Empty]),
            ]),
        );
        let b = Dataset::new("b.txt", Table::new(vec![Column::numeric("x", &[3.0])]));

        let mut buf = Vec::new();
        write_datasets(&mut buf, &[a, b], b',').unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "# File: a.csv\nx,y\n1,0.5\n2,\n\n\n# File: b.txt\nx\n3\n\n\n");
    }

    #[test]
    fn sheet_names_are_indexed_and_sanitized() {
        assert_eq!(sheet_name(0, "loop.csv"), "0_loop.csv");
        assert_eq!(sheet_name(3, "a very long measurement file.txt"), "3_a very long measurem");
        assert_eq!(sheet_name(1, "[run]*1?.csv"), "1__run__1_.csv");
    }

    #[test]
    fn xlsx_export_writes_one_sheet_per_dataset() {
        use calamine::{open_workbook_auto, Data, Reader};

        let a = Dataset::new(
            "/data/a.csv",
            Table::new(vec![
                Column::numeric("H", &[1.0, 2.0]),
                Column::new("M", vec![Cell::Number(0.5), Cell::Text("sat".into())]),
            ]),
        );
        let b = Dataset::new("/data/b.txt", Table::new(vec![Column::numeric("T", &[300.0])]));

        let path = std::env::temp_dir().join(format!("instplot-export-{}.xlsx", std::process::id()));
        export_datasets(&path, &[a, b]).unwrap();

        let mut workbook = open_workbook_auto(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["0_a.csv".to_string(), "1_b.txt".to_string()]);
        let first = workbook.worksheet_range("0_a.csv").unwrap();
        assert_eq!(first.get_value((0, 1)), Some(&Data::String("M".into())));
        assert_eq!(first.get_value((1, 0)), Some(&Data::Float(1.0)));
        assert_eq!(first.get_value((2, 1)), Some(&Data::String("sat".into())));
        let second = workbook.worksheet_range("1_b.txt").unwrap();
        assert_eq!(second.get_value((1, 0)), Some(&Data::Float(300.0)));
        std::fs::remove_file(&path).ok();
    }
}
