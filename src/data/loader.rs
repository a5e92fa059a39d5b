use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Date32Type, Float64Type};
use calamine::{Data, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use crate::config::{Normalization, SourceConfig};

use super::error::{LoadError, Result};
use super::model::{
    Dataset, COL_DATE, COL_DEPARTMENT, COL_PRODUCT, COL_SECTOR, COL_VOLUME,
};
use super::normalize::{excel_serial_to_date, normalize_rows, Cell, RawRow};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the dataset described by a [`SourceConfig`].
pub fn load_source(source: &SourceConfig) -> Result<Dataset> {
    load_file(&source.path, &source.sheet, &source.normalization)
}

/// Load a dataset from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xlsb` / `.xls` / `.ods` – workbook, read from `sheet`
/// * `.csv`     – header row; `;` or `,` delimiter, sniffed from the header
/// * `.json`    – `[{ "FECHA": ..., "PROD": ..., ... }, ...]`
/// * `.parquet` – one column per field, any Arrow date/number/string type
pub fn load_file(path: &Path, sheet: &str, rules: &Normalization) -> Result<Dataset> {
    check_source(path)?;

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let rows = match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(path, sheet)?,
        "csv" => read_csv(path)?,
        "json" => read_json(path)?,
        "parquet" | "pq" => read_parquet(path)?,
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };

    let dataset = normalize_rows(rows, rules)?;

    log::info!(
        "Loaded {} rows from {} ({} products, {} departments)",
        dataset.len(),
        path.display(),
        dataset.products.len(),
        dataset.departments.len()
    );
    if dataset.excluded_rows > 0 {
        log::info!(
            "Dropped {} rows of excluded products {:?}",
            dataset.excluded_rows,
            rules.excluded_products
        );
    }
    if let Some(first) = dataset.warnings.first() {
        log::warn!(
            "{} {COL_VOLUME} values could not be read and were left empty (first: {first})",
            dataset.warnings.len()
        );
    }

    Ok(dataset)
}

/// Tell "absent" and "zero length" apart before any parser sees the file.
fn check_source(path: &Path) -> Result<()> {
    let meta = match std::fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(LoadError::SourceNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(LoadError::Io(e)),
    };
    if meta.len() == 0 {
        return Err(LoadError::SourceEmpty(path.to_path_buf()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Column lookup shared by every format
// ---------------------------------------------------------------------------

/// Position of each required column in the source header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnIndex {
    date: usize,
    product: usize,
    department: usize,
    sector: usize,
    volume: usize,
}

impl ColumnIndex {
    /// Header names are matched ignoring surrounding whitespace and ASCII case.
    fn locate<S: AsRef<str>>(headers: &[S]) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| {
                    h.as_ref()
                        .trim_start_matches('\u{feff}')
                        .trim()
                        .eq_ignore_ascii_case(name)
                })
                .ok_or_else(|| LoadError::MissingColumn(name.to_string()))
        };
        Ok(ColumnIndex {
            date: find(COL_DATE)?,
            product: find(COL_PRODUCT)?,
            department: find(COL_DEPARTMENT)?,
            sector: find(COL_SECTOR)?,
            volume: find(COL_VOLUME)?,
        })
    }

    fn positions(&self) -> [usize; 5] {
        [self.date, self.product, self.department, self.sector, self.volume]
    }

    /// Build a [`RawRow`] by asking `cell` for each required column position.
    fn project(&self, row: usize, mut cell: impl FnMut(usize) -> Cell) -> RawRow {
        RawRow {
            row,
            date: cell(self.date),
            product: cell(self.product),
            department: cell(self.department),
            sector: cell(self.sector),
            volume: cell(self.volume),
        }
    }
}

// ---------------------------------------------------------------------------
// Workbook loader (calamine)
// ---------------------------------------------------------------------------

fn ensure_sheet(path: &Path, names: &[String], sheet: &str) -> Result<()> {
    if names.iter().any(|n| n == sheet) {
        Ok(())
    } else {
        Err(LoadError::SheetNotFound {
            path: path.to_path_buf(),
            sheet: sheet.to_string(),
            available: names.to_vec(),
        })
    }
}

fn read_workbook(path: &Path, sheet: &str) -> Result<Vec<RawRow>> {
    let mut workbook = calamine::open_workbook_auto(path)?;
    ensure_sheet(path, &workbook.sheet_names(), sheet)?;
    let range = workbook.worksheet_range(sheet)?;

    // Source rows are reported 1-based, relative to the sheet, not the range.
    let first_row = range.start().map_or(0, |(r, _)| r as usize) + 1;

    let mut rows = range.rows();
    let header: Vec<String> = match rows.next() {
        Some(cells) => cells.iter().map(|c| c.to_string()).collect(),
        None => return Err(LoadError::MissingColumn(COL_DATE.to_string())),
    };
    let columns = ColumnIndex::locate(&header)?;

    Ok(rows
        .enumerate()
        .map(|(i, cells)| {
            columns.project(first_row + i + 1, |pos| {
                cells.get(pos).map_or(Cell::Empty, workbook_cell)
            })
        })
        .collect())
}

fn workbook_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()).map_or(Cell::Empty, Cell::Date),
        Data::DateTimeIso(s) => Cell::Text(s.clone()),
        other => Cell::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Spreadsheet exports with decimal commas use `;` between fields.
fn sniff_delimiter(path: &Path) -> Result<u8> {
    let mut header = String::new();
    BufReader::new(File::open(path)?).read_line(&mut header)?;
    let semicolons = header.matches(';').count();
    let commas = header.matches(',').count();
    Ok(if semicolons > commas { b';' } else { b',' })
}

fn text_cell(s: &str) -> Cell {
    if s.trim().is_empty() {
        Cell::Empty
    } else {
        Cell::Text(s.to_string())
    }
}

fn read_csv(path: &Path) -> Result<Vec<RawRow>> {
    let delimiter = sniff_delimiter(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let columns = ColumnIndex::locate(&headers)?;

    let mut rows = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result?;
        rows.push(columns.project(i + 2, |pos| {
            record.get(pos).map_or(Cell::Empty, text_cell)
        }));
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "FECHA": "2024-01-05", "PROD": "PRODA", "DEPARTAMENTO": "DEPT1",
///     "SECTOR": "SEC1", "VOLUMEN": "1.234,50" },
///   ...
/// ]
/// ```
///
/// Rows are numbered from 1 in record order.
fn read_json(path: &Path) -> Result<Vec<RawRow>> {
    let text = std::fs::read_to_string(path)?;
    let root: JsonValue = serde_json::from_str(&text)?;
    let records = root
        .as_array()
        .ok_or_else(|| LoadError::Other("expected a top-level JSON array of records".into()))?;

    let keys = [COL_DATE, COL_PRODUCT, COL_DEPARTMENT, COL_SECTOR, COL_VOLUME];
    let columns = ColumnIndex::locate(&keys)?;

    let mut rows = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| LoadError::Other(format!("record {} is not a JSON object", i + 1)))?;
        rows.push(columns.project(i + 1, |pos| {
            // Keys match in any case, like spreadsheet headers.
            obj.iter()
                .find(|(k, _)| k.trim().eq_ignore_ascii_case(keys[pos]))
                .map_or(Cell::Empty, |(_, v)| json_cell(v))
        }));
    }
    Ok(rows)
}

fn json_cell(val: &JsonValue) -> Cell {
    match val {
        JsonValue::Null => Cell::Empty,
        JsonValue::String(s) => text_cell(s),
        JsonValue::Number(n) => n.as_f64().map_or(Cell::Empty, Cell::Number),
        other => Cell::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with the five required columns.
///
/// Dates may be Date32/Date64/Timestamp or text; volumes any numeric type
/// or text; categorical columns any type (numbers become codes).
fn read_parquet(path: &Path) -> Result<Vec<RawRow>> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut rows = Vec::new();
    let mut offset = 0usize;

    for batch_result in reader {
        let batch = batch_result?;
        let schema = batch.schema();
        let names: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();
        let columns = ColumnIndex::locate(&names)?;

        let mut cells: HashMap<usize, Vec<Cell>> = HashMap::new();
        for pos in columns.positions() {
            if !cells.contains_key(&pos) {
                cells.insert(pos, column_cells(batch.column(pos))?);
            }
        }

        for r in 0..batch.num_rows() {
            rows.push(columns.project(offset + r + 2, |pos| {
                cells
                    .get(&pos)
                    .and_then(|col| col.get(r))
                    .cloned()
                    .unwrap_or(Cell::Empty)
            }));
        }
        offset += batch.num_rows();
    }
    Ok(rows)
}

/// Convert one Arrow column into cells.
fn column_cells(col: &ArrayRef) -> Result<Vec<Cell>> {
    let n = col.len();
    let cells = match col.data_type() {
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => {
            let dates = cast(col, &DataType::Date32)?;
            let dates = dates.as_primitive::<Date32Type>();
            (0..n)
                .map(|i| {
                    if dates.is_null(i) {
                        Cell::Empty
                    } else {
                        dates.value_as_date(i).map_or(Cell::Empty, Cell::Date)
                    }
                })
                .collect()
        }
        dt if dt.is_numeric() => {
            let nums = cast(col, &DataType::Float64)?;
            let nums = nums.as_primitive::<Float64Type>();
            (0..n)
                .map(|i| {
                    if nums.is_null(i) {
                        Cell::Empty
                    } else {
                        Cell::Number(nums.value(i))
                    }
                })
                .collect()
        }
        _ => {
            let text = cast(col, &DataType::Utf8)?;
            let text = text.as_string::<i32>();
            (0..n)
                .map(|i| {
                    if text.is_null(i) {
                        Cell::Empty
                    } else {
                        text_cell(text.value(i))
                    }
                })
                .collect()
        }
    };
    Ok(cells)
}
