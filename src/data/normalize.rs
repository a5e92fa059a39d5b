use std::borrow::Cow;

use chrono::{Days, NaiveDate};

use crate::config::Normalization;

use super::error::{LoadError, Result};
use super::model::{
    CoercionWarning, Dataset, Record, COL_DATE, COL_DEPARTMENT, COL_PRODUCT,
};

// ---------------------------------------------------------------------------
// Cell – a source value before normalization
// ---------------------------------------------------------------------------

/// A raw value as read by one of the format readers.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Cell {
    /// Text used in error and warning messages.
    pub fn raw_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(v) => number_label(*v),
            Cell::Date(d) => d.to_string(),
        }
    }
}

/// One source row, already projected onto the five required columns.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// 1-based row in the source, header being row 1.
    pub row: usize,
    pub date: Cell,
    pub product: Cell,
    pub department: Cell,
    pub sector: Cell,
    pub volume: Cell,
}

impl RawRow {
    /// All five cells empty: a padding or separator line.
    pub fn is_blank(&self) -> bool {
        [&self.date, &self.product, &self.department, &self.sector, &self.volume]
            .iter()
            .all(|c| **c == Cell::Empty)
    }
}

// ---------------------------------------------------------------------------
// Volume
// ---------------------------------------------------------------------------

/// Parse a text volume. With `decimal_comma`, `.` is a thousands separator
/// and `,` the decimal separator (`"1.234,50"` → `1234.5`).
///
/// Thousands groups must have exactly three digits, so `"12.5"` is not read
/// as `125`.
pub fn parse_volume(raw: &str, decimal_comma: bool) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let canonical: Cow<'_, str> = if decimal_comma {
        Cow::Owned(decimal_comma_to_canonical(s)?)
    } else {
        Cow::Borrowed(s)
    };
    canonical.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// `"-1.234,5"` → `"-1234.5"`. `None` when the `.` grouping is malformed.
fn decimal_comma_to_canonical(s: &str) -> Option<String> {
    let (int_part, frac) = match s.split_once(',') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (s, None),
    };
    let digits = int_part.trim_start_matches(['-', '+']);
    let sign = &int_part[..int_part.len() - digits.len()];

    if digits.contains('.') {
        let mut groups = digits.split('.');
        let lead = groups.next().unwrap_or_default();
        let well_formed = (1..=3).contains(&lead.len()) && groups.all(|g| g.len() == 3);
        if !well_formed {
            return None;
        }
    }

    let mut out = format!("{sign}{}", digits.replace('.', ""));
    if let Some(frac) = frac {
        out.push('.');
        out.push_str(frac);
    }
    Some(out)
}

/// Write a volume the way the source spreadsheets do: `.` between
/// thousands, `,` before the two decimals. [`parse_volume`] reads it back.
pub fn format_volume(v: f64) -> String {
    let fixed = format!("{:.2}", v.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let is_zero = fixed.trim_start_matches(['0', '.']).is_empty();
    let sign = if v < 0.0 && !is_zero { "-" } else { "" };
    format!("{sign}{grouped},{frac_part}")
}

pub fn coerce_volume(cell: &Cell, decimal_comma: bool) -> Option<f64> {
    match cell {
        Cell::Number(v) if v.is_finite() => Some(*v),
        Cell::Text(s) => parse_volume(s, decimal_comma),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y", "%d.%m.%Y"];

/// Parse a text date. A trailing time of day (`2024-01-05 00:00:00`,
/// `2024-01-05T08:30`) is ignored.
pub fn parse_date_text(raw: &str) -> Option<NaiveDate> {
    let day_part = raw.trim().split([' ', 'T']).next()?;
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(day_part, fmt).ok())
}

/// Convert an Excel serial day number to a date.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_days(Days::new(serial.floor() as u64))
}

pub fn coerce_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Date(d) => Some(*d),
        Cell::Number(v) => excel_serial_to_date(*v),
        Cell::Text(s) => parse_date_text(s),
        Cell::Empty => None,
    }
}

// ---------------------------------------------------------------------------
// Categorical labels
// ---------------------------------------------------------------------------

/// Render a numeric code the way it was typed: `101.0` → `"101"`.
pub fn number_label(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        v.to_string()
    }
}

/// Coerce a cell to a categorical string. `None` for blank cells.
pub fn coerce_label(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Empty => None,
        Cell::Text(s) => {
            let t = s.trim();
            (!t.is_empty()).then(|| t.to_string())
        }
        Cell::Number(v) => Some(number_label(*v)),
        Cell::Date(d) => Some(d.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Rows → Dataset
// ---------------------------------------------------------------------------

fn required_label(cell: &Cell, column: &str, row: usize) -> Result<String> {
    coerce_label(cell).ok_or_else(|| LoadError::parse(column, row, "empty value"))
}

/// Turn raw rows into the canonical relation.
///
/// Fails on the first date or required label that cannot be coerced.
/// Unparseable volumes become missing and are reported as warnings.
/// Fully blank rows are skipped.
pub fn normalize_rows<I>(rows: I, rules: &Normalization) -> Result<Dataset>
where
    I: IntoIterator<Item = RawRow>,
{
    let mut records = Vec::new();
    let mut warnings = Vec::new();
    let mut excluded = 0usize;

    for raw in rows {
        if raw.is_blank() {
            continue;
        }
        let date = coerce_date(&raw.date).ok_or_else(|| {
            LoadError::parse(
                COL_DATE,
                raw.row,
                format!("'{}' is not a date", raw.date.raw_text()),
            )
        })?;
        let product = required_label(&raw.product, COL_PRODUCT, raw.row)?;
        let department = required_label(&raw.department, COL_DEPARTMENT, raw.row)?;
        let sector = coerce_label(&raw.sector).unwrap_or_default();

        if rules.is_excluded(&product) {
            excluded += 1;
            continue;
        }

        let volume = coerce_volume(&raw.volume, rules.decimal_comma);
        if volume.is_none() {
            warnings.push(CoercionWarning {
                row: raw.row,
                raw: raw.volume.raw_text(),
            });
        }

        records.push(Record {
            date,
            product,
            department,
            sector,
            volume,
        });
    }

    Ok(Dataset::from_records(records).with_diagnostics(warnings, excluded))
}
