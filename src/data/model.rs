use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// Source column names
// ---------------------------------------------------------------------------

pub const COL_DATE: &str = "FECHA";
pub const COL_PRODUCT: &str = "PROD";
pub const COL_DEPARTMENT: &str = "DEPARTAMENTO";
pub const COL_SECTOR: &str = "SECTOR";
pub const COL_VOLUME: &str = "VOLUMEN";

/// Every column the loader requires, in display order.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    COL_DATE,
    COL_PRODUCT,
    COL_DEPARTMENT,
    COL_SECTOR,
    COL_VOLUME,
];

// ---------------------------------------------------------------------------
// DateRange – closed calendar interval
// ---------------------------------------------------------------------------

/// A closed `[start, end]` interval of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, ordering the bounds so that `start <= end`.
    pub fn new(a: NaiveDate, b: NaiveDate) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// Inclusive on both ends.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// The widest representable range; used when a dataset has no rows.
    pub fn unbounded() -> Self {
        Self {
            start: NaiveDate::MIN,
            end: NaiveDate::MAX,
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.start, self.end)
    }
}

// ---------------------------------------------------------------------------
// CategoryColumn – the categorical dimensions of a record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CategoryColumn {
    Product,
    Department,
    Sector,
}

impl CategoryColumn {
    /// Name of the column in the source file.
    pub fn source_name(self) -> &'static str {
        match self {
            CategoryColumn::Product => COL_PRODUCT,
            CategoryColumn::Department => COL_DEPARTMENT,
            CategoryColumn::Sector => COL_SECTOR,
        }
    }
}

impl fmt::Display for CategoryColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source_name())
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the canonical relation
// ---------------------------------------------------------------------------

/// A single normalized transaction row.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub date: NaiveDate,
    pub product: String,
    pub department: String,
    pub sector: String,
    /// `None` is the missing-value marker: the source cell could not be
    /// normalized to a number.
    pub volume: Option<f64>,
}

impl Record {
    /// Value of the given categorical column.
    pub fn category(&self, column: CategoryColumn) -> &str {
        match column {
            CategoryColumn::Product => &self.product,
            CategoryColumn::Department => &self.department,
            CategoryColumn::Sector => &self.sector,
        }
    }
}

// ---------------------------------------------------------------------------
// CoercionWarning – a volume cell that became missing
// ---------------------------------------------------------------------------

/// A volume cell that could not be normalized. Recorded, never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionWarning {
    /// 1-based row in the source, counting the header as row 1.
    pub row: usize,
    pub raw: String,
}

impl fmt::Display for CoercionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.raw.is_empty() {
            write!(f, "row {}: empty {COL_VOLUME} cell", self.row)
        } else {
            write!(
                f,
                "row {}: {COL_VOLUME} value '{}' is not a number",
                self.row, self.raw
            )
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded relation
// ---------------------------------------------------------------------------

/// The canonical relation plus pre-computed dimension indices.
/// Immutable once built; filtering derives new views from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub records: Vec<Record>,
    /// Sorted distinct values per categorical column.
    pub products: BTreeSet<String>,
    pub departments: BTreeSet<String>,
    pub sectors: BTreeSet<String>,
    /// `(min, max)` of the date column; `None` for an empty relation.
    pub bounds: Option<DateRange>,
    /// Volume cells that were turned into missing values.
    pub warnings: Vec<CoercionWarning>,
    /// Rows dropped by the product exclusion set.
    pub excluded_rows: usize,
}

impl Dataset {
    /// Build the dimension indices from the loaded records.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut products = BTreeSet::new();
        let mut departments = BTreeSet::new();
        let mut sectors = BTreeSet::new();
        let mut bounds: Option<DateRange> = None;

        for rec in &records {
            products.insert(rec.product.clone());
            departments.insert(rec.department.clone());
            sectors.insert(rec.sector.clone());
            bounds = Some(match bounds {
                None => DateRange::new(rec.date, rec.date),
                Some(b) => DateRange {
                    start: b.start.min(rec.date),
                    end: b.end.max(rec.date),
                },
            });
        }

        Dataset {
            records,
            products,
            departments,
            sectors,
            bounds,
            warnings: Vec::new(),
            excluded_rows: 0,
        }
    }

    /// Attach load diagnostics.
    pub fn with_diagnostics(mut self, warnings: Vec<CoercionWarning>, excluded_rows: usize) -> Self {
        self.warnings = warnings;
        self.excluded_rows = excluded_rows;
        self
    }

    /// Sorted distinct values of a categorical column.
    pub fn distinct(&self, column: CategoryColumn) -> &BTreeSet<String> {
        match column {
            CategoryColumn::Product => &self.products,
            CategoryColumn::Department => &self.departments,
            CategoryColumn::Sector => &self.sectors,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
