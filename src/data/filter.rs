use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::model::{Dataset, DateRange, Record};

// ---------------------------------------------------------------------------
// Filter predicate: date range plus selected products / departments
// ---------------------------------------------------------------------------

/// Caller-owned filter selection. Passed into every filter call; the engine
/// keeps no state of its own.
///
/// An empty product or department set means "no restriction".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub range: DateRange,
    pub products: BTreeSet<String>,
    pub departments: BTreeSet<String>,
}

impl FilterState {
    /// Initialise a [`FilterState`] covering the whole dataset with every
    /// product and department selected.
    pub fn for_dataset(dataset: &Dataset) -> Self {
        Self {
            range: dataset.bounds.unwrap_or_else(DateRange::unbounded),
            products: dataset.products.clone(),
            departments: dataset.departments.clone(),
        }
    }

    pub fn start_date(&self) -> NaiveDate {
        self.range.start
    }

    pub fn end_date(&self) -> NaiveDate {
        self.range.end
    }

    /// Whether a record passes every active filter.
    pub fn matches(&self, record: &Record) -> bool {
        self.range.contains(record.date)
            && (self.products.is_empty() || self.products.contains(&record.product))
            && (self.departments.is_empty() || self.departments.contains(&record.department))
    }
}

/// Return indices of records that pass the filter, in dataset order.
pub fn filtered_indices(dataset: &Dataset, filter: &FilterState) -> Vec<usize> {
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| filter.matches(rec))
        .map(|(i, _)| i)
        .collect()
}

/// The filtered relation as borrowed rows. Empty when nothing matches.
pub fn apply_filter<'a>(dataset: &'a Dataset, filter: &FilterState) -> Vec<&'a Record> {
    dataset
        .records
        .iter()
        .filter(|rec| filter.matches(rec))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn rec(date: NaiveDate, product: &str, dept: &str, volume: f64) -> Record {
        Record {
            date,
            product: product.into(),
            department: dept.into(),
            sector: "SEC1".into(),
            volume: Some(volume),
        }
    }

    fn dataset() -> Dataset {
        Dataset::from_records(vec![
            rec(d(2024, 1, 1), "PRODA", "DEPT1", 1.0),
            rec(d(2024, 1, 15), "PRODB", "DEPT1", 2.0),
            rec(d(2024, 1, 31), "PRODA", "DEPT2", 3.0),
            rec(d(2024, 2, 1), "PRODC", "DEPT3", 4.0),
        ])
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let ds = dataset();
        let filter = FilterState {
            range: DateRange::new(d(2024, 1, 1), d(2024, 1, 31)),
            products: BTreeSet::new(),
            departments: BTreeSet::new(),
        };
        assert_eq!(filtered_indices(&ds, &filter), vec![0, 1, 2]);
        for r in apply_filter(&ds, &filter) {
            assert!(filter.range.contains(r.date));
        }
    }

    #[test]
    fn test_empty_selection_equals_full_selection() {
        let ds = dataset();
        let all = FilterState::for_dataset(&ds);
        let none = FilterState {
            products: BTreeSet::new(),
            departments: BTreeSet::new(),
            ..all.clone()
        };
        assert_eq!(apply_filter(&ds, &all), apply_filter(&ds, &none));
        assert_eq!(apply_filter(&ds, &all).len(), ds.len());
    }

    #[test]
    fn test_product_and_department_selection() {
        let ds = dataset();
        let mut filter = FilterState::for_dataset(&ds);
        filter.products = set(&["PRODA"]);
        assert_eq!(filtered_indices(&ds, &filter), vec![0, 2]);

        filter.departments = set(&["DEPT2"]);
        assert_eq!(filtered_indices(&ds, &filter), vec![2]);
    }

    #[test]
    fn test_selection_is_case_sensitive() {
        let ds = dataset();
        let mut filter = FilterState::for_dataset(&ds);
        filter.products = set(&["proda"]);
        assert!(apply_filter(&ds, &filter).is_empty());
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let ds = dataset();
        let mut filter = FilterState::for_dataset(&ds);
        filter.range = DateRange::new(d(2030, 1, 1), d(2030, 12, 31));
        assert!(apply_filter(&ds, &filter).is_empty());
        assert!(filtered_indices(&ds, &filter).is_empty());
    }

    #[test]
    fn test_filter_does_not_touch_dataset() {
        let ds = dataset();
        let before = ds.clone();
        let mut filter = FilterState::for_dataset(&ds);
        filter.products = set(&["PRODC"]);
        let _ = apply_filter(&ds, &filter);
        assert_eq!(ds, before);
    }

    #[test]
    fn test_for_empty_dataset_is_unbounded() {
        let ds = Dataset::from_records(Vec::new());
        let filter = FilterState::for_dataset(&ds);
        assert_eq!(filter.range, DateRange::unbounded());
        assert!(filter.products.is_empty());
    }
}
