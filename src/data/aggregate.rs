use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};

use super::filter::{filtered_indices, FilterState};
use super::model::{CategoryColumn, Dataset, Record};

// ---------------------------------------------------------------------------
// Time series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Granularity {
    #[default]
    Daily,
    Monthly,
}

impl Granularity {
    /// First day of the bucket `date` falls in.
    pub fn bucket_start(self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Daily => date,
            Granularity::Monthly => date.with_day(1).unwrap_or(date),
        }
    }

    /// `YYYY-MM-DD` for days, `YYYY-MM` for months.
    pub fn label(self, bucket: NaiveDate) -> String {
        match self {
            Granularity::Daily => bucket.format("%Y-%m-%d").to_string(),
            Granularity::Monthly => bucket.format("%Y-%m").to_string(),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Daily => f.write_str("Daily"),
            Granularity::Monthly => f.write_str("Monthly"),
        }
    }
}

/// One bar of the volume-over-time chart.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeBucket {
    pub start: NaiveDate,
    pub label: String,
    pub volume: f64,
}

/// Sum volume per day or month, one entry per period present in the input,
/// in chronological order. Missing volumes are skipped.
pub fn aggregate_time_series<'a, I>(records: I, granularity: Granularity) -> Vec<TimeBucket>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut sums: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for rec in records {
        let slot = sums.entry(granularity.bucket_start(rec.date)).or_default();
        if let Some(v) = rec.volume {
            *slot += v;
        }
    }
    sums.into_iter()
        .map(|(start, volume)| TimeBucket {
            start,
            label: granularity.label(start),
            volume,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Categorical totals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub volume: f64,
}

/// Sum volume per distinct value of `column`, ordered by category name.
pub fn aggregate_by_category<'a, I>(records: I, column: CategoryColumn) -> Vec<CategoryTotal>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut sums: BTreeMap<&str, f64> = BTreeMap::new();
    for rec in records {
        let slot = sums.entry(rec.category(column)).or_default();
        if let Some(v) = rec.volume {
            *slot += v;
        }
    }
    sums.into_iter()
        .map(|(category, volume)| CategoryTotal {
            category: category.to_string(),
            volume,
        })
        .collect()
}

/// Department totals sorted ascending by volume, so the largest comes last
/// (top of a horizontal bar chart). Ties keep name order.
pub fn rank_departments<'a, I>(records: I) -> Vec<CategoryTotal>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut totals = aggregate_by_category(records, CategoryColumn::Department);
    totals.sort_by(|a, b| a.volume.total_cmp(&b.volume));
    totals
}

/// A slice of the sector pie chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Share {
    pub category: String,
    pub volume: f64,
    /// Percentage of the total, `0.0` when the total is not positive.
    pub percent: f64,
}

/// Turn category totals into percentages of their sum.
pub fn shares(totals: &[CategoryTotal]) -> Vec<Share> {
    let total: f64 = totals.iter().map(|t| t.volume).sum();
    totals
        .iter()
        .map(|t| Share {
            category: t.category.clone(),
            volume: t.volume,
            percent: if total > 0.0 { t.volume / total * 100.0 } else { 0.0 },
        })
        .collect()
}

/// Sum of all non-missing volumes.
pub fn total_volume<'a, I>(records: I) -> f64
where
    I: IntoIterator<Item = &'a Record>,
{
    records.into_iter().filter_map(|r| r.volume).sum()
}

// ---------------------------------------------------------------------------
// Report – one full recomputation pass
// ---------------------------------------------------------------------------

/// Everything the dashboard draws for one filter selection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Report {
    /// Indices into the dataset of the rows that passed the filter.
    pub rows: Vec<usize>,
    pub time_series: Vec<TimeBucket>,
    pub sector_shares: Vec<Share>,
    pub department_ranking: Vec<CategoryTotal>,
    pub total_volume: f64,
    /// Filtered rows whose volume is missing.
    pub missing_volumes: usize,
}

impl Report {
    /// Filter `dataset` and build the three chart views.
    pub fn build(dataset: &Dataset, filter: &FilterState, granularity: Granularity) -> Self {
        let rows = filtered_indices(dataset, filter);
        let view: Vec<&Record> = rows.iter().map(|&i| &dataset.records[i]).collect();

        let sectors = aggregate_by_category(view.iter().copied(), CategoryColumn::Sector);
        Report {
            time_series: aggregate_time_series(view.iter().copied(), granularity),
            sector_shares: shares(&sectors),
            department_ranking: rank_departments(view.iter().copied()),
            total_volume: total_volume(view.iter().copied()),
            missing_volumes: view.iter().filter(|r| r.volume.is_none()).count(),
            rows,
        }
    }

    /// Nothing matched the filter.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::apply_filter;
    use crate::data::model::DateRange;
    use std::collections::BTreeSet;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn rec(date: NaiveDate, product: &str, dept: &str, sector: &str, volume: Option<f64>) -> Record {
        Record {
            date,
            product: product.into(),
            department: dept.into(),
            sector: sector.into(),
            volume,
        }
    }

    fn example() -> Dataset {
        Dataset::from_records(vec![
            rec(d(2024, 1, 5), "PRODA", "DEPT1", "SEC1", Some(1234.50)),
            rec(d(2024, 1, 20), "PRODA", "DEPT1", "SEC2", Some(100.00)),
            rec(d(2024, 2, 1), "PRODB", "DEPT2", "SEC1", Some(50.00)),
        ])
    }

    fn january() -> FilterState {
        FilterState {
            range: DateRange::new(d(2024, 1, 1), d(2024, 1, 31)),
            products: BTreeSet::new(),
            departments: BTreeSet::new(),
        }
    }

    #[test]
    fn test_example_end_to_end() {
        let ds = example();
        let view = apply_filter(&ds, &january());
        assert_eq!(view.len(), 2);

        let series = aggregate_time_series(view.iter().copied(), Granularity::Monthly);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].label, "2024-01");
        assert!((series[0].volume - 1334.50).abs() < 1e-9);

        let sectors = aggregate_by_category(view.iter().copied(), CategoryColumn::Sector);
        assert_eq!(
            sectors,
            vec![
                CategoryTotal { category: "SEC1".into(), volume: 1234.50 },
                CategoryTotal { category: "SEC2".into(), volume: 100.00 },
            ]
        );
    }

    #[test]
    fn test_monthly_three_months_chronological() {
        let ds = Dataset::from_records(vec![
            rec(d(2024, 3, 2), "P", "D", "S", Some(3.0)),
            rec(d(2024, 1, 9), "P", "D", "S", Some(1.0)),
            rec(d(2024, 2, 28), "P", "D", "S", Some(2.0)),
            rec(d(2024, 1, 31), "P", "D", "S", Some(10.0)),
            rec(d(2024, 3, 31), "P", "D", "S", Some(30.0)),
        ]);
        let series = aggregate_time_series(&ds.records, Granularity::Monthly);
        let got: Vec<(&str, f64)> = series.iter().map(|b| (b.label.as_str(), b.volume)).collect();
        assert_eq!(got, vec![("2024-01", 11.0), ("2024-02", 2.0), ("2024-03", 33.0)]);
    }

    #[test]
    fn test_daily_buckets_and_missing_volumes() {
        let ds = Dataset::from_records(vec![
            rec(d(2024, 1, 2), "P", "D", "S", Some(5.0)),
            rec(d(2024, 1, 1), "P", "D", "S", None),
            rec(d(2024, 1, 2), "P", "D", "S", None),
        ]);
        let series = aggregate_time_series(&ds.records, Granularity::Daily);
        let got: Vec<(&str, f64)> = series.iter().map(|b| (b.label.as_str(), b.volume)).collect();
        assert_eq!(got, vec![("2024-01-01", 0.0), ("2024-01-02", 5.0)]);
    }

    #[test]
    fn test_sector_totals_partition_the_volume() {
        let ds = Dataset::from_records(vec![
            rec(d(2024, 1, 1), "P1", "D1", "S1", Some(1.25)),
            rec(d(2024, 1, 2), "P2", "D1", "S2", Some(2.5)),
            rec(d(2024, 1, 3), "P1", "D2", "S3", None),
            rec(d(2024, 1, 4), "P3", "D2", "S1", Some(4.0)),
            rec(d(2024, 1, 5), "P3", "D3", "", Some(8.0)),
        ]);
        let sectors = aggregate_by_category(&ds.records, CategoryColumn::Sector);
        let sum: f64 = sectors.iter().map(|s| s.volume).sum();
        assert!((sum - total_volume(&ds.records)).abs() < 1e-9);
        assert_eq!(sectors.len(), 4);
    }

    #[test]
    fn test_department_ranking_is_ascending() {
        let ds = Dataset::from_records(vec![
            rec(d(2024, 1, 1), "P", "BIG", "S", Some(100.0)),
            rec(d(2024, 1, 1), "P", "SMALL", "S", Some(1.0)),
            rec(d(2024, 1, 2), "P", "MID", "S", Some(20.0)),
            rec(d(2024, 1, 3), "P", "BIG", "S", Some(5.0)),
        ]);
        let ranking = rank_departments(&ds.records);
        let names: Vec<&str> = ranking.iter().map(|t| t.category.as_str()).collect();
        assert_eq!(names, vec!["SMALL", "MID", "BIG"]);
        assert!(ranking.windows(2).all(|w| w[0].volume < w[1].volume));
    }

    #[test]
    fn test_empty_input_gives_empty_output() {
        let empty: Vec<Record> = Vec::new();
        assert!(aggregate_time_series(&empty, Granularity::Daily).is_empty());
        assert!(aggregate_by_category(&empty, CategoryColumn::Sector).is_empty());
        assert!(rank_departments(&empty).is_empty());
        assert!(shares(&[]).is_empty());
    }

    #[test]
    fn test_shares_sum_to_hundred() {
        let totals = vec![
            CategoryTotal { category: "A".into(), volume: 1.0 },
            CategoryTotal { category: "B".into(), volume: 3.0 },
        ];
        let s = shares(&totals);
        assert_eq!(s[0].percent, 25.0);
        assert_eq!(s[1].percent, 75.0);

        let zero = vec![CategoryTotal { category: "A".into(), volume: 0.0 }];
        assert_eq!(shares(&zero)[0].percent, 0.0);
    }

    #[test]
    fn test_report_build() {
        let ds = example();
        let report = Report::build(&ds, &january(), Granularity::Daily);
        assert_eq!(report.rows, vec![0, 1]);
        assert_eq!(report.time_series.len(), 2);
        assert_eq!(report.sector_shares.len(), 2);
        assert_eq!(report.department_ranking.len(), 1);
        assert!((report.total_volume - 1334.50).abs() < 1e-9);
        assert_eq!(report.missing_volumes, 0);

        let mut nothing = january();
        nothing.products = ["NOPE".to_string()].into_iter().collect();
        let report = Report::build(&ds, &nothing, Granularity::Monthly);
        assert!(report.is_empty());
        assert!(report.time_series.is_empty());
        assert!(report.sector_shares.is_empty());
        assert!(report.department_ranking.is_empty());
    }
}
