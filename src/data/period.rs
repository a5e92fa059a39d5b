use std::fmt;

use chrono::{Months, NaiveDate};

use super::model::DateRange;

// ---------------------------------------------------------------------------
// RelativePeriod – named date-range shortcuts
// ---------------------------------------------------------------------------

/// A named relative date range, resolved against the dataset's last date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RelativePeriod {
    /// Bounds are whatever the user typed.
    #[default]
    Custom,
    LastMonth,
    LastBimonthly,
    LastQuarter,
    LastSemester,
    LastYear,
    AllHistory,
}

impl RelativePeriod {
    pub const ALL: [RelativePeriod; 7] = [
        RelativePeriod::Custom,
        RelativePeriod::LastMonth,
        RelativePeriod::LastBimonthly,
        RelativePeriod::LastQuarter,
        RelativePeriod::LastSemester,
        RelativePeriod::LastYear,
        RelativePeriod::AllHistory,
    ];

    /// How far back from the last date the period reaches, in months.
    /// `None` for the periods that are not a fixed offset.
    pub fn months_back(self) -> Option<u32> {
        match self {
            RelativePeriod::LastMonth => Some(1),
            RelativePeriod::LastBimonthly => Some(2),
            RelativePeriod::LastQuarter => Some(3),
            RelativePeriod::LastSemester => Some(6),
            RelativePeriod::LastYear => Some(12),
            RelativePeriod::Custom | RelativePeriod::AllHistory => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RelativePeriod::Custom => "Custom",
            RelativePeriod::LastMonth => "Last month",
            RelativePeriod::LastBimonthly => "Last two months",
            RelativePeriod::LastQuarter => "Last quarter",
            RelativePeriod::LastSemester => "Last semester",
            RelativePeriod::LastYear => "Last year",
            RelativePeriod::AllHistory => "All history",
        }
    }
}

impl fmt::Display for RelativePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Subtract whole calendar months, clamping to the last valid day of the
/// target month (Jan 31 − 1 month = Dec 31, Mar 31 − 1 month = Feb 28/29).
pub fn months_before(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN)
}

/// Resolve a period shortcut to concrete bounds.
///
/// `dataset` is the `(min, max)` date range of the loaded relation;
/// `current` is returned untouched for [`RelativePeriod::Custom`].
pub fn resolve_period(period: RelativePeriod, dataset: DateRange, current: DateRange) -> DateRange {
    let max_date = dataset.end;
    match period {
        RelativePeriod::Custom => current,
        RelativePeriod::AllHistory => dataset,
        named => {
            // Every remaining variant has a fixed offset.
            let months = named.months_back().unwrap_or(0);
            DateRange::new(months_before(max_date, months), max_date)
        }
    }
}
