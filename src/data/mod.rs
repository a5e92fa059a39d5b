/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .xlsx / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → raw cells → normalize → Dataset
///   └──────────┘      (cached by `cache`, keyed on path + mtime)
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  Vec<Record>, distinct values, date bounds
///   └──────────┘
///        │   ◄── period::resolve_period (shortcut → date range)
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterState predicate → filtered records
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  time series, sector shares, department ranking
///   └───────────┘
/// ```

pub mod aggregate;
pub mod cache;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod period;
