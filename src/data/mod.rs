/// Data layer: the query engine over the sales transactions.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table (month/weekday derived)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  location / category / month → narrower Table view
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  group by 1 or 2 columns → Summary / Pivot, top-N
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  report   │  one dashboard's worth of summaries
///   └──────────┘
/// ```

pub mod aggregate;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod report;
