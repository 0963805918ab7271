//! Aggregation over the time-entry ledger: period rollups and daily series.

pub mod period;
pub mod rollup;
pub mod series;

pub use period::{parse_window, Period};
pub use rollup::{build_rollup, CategoryStats, RollupRow, UserStats};
pub use series::{build_timeseries, SeriesMode, SeriesRow, TimeSeries};
