//! Statistics sinks.
//!
//! A [`StatisticsSink`] receives a [`GenerationSnapshot`](crate::evolution::GenerationSnapshot)
//! after construction and after every step of an evolution.
//!
//! - [`CsvWriter`]: one delimited row per generation
//! - [`HistoryWriter`]: owned generation records, optionally saved as JSON
//!
//! Sinks compose: `(A, B)` notifies both, `Vec<Box<dyn StatisticsSink<I>>>`
//! notifies all in order.

mod csv_writer;
mod history;
mod sink;

pub use csv_writer::{
    read_statistics, round_to, statistics_formatter, write_statistics, CsvWriter, RowFormatter,
    StatisticsRow, STATISTICS_HEADERS,
};
pub use history::{GenerationRecord, History, HistoryWriter};
pub use sink::StatisticsSink;
