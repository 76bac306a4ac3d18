//! CSV statistics writer.
//!
//! [`CsvWriter`] appends one row per generation to a delimited text file.
//! The row content is produced by a caller-supplied formatter, so the same
//! writer serves plain fitness statistics as well as problem-specific data.

use super::sink::StatisticsSink;
use crate::evolution::GenerationSnapshot;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Formats one generation into the cells of a CSV row.
pub type RowFormatter<I> = Box<dyn Fn(&GenerationSnapshot<'_, I>) -> Vec<String>>;

/// Headers written by [`CsvWriter::statistics`].
pub const STATISTICS_HEADERS: [&str; 3] = ["fittest", "mean", "median"];

/// Sink writing one CSV row per generation.
pub struct CsvWriter<I> {
    writer: csv::Writer<File>,
    formatter: RowFormatter<I>,
}

impl<I> CsvWriter<I> {
    /// Creates (or truncates) `path`, writes `headers`, and uses `formatter`
    /// for every following row. Fields are separated by commas.
    pub fn create<P, F>(path: P, headers: &[&str], formatter: F) -> Result<Self>
    where
        P: AsRef<Path>,
        F: Fn(&GenerationSnapshot<'_, I>) -> Vec<String> + 'static,
    {
        Self::create_with_delimiter(path, headers, b',', formatter)
    }

    /// Like [`create`](Self::create) with a custom field delimiter.
    pub fn create_with_delimiter<P, F>(
        path: P,
        headers: &[&str],
        delimiter: u8,
        formatter: F,
    ) -> Result<Self>
    where
        P: AsRef<Path>,
        F: Fn(&GenerationSnapshot<'_, I>) -> Vec<String> + 'static,
    {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_path(path.as_ref())?;
        writer.write_record(headers)?;
        writer.flush()?;
        log::debug!("writing statistics to {}", path.as_ref().display());

        Ok(Self {
            writer,
            formatter: Box::new(formatter),
        })
    }

    /// Writer for the `fittest,mean,median` table, rounded to `digits`
    /// decimal places.
    pub fn statistics<P: AsRef<Path>>(path: P, digits: u32) -> Result<Self>
    where
        I: 'static,
    {
        Self::create(path, &STATISTICS_HEADERS, statistics_formatter(digits))
    }
}

impl<I> StatisticsSink<I> for CsvWriter<I> {
    fn on_generation(&mut self, snapshot: &GenerationSnapshot<'_, I>) -> Result<()> {
        let row = (self.formatter)(snapshot);
        self.writer.write_record(&row)?;
        self.writer.flush()?;
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// One row of a statistics table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatisticsRow {
    pub fittest: f64,
    pub mean: f64,
    pub median: f64,
}

impl StatisticsRow {
    /// Statistics of `snapshot`, rounded to `digits` decimal places.
    pub fn from_snapshot<I>(snapshot: &GenerationSnapshot<'_, I>, digits: u32) -> Self {
        Self {
            fittest: round_to(snapshot.fittest().1, digits),
            mean: round_to(snapshot.mean(), digits),
            median: round_to(snapshot.median(), digits),
        }
    }
}

/// Formatter producing `fittest,mean,median` rounded to `digits`.
pub fn statistics_formatter<I>(digits: u32) -> impl Fn(&GenerationSnapshot<'_, I>) -> Vec<String> {
    move |snapshot: &GenerationSnapshot<'_, I>| {
        let row = StatisticsRow::from_snapshot(snapshot, digits);
        vec![
            row.fittest.to_string(),
            row.mean.to_string(),
            row.median.to_string(),
        ]
    }
}

/// Reads a table written by [`CsvWriter::statistics`].
pub fn read_statistics<P: AsRef<Path>>(path: P) -> Result<Vec<StatisticsRow>> {
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<StatisticsRow>, csv::Error>>()?;
    Ok(rows)
}

/// Writes `rows` as a `fittest,mean,median` table readable by
/// [`read_statistics`].
pub fn write_statistics<P: AsRef<Path>>(path: P, rows: &[StatisticsRow]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path.as_ref())?;
    writer.write_record(STATISTICS_HEADERS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    log::debug!("wrote {} statistics rows to {}", rows.len(), path.as_ref().display());
    Ok(())
}

/// Rounds half away from zero to `digits` decimal places.
pub fn round_to(value: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (value * factor).round() / factor
}
