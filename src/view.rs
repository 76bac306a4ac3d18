//! Plain-text view of several evolutions side by side.
//!
//! [`Layout`] is the grid; [`TextView`] renders one cell per evolution with
//! its generation and fitness statistics.
//!
//! ```
//! use evocomp::evolution::GenerationSnapshot;
//! use evocomp::view::{Layout, TextView};
//!
//! let view = TextView::new(Layout::square(2), 2).unwrap();
//! let population = [1.0, 3.0];
//! let fitness = [1.0, 3.0];
//! let snapshot = GenerationSnapshot::new(4, &population, &fitness, true);
//!
//! let text = view.render(&[snapshot, snapshot]).unwrap();
//! assert!(text.contains("generation 4"));
//! ```

use crate::evolution::GenerationSnapshot;
use crate::{Error, Result};
use std::fmt::Write as _;

const CELL_WIDTH: usize = 24;
const CELL_LINES: usize = 5;
const SEPARATOR: &str = " | ";

/// Grid of `rows` x `columns` cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub rows: usize,
    pub columns: usize,
}

impl Layout {
    pub fn new(rows: usize, columns: usize) -> Self {
        Self { rows, columns }
    }

    /// Smallest square grid holding `count` cells: `ceil(sqrt(count))` per side.
    pub fn square(count: usize) -> Self {
        let side = (count as f64).sqrt().ceil() as usize;
        Self::new(side, side)
    }

    pub fn capacity(&self) -> usize {
        self.rows * self.columns
    }

    /// # Errors
    /// [`Error::Layout`] if the grid has fewer than `count` cells.
    pub fn check(&self, count: usize) -> Result<()> {
        if self.capacity() < count {
            return Err(Error::Layout {
                rows: self.rows,
                columns: self.columns,
                count,
            });
        }
        Ok(())
    }
}

/// Renders evolution statistics on a [`Layout`].
#[derive(Debug, Clone)]
pub struct TextView {
    layout: Layout,
    count: usize,
    titles: Vec<String>,
}

impl TextView {
    /// View for `count` evolutions.
    ///
    /// # Errors
    /// [`Error::Layout`] if `layout` cannot hold `count` cells.
    pub fn new(layout: Layout, count: usize) -> Result<Self> {
        layout.check(count)?;
        Ok(Self {
            layout,
            count,
            titles: (1..=count).map(|i| format!("evolution {i}")).collect(),
        })
    }

    /// Replaces the default `evolution <n>` cell titles.
    ///
    /// Missing titles keep their default, extra titles are ignored.
    pub fn with_titles<T: Into<String>>(mut self, titles: impl IntoIterator<Item = T>) -> Self {
        for (slot, title) in self.titles.iter_mut().zip(titles) {
            *slot = title.into();
        }
        self
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Renders one cell per snapshot, row by row.
    ///
    /// # Errors
    /// [`Error::InvalidConfiguration`] if the number of snapshots differs
    /// from the count the view was created for.
    pub fn render<I>(&self, snapshots: &[GenerationSnapshot<'_, I>]) -> Result<String> {
        if snapshots.len() != self.count {
            return Err(Error::InvalidConfiguration(format!(
                "view holds {} evolutions, got {} snapshots",
                self.count,
                snapshots.len()
            )));
        }

        let cells: Vec<[String; CELL_LINES]> = snapshots
            .iter()
            .zip(&self.titles)
            .map(|(snapshot, title)| cell(title, snapshot))
            .collect();

        let mut out = String::new();
        for row in cells.chunks(self.layout.columns.max(1)) {
            for line in 0..CELL_LINES {
                let text = row
                    .iter()
                    .map(|cell| format!("{:<width$}", cell[line], width = CELL_WIDTH))
                    .collect::<Vec<_>>()
                    .join(SEPARATOR);
                let _ = writeln!(out, "{}", text.trim_end());
            }
            out.push('\n');
        }
        Ok(out)
    }
}

fn cell<I>(title: &str, snapshot: &GenerationSnapshot<'_, I>) -> [String; CELL_LINES] {
    let mut title = title.to_string();
    title.truncate(CELL_WIDTH);
    [
        title,
        format!("generation {}", snapshot.generation()),
        format!("best   {:>12.4}", snapshot.fittest().1),
        format!("mean   {:>12.4}", snapshot.mean()),
        format!("median {:>12.4}", snapshot.median()),
    ]
}
