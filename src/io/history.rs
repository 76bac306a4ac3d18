//! In-memory generation history with optional JSON persistence.

use super::sink::StatisticsSink;
use crate::evolution::GenerationSnapshot;
use crate::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Owned copy of one generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord<I> {
    pub generation: usize,
    pub population: Vec<I>,
    pub fitness_values: Vec<f64>,
    pub fittest: f64,
    pub mean: f64,
    pub median: f64,
}

impl<I: Clone> GenerationRecord<I> {
    pub fn from_snapshot(snapshot: &GenerationSnapshot<'_, I>) -> Self {
        Self {
            generation: snapshot.generation(),
            population: snapshot.population().to_vec(),
            fitness_values: snapshot.fitness_values().to_vec(),
            fittest: snapshot.fittest().1,
            mean: snapshot.mean(),
            median: snapshot.median(),
        }
    }
}

/// Past generations of an evolution.
#[derive(Debug, Clone, PartialEq)]
pub struct History<I> {
    generations: Vec<GenerationRecord<I>>,
    path: Option<PathBuf>,
}

impl<I> Default for History<I> {
    fn default() -> Self {
        Self {
            generations: Vec::new(),
            path: None,
        }
    }
}

impl<I> History<I> {
    /// Empty history that [`write_json`](Self::write_json) persists to `path`.
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            generations: Vec::new(),
            path: Some(path.into()),
        }
    }

    pub fn add(&mut self, record: GenerationRecord<I>) {
        self.generations.push(record);
    }

    pub fn generations(&self) -> &[GenerationRecord<I>] {
        &self.generations
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.generations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }
}

impl<I: Serialize> History<I> {
    /// Writes all generations as a JSON array to the history's path.
    ///
    /// Does nothing if the history has no path.
    pub fn write_json(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, &self.generations)?;
        writer.flush()?;
        log::debug!(
            "wrote {} generations to {}",
            self.generations.len(),
            path.display()
        );
        Ok(())
    }
}

impl<I: DeserializeOwned> History<I> {
    /// Reads a history written by [`write_json`](Self::write_json).
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let generations = serde_json::from_reader(reader)?;
        Ok(Self {
            generations,
            path: Some(path.as_ref().to_path_buf()),
        })
    }
}

/// Sink filling a [`History`]; persists it as JSON on `finalize` when the
/// history has a path.
#[derive(Debug, Clone)]
pub struct HistoryWriter<I> {
    history: History<I>,
}

impl<I> Default for HistoryWriter<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> HistoryWriter<I> {
    /// Keeps the history in memory only.
    pub fn new() -> Self {
        Self {
            history: History::default(),
        }
    }

    /// Writes the history to `path` on `finalize`.
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            history: History::with_path(path),
        }
    }

    pub fn history(&self) -> &History<I> {
        &self.history
    }

    pub fn into_history(self) -> History<I> {
        self.history
    }
}

impl<I: Clone + Serialize> StatisticsSink<I> for HistoryWriter<I> {
    fn on_generation(&mut self, snapshot: &GenerationSnapshot<'_, I>) -> Result<()> {
        self.history.add(GenerationRecord::from_snapshot(snapshot));
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        self.history.write_json()
    }
}
