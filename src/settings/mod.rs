//! Settings files for 2D landscape evolutions.
//!
//! A settings file is a delimited text file without header, one evolution
//! per row:
//!
//! ```text
//! uniform 0.5,20,0.1
//! normal 0.25,50,1
//! ```
//!
//! Columns are the mutation [`Distribution`], the population size and the
//! mutation probability. Fields are separated by `,` and quoted with `|`.

use crate::evolution::EvolutionConfig;
use crate::{Error, Result};
use rand::distr::Uniform;
use rand::RngCore;
use rand_distr::{Distribution as _, Normal};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Uniform offsets in `[-step, step]`, sampler built once.
#[derive(Debug, Clone, Copy)]
pub struct UniformOffset {
    step: f64,
    sampler: Uniform<f64>,
}

impl UniformOffset {
    pub fn step(&self) -> f64 {
        self.step
    }
}

impl PartialEq for UniformOffset {
    fn eq(&self, other: &Self) -> bool {
        self.step == other.step
    }
}

/// Distribution of the offsets a landscape mutation adds to a coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Distribution {
    /// Uniform in `[-step, step]`.
    Uniform(UniformOffset),
    /// Gaussian with mean 0.
    Normal(Normal<f64>),
}

impl Distribution {
    /// Uniform offsets in `[-step, step]`.
    ///
    /// # Errors
    /// [`Error::InvalidConfiguration`] if `step` is negative, not finite, or
    /// so large that the width `2 * step` overflows.
    pub fn uniform(step: f64) -> Result<Self> {
        if !step.is_finite() || step < 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "uniform step must be a non-negative number, got {step}"
            )));
        }
        let sampler = Uniform::new_inclusive(-step, step)
            .map_err(|e| Error::InvalidConfiguration(format!("uniform step {step}: {e}")))?;
        Ok(Self::Uniform(UniformOffset { step, sampler }))
    }

    /// Gaussian offsets with mean 0 and standard deviation `sigma`.
    pub fn normal(sigma: f64) -> Result<Self> {
        if !sigma.is_finite() || sigma < 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "normal sigma must be a non-negative number, got {sigma}"
            )));
        }
        Normal::new(0.0, sigma)
            .map(Self::Normal)
            .map_err(|e| Error::InvalidConfiguration(format!("normal sigma {sigma}: {e}")))
    }

    pub fn sample(&self, rng: &mut dyn RngCore) -> f64 {
        match self {
            Self::Uniform(uniform) => uniform.sampler.sample(rng),
            Self::Normal(normal) => normal.sample(rng),
        }
    }
}

impl FromStr for Distribution {
    type Err = Error;

    /// Parses `"<kind> <parameter>"`, e.g. `"uniform 0.5"` or `"normal 0.25"`.
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split_whitespace();
        let (Some(kind), Some(parameter), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::InvalidConfiguration(format!(
                "expected '<kind> <parameter>', got '{s}'"
            )));
        };
        let value: f64 = parameter.parse().map_err(|_| {
            Error::InvalidConfiguration(format!("distribution parameter '{parameter}' is not a number"))
        })?;

        match kind {
            "uniform" => Self::uniform(value),
            "normal" => Self::normal(value),
            other => Err(Error::InvalidConfiguration(format!(
                "unknown distribution '{other}'"
            ))),
        }
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uniform(uniform) => write!(f, "uniform {}", uniform.step),
            Self::Normal(normal) => write!(f, "normal {}", normal.std_dev()),
        }
    }
}

/// One row of a settings file.
#[derive(Debug, Clone, PartialEq)]
pub struct EvolutionSettings {
    pub distribution: Distribution,
    pub population_size: usize,
    /// Per-individual mutation probability, in `[0, 1]`.
    pub mutation_probability: f64,
}

impl EvolutionSettings {
    pub fn new(
        distribution: Distribution,
        population_size: usize,
        mutation_probability: f64,
    ) -> Result<Self> {
        let settings = Self {
            distribution,
            population_size,
            mutation_probability,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(Error::InvalidConfiguration(
                "population size must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_probability) {
            return Err(Error::InvalidConfiguration(format!(
                "mutation probability must be in [0, 1], got {}",
                self.mutation_probability
            )));
        }
        Ok(())
    }

    /// Maximizing engine configuration with this population size.
    pub fn config(&self) -> EvolutionConfig {
        EvolutionConfig::new(self.population_size)
    }
}

impl fmt::Display for EvolutionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, population {}, mutation probability {}",
            self.distribution, self.population_size, self.mutation_probability
        )
    }
}

/// Reads every row of the settings file at `path`.
///
/// # Errors
/// [`Error::Io`] or [`Error::Csv`] if the file cannot be read,
/// [`Error::InvalidConfiguration`] naming the first malformed row.
pub fn settings_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<EvolutionSettings>> {
    let file = File::open(path.as_ref())?;
    let settings = settings_from_reader(file)?;
    log::debug!(
        "read {} settings rows from {}",
        settings.len(),
        path.as_ref().display()
    );
    Ok(settings)
}

/// Like [`settings_from_file`] for any reader.
pub fn settings_from_reader<R: Read>(reader: R) -> Result<Vec<EvolutionSettings>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b',')
        .quote(b'|')
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut settings = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let row = i + 1;
        settings.push(parse_row(&record).map_err(|e| match e {
            Error::InvalidConfiguration(msg) => {
                Error::InvalidConfiguration(format!("settings row {row}: {msg}"))
            }
            other => other,
        })?);
    }
    Ok(settings)
}

fn parse_row(record: &csv::StringRecord) -> Result<EvolutionSettings> {
    if record.len() != 3 {
        return Err(Error::InvalidConfiguration(format!(
            "expected 3 fields, got {}",
            record.len()
        )));
    }

    let distribution: Distribution = record[0].parse()?;
    let population_size = record[1].parse().map_err(|_| {
        Error::InvalidConfiguration(format!("population size '{}' is not an integer", &record[1]))
    })?;
    let mutation_probability = record[2].parse().map_err(|_| {
        Error::InvalidConfiguration(format!("mutation probability '{}' is not a number", &record[2]))
    })?;

    EvolutionSettings::new(distribution, population_size, mutation_probability)
}
