//! Two-dimensional fitness landscapes.
//!
//! Individuals are points `[x, y]` inside a square [`ValueRange`]. The
//! [`Evolution2D`] builder wires a [`Landscape`] and one row of
//! [`EvolutionSettings`] into an [`Evolution`].

use crate::evolution::{Evolution, Mutation, Selection};
use crate::io::StatisticsSink;
use crate::settings::{Distribution, EvolutionSettings};
use crate::{Error, Result};
use rand::distr::{Distribution as _, Uniform};
use rand::RngCore;
use std::fmt;
use std::str::FromStr;

/// Upper bound on the points per axis of [`Landscape::sample_grid`].
pub const MAX_GRID_AXIS: usize = 10_000;

/// A point on a landscape.
pub type Point = [f64; 2];

/// Built-in landscape functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Landscape {
    /// `max(0, (sin x + sin y) * x * y)`
    Sine,
    /// `x² + y²`
    Parabola,
}

impl Landscape {
    pub const ALL: [Landscape; 2] = [Landscape::Sine, Landscape::Parabola];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sine => "sine",
            Self::Parabola => "parabola",
        }
    }

    pub fn evaluate(&self, point: &Point) -> f64 {
        let [x, y] = *point;
        match self {
            Self::Sine => ((x.sin() + y.sin()) * x * y).max(0.0),
            Self::Parabola => x * x + y * y,
        }
    }

    /// Samples the landscape on a regular grid over `range`.
    ///
    /// Both axes run from `range.min()` in increments of `step`, excluding
    /// `range.max()`. `zs[i][j]` is the value at `(xs[i], ys[j])`.
    pub fn sample_grid(&self, range: ValueRange, step: f64) -> Result<LandscapeGrid> {
        if !step.is_finite() || step <= 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "grid step must be positive, got {step}"
            )));
        }

        let count = ((range.max() - range.min()) / step).ceil();
        if count > MAX_GRID_AXIS as f64 {
            return Err(Error::InvalidConfiguration(format!(
                "grid step {step} gives {count} points per axis, at most {MAX_GRID_AXIS} allowed"
            )));
        }
        let count = count as usize;
        let axis: Vec<f64> = (0..count)
            .map(|k| range.min() + k as f64 * step)
            .filter(|v| *v < range.max())
            .collect();
        let zs = axis
            .iter()
            .map(|&x| axis.iter().map(|&y| self.evaluate(&[x, y])).collect())
            .collect();

        Ok(LandscapeGrid {
            xs: axis.clone(),
            ys: axis,
            zs,
        })
    }
}

impl FromStr for Landscape {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|landscape| landscape.name() == s)
            .ok_or_else(|| {
                Error::InvalidConfiguration(format!(
                    "unknown function '{s}', expected one of: sine, parabola"
                ))
            })
    }
}

impl fmt::Display for Landscape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Landscape values sampled on a grid.
#[derive(Debug, Clone, PartialEq)]
pub struct LandscapeGrid {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub zs: Vec<Vec<f64>>,
}

/// Closed interval `[min, max]` used for both coordinates.
///
/// Random points are drawn from the half-open `[min, max)`.
#[derive(Debug, Clone, Copy)]
pub struct ValueRange {
    min: f64,
    max: f64,
    sampler: Uniform<f64>,
}

impl PartialEq for ValueRange {
    fn eq(&self, other: &Self) -> bool {
        self.min == other.min && self.max == other.max
    }
}

impl ValueRange {
    /// # Errors
    /// [`Error::InvalidConfiguration`] unless `min < max`, both are finite
    /// and the width `max - min` is finite.
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(Error::InvalidConfiguration(format!(
                "value range needs finite min < max, got [{min}, {max}]"
            )));
        }
        let sampler = Uniform::new(min, max).map_err(|e| {
            Error::InvalidConfiguration(format!("value range [{min}, {max}]: {e}"))
        })?;
        Ok(Self { min, max, sampler })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, point: &Point) -> bool {
        point.iter().all(|v| (self.min..=self.max).contains(v))
    }

    /// A uniformly random point in `[min, max)²`.
    pub fn random_point(&self, rng: &mut dyn RngCore) -> Point {
        [self.sampler.sample(rng), self.sampler.sample(rng)]
    }
}

/// Builds evolutions over a [`Landscape`].
///
/// ```
/// use evocomp::problems::{Evolution2D, Landscape, ValueRange};
/// use evocomp::settings::{Distribution, EvolutionSettings};
///
/// let settings = EvolutionSettings::new(Distribution::uniform(0.5).unwrap(), 20, 0.5).unwrap();
/// let range = ValueRange::new(-5.0, 5.0).unwrap();
/// let mut evolution = Evolution2D::new(Landscape::Parabola, settings, range)
///     .with_seed(3)
///     .build()
///     .unwrap();
///
/// evolution.step().unwrap();
/// assert_eq!(evolution.current_population().len(), 20);
/// ```
#[derive(Debug, Clone)]
pub struct Evolution2D {
    landscape: Landscape,
    settings: EvolutionSettings,
    range: ValueRange,
    proportional: bool,
    seed: Option<u64>,
}

impl Evolution2D {
    /// Maximizes `landscape` with the given settings.
    pub fn new(landscape: Landscape, settings: EvolutionSettings, range: ValueRange) -> Self {
        Self {
            landscape,
            settings,
            range,
            proportional: true,
            seed: None,
        }
    }

    pub fn with_proportional(mut self, proportional: bool) -> Self {
        self.proportional = proportional;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn landscape(&self) -> Landscape {
        self.landscape
    }

    pub fn settings(&self) -> &EvolutionSettings {
        &self.settings
    }

    pub fn range(&self) -> ValueRange {
        self.range
    }

    /// Builds an evolution without a sink.
    pub fn build(&self) -> Result<Evolution<Point>> {
        self.build_with_sink(())
    }

    /// Builds an evolution reporting to `sink`.
    pub fn build_with_sink<S: StatisticsSink<Point>>(&self, sink: S) -> Result<Evolution<Point, S>> {
        self.settings.validate()?;

        let mut config = self.settings.config().with_proportional(self.proportional);
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }

        let range = self.range;
        let landscape = self.landscape;
        let distribution = self.settings.distribution;

        Evolution::builder(config)
            .random_generator(move |rng: &mut dyn RngCore| -> Result<Point> {
                Ok(range.random_point(rng))
            })
            .fitness_fn(move |point: &Point| -> Result<f64> { Ok(landscape.evaluate(point)) })
            .selection(Selection::Cutoff)
            .operator(
                Mutation::new(move |point: &Point, rng: &mut dyn RngCore| {
                    Ok(shift(point, &distribution, range, rng))
                })
                .with_probability(self.settings.mutation_probability),
            )
            .sink(sink)
            .build()
    }
}

/// Adds an independent offset to each coordinate and clamps to the range.
fn shift(point: &Point, distribution: &Distribution, range: ValueRange, rng: &mut dyn RngCore) -> Point {
    let x = range.clamp(point[0] + distribution.sample(rng));
    let y = range.clamp(point[1] + distribution.sample(rng));
    [x, y]
}
