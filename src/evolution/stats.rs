//! Fitness statistics over a single generation.
//!
//! [`GenerationSnapshot`] is the read-only view that the engine hands to
//! sinks, views and stopping conditions. It borrows the engine's arrays, so
//! nothing can mutate them while a snapshot is alive.

use std::cmp::Ordering;

/// Borrowed view of one generation.
#[derive(Debug)]
pub struct GenerationSnapshot<'a, I> {
    generation: usize,
    population: &'a [I],
    fitness_values: &'a [f64],
    proportional: bool,
}

// Manual impls: a derive would require `I: Clone`.
impl<I> Clone for GenerationSnapshot<'_, I> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I> Copy for GenerationSnapshot<'_, I> {}

impl<'a, I> GenerationSnapshot<'a, I> {
    /// Creates a snapshot over a non-empty population.
    ///
    /// `fitness_values` must be aligned by index with `population`.
    ///
    /// # Panics
    /// If `population` is empty or the two slices differ in length. The
    /// engine never builds such a snapshot.
    pub fn new(
        generation: usize,
        population: &'a [I],
        fitness_values: &'a [f64],
        proportional: bool,
    ) -> Self {
        assert!(!population.is_empty(), "snapshot of an empty population");
        assert_eq!(
            population.len(),
            fitness_values.len(),
            "snapshot fitness values not aligned with population"
        );
        Self {
            generation,
            population,
            fitness_values,
            proportional,
        }
    }

    /// Generation number (0 for the initial population).
    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn population(&self) -> &'a [I] {
        self.population
    }

    pub fn fitness_values(&self) -> &'a [f64] {
        self.fitness_values
    }

    pub fn is_proportional(&self) -> bool {
        self.proportional
    }

    /// The fittest individual and its fitness.
    ///
    /// Ties go to the first individual in population order.
    pub fn fittest(&self) -> (&'a I, f64) {
        let idx = fittest_index(self.fitness_values, self.proportional);
        (&self.population[idx], self.fitness_values[idx])
    }

    pub fn mean(&self) -> f64 {
        mean(self.fitness_values)
    }

    pub fn median(&self) -> f64 {
        median(self.fitness_values)
    }
}

/// Returns `true` if fitness `a` is strictly better than `b`.
pub(crate) fn is_better(a: f64, b: f64, proportional: bool) -> bool {
    if proportional {
        a > b
    } else {
        a < b
    }
}

/// Index of the best fitness value; the first one wins ties.
///
/// Returns 0 for an empty slice.
pub fn fittest_index(fitness_values: &[f64], proportional: bool) -> usize {
    let mut best = 0;
    for (i, &f) in fitness_values.iter().enumerate().skip(1) {
        if is_better(f, fitness_values[best], proportional) {
            best = i;
        }
    }
    best
}

/// Arithmetic mean. NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median; the mean of the two middle values for even lengths.
/// NaN for an empty slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
