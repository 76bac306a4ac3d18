//! Selection strategies.
//!
//! Selection determines which individuals survive into the operator chain.
//! Both built-in strategies return as many individuals as they receive.
//!
//! # References
//!
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"
//! - Goldberg & Deb (1991), "A Comparative Analysis of Selection Schemes
//!   Used in Genetic Algorithms"

use super::types::SelectionScheme;
use crate::{Error, Result};
use rand::{Rng, RngCore};
use std::cmp::Ordering;

/// Built-in selection strategy.
///
/// # Examples
///
/// ```
/// use evocomp::evolution::{Selection, SelectionScheme};
/// use rand::SeedableRng;
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(42);
/// let population = vec![1, 2, 3, 4];
/// let fitness = vec![1.0, 2.0, 3.0, 4.0];
///
/// let selected = Selection::Cutoff
///     .select(&population, &fitness, true, &mut rng)
///     .unwrap();
/// assert_eq!(selected, vec![3, 4, 3, 4]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    /// Keep the fitter half and repeat it cyclically to the original size.
    ///
    /// Individuals are stable-sorted so that the fittest come last; ties
    /// keep their population order. The kept slice starts at `len / 2`, so
    /// odd populations keep the larger half and a singleton keeps itself.
    ///
    /// # Complexity
    /// O(n log n) per generation
    #[default]
    Cutoff,

    /// Fitness-proportionate (roulette wheel) selection.
    ///
    /// When maximizing, the raw fitness values are the weights and must be
    /// non-negative. When minimizing, weights are inverted as
    /// `max_fitness - fitness + epsilon`.
    ///
    /// Each pick draws `α` uniformly from `[0, total)` and takes the first
    /// index whose cumulative weight is strictly greater than `α`. A slot
    /// with zero weight is therefore never picked, even when `α` is 0.
    ///
    /// # Complexity
    /// O(n) per selected individual
    RouletteWheel,
}

impl<I: Clone> SelectionScheme<I> for Selection {
    fn select(
        &self,
        population: &[I],
        fitness_values: &[f64],
        proportional: bool,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<I>> {
        if population.len() != fitness_values.len() {
            return Err(Error::InvalidFitness(format!(
                "{} fitness values for {} individuals",
                fitness_values.len(),
                population.len()
            )));
        }

        match self {
            Selection::Cutoff => Ok(cutoff(population, fitness_values, proportional)),
            Selection::RouletteWheel => roulette_wheel(population, fitness_values, proportional, rng),
        }
    }
}

/// Cutoff selection: fitter half, cyclically refilled.
fn cutoff<I: Clone>(population: &[I], fitness_values: &[f64], proportional: bool) -> Vec<I> {
    let n = population.len();

    // Order so that the fittest are last. `sort_by` is stable.
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        let ord = fitness_values[a]
            .partial_cmp(&fitness_values[b])
            .unwrap_or(Ordering::Equal);
        if proportional {
            ord
        } else {
            ord.reverse()
        }
    });

    let selected = &order[n / 2..];
    (0..n)
        .map(|i| population[selected[i % selected.len()]].clone())
        .collect()
}

/// Roulette wheel selection over the whole population.
fn roulette_wheel<I: Clone>(
    population: &[I],
    fitness_values: &[f64],
    proportional: bool,
    rng: &mut dyn RngCore,
) -> Result<Vec<I>> {
    if population.is_empty() {
        return Ok(Vec::new());
    }

    let weights = roulette_weights(fitness_values, proportional)?;
    let total: f64 = weights.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return Err(Error::InvalidFitness(format!(
            "roulette wheel needs a positive total fitness, got {total}"
        )));
    }

    // Floating-point fallback: the last slot that can actually be hit.
    let fallback = weights
        .iter()
        .rposition(|&w| w > 0.0)
        .unwrap_or(weights.len() - 1);

    let mut selected = Vec::with_capacity(population.len());
    for _ in 0..population.len() {
        let alpha = rng.random_range(0.0..total);
        let mut cumulative = 0.0;
        let mut chosen = fallback;
        for (i, &w) in weights.iter().enumerate() {
            cumulative += w;
            if cumulative > alpha {
                chosen = i;
                break;
            }
        }
        selected.push(population[chosen].clone());
    }
    Ok(selected)
}

/// Selection weights for the roulette wheel.
fn roulette_weights(fitness_values: &[f64], proportional: bool) -> Result<Vec<f64>> {
    if let Some(&bad) = fitness_values.iter().find(|f| !f.is_finite()) {
        return Err(Error::InvalidFitness(format!(
            "roulette wheel needs finite fitness values, got {bad}"
        )));
    }

    if proportional {
        if let Some(&neg) = fitness_values.iter().find(|&&f| f < 0.0) {
            return Err(Error::InvalidFitness(format!(
                "roulette wheel needs non-negative fitness values, got {neg}"
            )));
        }
        return Ok(fitness_values.to_vec());
    }

    let epsilon = 1e-10;
    let max_fitness = fitness_values
        .iter()
        .cloned()
        .fold(f64::NEG_INFINITY, f64::max);

    // Invert: lower fitness -> higher weight
    Ok(fitness_values
        .iter()
        .map(|&f| (max_fitness - f + epsilon).max(epsilon))
        .collect())
}
