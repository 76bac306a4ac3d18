//! Strategy traits plugged into the [`Evolution`](super::Evolution) engine.
//!
//! The engine never inspects individuals. Everything it needs to know about
//! them comes through the four strategies defined here:
//!
//! 1. [`RandomGenerator`]: how to create a random individual
//! 2. [`FitnessFn`]: how to score an individual
//! 3. [`SelectionScheme`]: which individuals survive a generation
//! 4. [`GeneticOperator`]: how survivors are turned into the next population
//!
//! Each trait has a blanket implementation for closures with the matching
//! signature, so a caller can pass either a closure or a named type.

use crate::Result;
use rand::RngCore;

/// Creates random individuals for the initial population.
///
/// ```
/// use evocomp::evolution::RandomGenerator;
/// use rand::{Rng, RngCore, SeedableRng};
///
/// let generator = |rng: &mut dyn RngCore| -> evocomp::Result<u32> {
///     Ok(rng.random_range(0..10))
/// };
/// let mut rng = rand::rngs::StdRng::seed_from_u64(1);
/// assert!(generator.generate(&mut rng).unwrap() < 10);
/// ```
pub trait RandomGenerator<I> {
    /// Produces one new individual.
    fn generate(&self, rng: &mut dyn RngCore) -> Result<I>;
}

impl<I, F> RandomGenerator<I> for F
where
    F: Fn(&mut dyn RngCore) -> Result<I>,
{
    fn generate(&self, rng: &mut dyn RngCore) -> Result<I> {
        self(rng)
    }
}

/// Scores an individual.
///
/// Whether higher or lower is better is decided by the engine's
/// `proportional` flag, not by the fitness function.
pub trait FitnessFn<I> {
    /// Returns the fitness of `individual`.
    fn fitness(&self, individual: &I) -> Result<f64>;
}

impl<I, F> FitnessFn<I> for F
where
    F: Fn(&I) -> Result<f64>,
{
    fn fitness(&self, individual: &I) -> Result<f64> {
        self(individual)
    }
}

/// Narrows a population to the individuals that survive a generation.
///
/// `fitness_values` is aligned by index with `population`. The scheme
/// decides how many individuals it returns; the operator chain is
/// responsible for restoring the population size.
pub trait SelectionScheme<I> {
    /// Returns the selected individuals.
    fn select(
        &self,
        population: &[I],
        fitness_values: &[f64],
        proportional: bool,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<I>>;
}

impl<I, F> SelectionScheme<I> for F
where
    F: Fn(&[I], &[f64], bool, &mut dyn RngCore) -> Result<Vec<I>>,
{
    fn select(
        &self,
        population: &[I],
        fitness_values: &[f64],
        proportional: bool,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<I>> {
        self(population, fitness_values, proportional, rng)
    }
}

/// Transforms a population into a new population of `population_size`
/// individuals.
///
/// Operators are applied in sequence; each receives the output of the
/// previous one (the first receives the selected subset).
pub trait GeneticOperator<I> {
    /// Applies the operator.
    fn apply(
        &self,
        population: Vec<I>,
        population_size: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<I>>;
}

impl<I, F> GeneticOperator<I> for F
where
    F: Fn(Vec<I>, usize, &mut dyn RngCore) -> Result<Vec<I>>,
{
    fn apply(
        &self,
        population: Vec<I>,
        population_size: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<I>> {
        self(population, population_size, rng)
    }
}
