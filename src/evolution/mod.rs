//! Evolution engine.
//!
//! A generic, representation-agnostic engine. Individuals are opaque; the
//! caller describes the problem through four strategies:
//!
//! - [`RandomGenerator`]: creates random individuals
//! - [`FitnessFn`]: scores an individual
//! - [`SelectionScheme`]: narrows the population to survivors
//! - [`GeneticOperator`]: turns survivors into the next population
//!
//! # Key Types
//!
//! - [`EvolutionConfig`]: population size, direction, seed
//! - [`Evolution`]: owns the population and runs the generation loop
//! - [`Selection`]: cutoff and roulette wheel selection
//! - [`Mutation`] / [`Crossover`]: operator combinators
//! - [`GenerationSnapshot`]: read-only view with fitness statistics
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*

mod config;
mod engine;
pub mod operators;
mod selection;
mod stats;
mod types;

pub use config::EvolutionConfig;
pub use engine::{Evolution, EvolutionBuilder};
pub use operators::{Crossover, Mutation};
pub use selection::Selection;
pub use stats::{fittest_index, mean, median, GenerationSnapshot};
pub use types::{FitnessFn, GeneticOperator, RandomGenerator, SelectionScheme};

pub(crate) use stats::is_better;
