//! Generic evolutionary computation.
//!
//! A small, representation-agnostic evolutionary algorithm engine with
//! pluggable strategies and a few ready-made problems:
//!
//! - **Evolution engine**: generation-stepping loop over opaque individuals,
//!   with cutoff and roulette wheel selection, mutation and crossover
//!   combinators, and fitness statistics.
//! - **Statistics sinks**: per-generation CSV rows and JSON histories.
//! - **Benchmark runner**: steps a set of evolutions until a stopping
//!   condition fails.
//! - **Settings files**: one evolution configuration per CSV row.
//! - **Problems**: 2D function landscapes and the traveling salesperson.
//! - **Text view**: several evolutions rendered side by side on a grid.
//!
//! # Quick start
//!
//! ```
//! use evocomp::evolution::{Evolution, EvolutionConfig, Mutation};
//! use rand::{Rng, RngCore};
//!
//! let mut evolution = Evolution::builder(EvolutionConfig::new(10).with_seed(7))
//!     .random_generator(|rng: &mut dyn RngCore| -> evocomp::Result<f64> {
//!         Ok(rng.random_range(0.0..1.0))
//!     })
//!     .fitness_fn(|x: &f64| -> evocomp::Result<f64> { Ok(*x) })
//!     .operator(Mutation::new(|x: &f64, _rng: &mut dyn RngCore| Ok(x + 0.1)))
//!     .build()?;
//!
//! evolution.step()?;
//! assert_eq!(evolution.generation(), 1);
//! # Ok::<(), evocomp::Error>(())
//! ```

pub mod benchmark;
pub mod evolution;
pub mod io;
pub mod problems;
pub mod settings;
pub mod view;

mod error;

pub use error::{Error, Result};
