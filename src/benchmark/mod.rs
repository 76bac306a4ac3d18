//! Headless benchmark runner.
//!
//! A [`Benchmark`] steps a set of evolutions until a stopping condition
//! fails, without any interface. Conditions are plain predicates over an
//! [`Evolution`], evaluated between steps:
//!
//! - [`condition_generation`]: stop after a number of generations
//! - [`condition_best_fitness`]: stop once the best fitness reaches a value
//!
//! Repeated runs of one setting are combined with [`average_histories`].
//!
//! ```
//! use evocomp::benchmark::{condition_generation, Benchmark};
//! use evocomp::evolution::{Evolution, EvolutionConfig};
//! use rand::{Rng, RngCore};
//!
//! let evolution = Evolution::builder(EvolutionConfig::new(10).with_seed(1))
//!     .random_generator(|rng: &mut dyn RngCore| -> evocomp::Result<f64> {
//!         Ok(rng.random_range(0.0..1.0))
//!     })
//!     .fitness_fn(|x: &f64| -> evocomp::Result<f64> { Ok(*x) })
//!     .build()
//!     .unwrap();
//!
//! let mut benchmark = Benchmark::new(vec![evolution], condition_generation(25));
//! let outcomes = benchmark.run().unwrap();
//! assert_eq!(outcomes[0].generations, 25);
//! ```

use crate::evolution::{is_better, Evolution};
use crate::io::{round_to, History, StatisticsRow, StatisticsSink};
use crate::Result;

/// Continue while fewer than `n` generations have been produced.
pub fn condition_generation<I, S>(n: usize) -> impl Fn(&Evolution<I, S>) -> bool {
    move |evolution: &Evolution<I, S>| evolution.generation() < n
}

/// Continue while the best fitness has not reached `value`.
///
/// Direction-aware: when maximizing the run stops once the best fitness is
/// `>= value`, when minimizing once it is `<= value`.
pub fn condition_best_fitness<I, S>(value: f64) -> impl Fn(&Evolution<I, S>) -> bool {
    move |evolution: &Evolution<I, S>| {
        let (_, best) = evolution.fittest_individual();
        is_better(value, best, evolution.is_proportional())
    }
}

/// Summary of one benchmarked evolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenchmarkOutcome {
    /// Generation counter when the condition stopped the run.
    pub generations: usize,
    /// Best fitness of the final generation.
    pub best_fitness: f64,
    pub mean_fitness: f64,
    pub median_fitness: f64,
}

/// Runs a set of evolutions until `condition` returns `false` for each.
pub struct Benchmark<I, S, C> {
    evolutions: Vec<Evolution<I, S>>,
    condition: C,
}

impl<I, S, C> Benchmark<I, S, C>
where
    S: StatisticsSink<I>,
    C: Fn(&Evolution<I, S>) -> bool,
{
    pub fn new(evolutions: Vec<Evolution<I, S>>, condition: C) -> Self {
        Self {
            evolutions,
            condition,
        }
    }

    /// Runs every evolution in order, then finalizes its sink.
    ///
    /// Stops at the first error; evolutions already finished keep their
    /// state.
    pub fn run(&mut self) -> Result<Vec<BenchmarkOutcome>> {
        let total = self.evolutions.len();
        let mut outcomes = Vec::with_capacity(total);

        for (i, evolution) in self.evolutions.iter_mut().enumerate() {
            while (self.condition)(&*evolution) {
                if let Err(err) = evolution.step() {
                    log::warn!(
                        "evolution {}/{} failed at generation {}: {}",
                        i + 1,
                        total,
                        evolution.generation(),
                        err
                    );
                    return Err(err);
                }
            }
            evolution.finalize()?;

            let outcome = BenchmarkOutcome {
                generations: evolution.generation(),
                best_fitness: evolution.fittest_individual().1,
                mean_fitness: evolution.mean_fitness(),
                median_fitness: evolution.median_fitness(),
            };
            log::info!(
                "evolution {}/{} finished after {} generations, best fitness {}",
                i + 1,
                total,
                outcome.generations,
                outcome.best_fitness
            );
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    pub fn evolutions(&self) -> &[Evolution<I, S>] {
        &self.evolutions
    }

    pub fn into_evolutions(self) -> Vec<Evolution<I, S>> {
        self.evolutions
    }
}

/// Per-generation average of several runs.
///
/// Row `g` holds the mean over all histories of the fittest, mean and median
/// fitness of generation `g`, rounded to `digits` decimal places. Only the
/// generations every history reached are averaged; no histories give no rows.
pub fn average_histories<I>(histories: &[History<I>], digits: u32) -> Vec<StatisticsRow> {
    let Some(len) = histories.iter().map(History::len).min() else {
        return Vec::new();
    };
    let runs = histories.len() as f64;

    (0..len)
        .map(|g| {
            let (fittest, mean, median) = histories
                .iter()
                .map(|history| &history.generations()[g])
                .fold((0.0, 0.0, 0.0), |(f, m, md), record| {
                    (f + record.fittest, m + record.mean, md + record.median)
                });
            StatisticsRow {
                fittest: round_to(fittest / runs, digits),
                mean: round_to(mean / runs, digits),
                median: round_to(median / runs, digits),
            }
        })
        .collect()
}
