//! Traveling salesperson problem.
//!
//! A solution is a permutation of node indices, read as a closed tour.
//! [`Tsp::evolution`] builds a minimizing [`Evolution`] over tours with
//! cutoff selection, random swap or segment-reversal mutation and,
//! optionally, order crossover.

use crate::evolution::operators::{invert_mutation, order_crossover, swap_mutation};
use crate::evolution::{Crossover, Evolution, EvolutionConfig, Mutation, Selection};
use crate::io::StatisticsSink;
use crate::{Error, Result};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// A tour: every node index exactly once.
pub type Tour = Vec<usize>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct NodeRow {
    x: f64,
    y: f64,
}

/// Nodes in the plane with their Euclidean distance matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Tsp {
    nodes: Vec<[f64; 2]>,
    distances: Vec<Vec<f64>>,
}

impl Tsp {
    /// `nodecount` nodes drawn uniformly from `[0, coordinate_range)²`.
    pub fn random<R: Rng + ?Sized>(
        nodecount: usize,
        coordinate_range: f64,
        rng: &mut R,
    ) -> Result<Self> {
        if !coordinate_range.is_finite() || coordinate_range <= 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "coordinate range must be positive, got {coordinate_range}"
            )));
        }
        let nodes = (0..nodecount)
            .map(|_| {
                [
                    rng.random::<f64>() * coordinate_range,
                    rng.random::<f64>() * coordinate_range,
                ]
            })
            .collect();
        Self::from_nodes(nodes)
    }

    /// # Errors
    /// [`Error::InvalidConfiguration`] if `nodes` is empty.
    pub fn from_nodes(nodes: Vec<[f64; 2]>) -> Result<Self> {
        if nodes.is_empty() {
            return Err(Error::InvalidConfiguration(
                "a TSP needs at least one node".into(),
            ));
        }
        let distances = nodes
            .iter()
            .map(|a| nodes.iter().map(|b| euclidean(a, b)).collect())
            .collect();
        Ok(Self { nodes, distances })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[[f64; 2]] {
        &self.nodes
    }

    pub fn distance(&self, from: usize, to: usize) -> f64 {
        self.distances[from][to]
    }

    /// A uniformly shuffled tour.
    pub fn random_solution<R: Rng + ?Sized>(&self, rng: &mut R) -> Tour {
        let mut tour: Tour = (0..self.nodes.len()).collect();
        tour.shuffle(rng);
        tour
    }

    /// Length of the closed tour, including the edge back to the start.
    pub fn solution_cost(&self, tour: &[usize]) -> f64 {
        let n = tour.len();
        (0..n).map(|i| self.distance(tour[i], tour[(i + 1) % n])).sum()
    }

    /// `true` if `tour` visits every node exactly once.
    pub fn is_valid_tour(&self, tour: &[usize]) -> bool {
        let mut seen = vec![false; self.nodes.len()];
        tour.len() == self.nodes.len()
            && tour
                .iter()
                .all(|&node| node < seen.len() && !std::mem::replace(&mut seen[node], true))
    }

    /// Writes the node coordinates as an `x,y` table.
    pub fn save_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path.as_ref())?;
        for &[x, y] in &self.nodes {
            writer.serialize(NodeRow { x, y })?;
        }
        writer.flush()?;
        log::debug!(
            "saved {} nodes to {}",
            self.nodes.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    /// Reads a table written by [`save_csv`](Self::save_csv).
    pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path.as_ref())?;
        let nodes = reader
            .deserialize()
            .map(|row| row.map(|NodeRow { x, y }| [x, y]))
            .collect::<std::result::Result<Vec<_>, csv::Error>>()?;
        Self::from_nodes(nodes)
    }

    /// Mutation performing `amount` swap attempts per tour, each with the
    /// given probability.
    ///
    /// # Errors
    /// [`Error::InvalidConfiguration`] if `probability` is outside `[0, 1]`.
    pub fn mutation(
        probability: f64,
        amount: usize,
    ) -> Result<Mutation<impl Fn(&Tour, &mut dyn RngCore) -> Result<Tour>>> {
        Self::mutation_with(TourMove::Swap, probability, amount)
    }

    /// Like [`mutation`](Self::mutation) with `tour_move` as the single move.
    pub fn mutation_with(
        tour_move: TourMove,
        probability: f64,
        amount: usize,
    ) -> Result<Mutation<impl Fn(&Tour, &mut dyn RngCore) -> Result<Tour>>> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(Error::InvalidConfiguration(format!(
                "{tour_move} probability must be in [0, 1], got {probability}"
            )));
        }
        Ok(Mutation::new(move |tour: &Tour, rng: &mut dyn RngCore| -> Result<Tour> {
            let mut mutated = tour.clone();
            for _ in 0..amount {
                if rng.random_bool(probability) {
                    tour_move.apply(&mut mutated, rng);
                }
            }
            Ok(mutated)
        }))
    }

    /// Builds a minimizing evolution over tours of `tsp`.
    pub fn evolution<S: StatisticsSink<Tour>>(
        tsp: Arc<Tsp>,
        config: &TspConfig,
        sink: S,
    ) -> Result<Evolution<Tour, S>> {
        config.validate()?;

        let generator_tsp = Arc::clone(&tsp);
        let mut builder = Evolution::builder(config.evolution.clone())
            .random_generator(move |rng: &mut dyn RngCore| -> Result<Tour> {
                Ok(generator_tsp.random_solution(rng))
            })
            .fitness_fn(move |tour: &Tour| -> Result<f64> { Ok(tsp.solution_cost(tour)) })
            .selection(Selection::Cutoff);

        if config.crossover {
            builder = builder.operator(
                Crossover::new(|a: &Tour, b: &Tour, rng: &mut dyn RngCore| {
                    order_crossover(a, b, rng)
                })
                .shuffled(),
            );
        }

        builder
            .operator(Tsp::mutation_with(
                config.tour_move,
                config.mutation_probability,
                config.mutation_amount,
            )?)
            .sink(sink)
            .build()
    }
}

impl fmt::Display for Tsp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TSP with {} nodes", self.nodes.len())
    }
}

fn euclidean(a: &[f64; 2], b: &[f64; 2]) -> f64 {
    (a[0] - b[0]).hypot(a[1] - b[1])
}

/// Local move applied by the TSP mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TourMove {
    /// Exchange two random nodes.
    #[default]
    Swap,
    /// Reverse a random segment (2-opt move).
    Invert,
}

impl TourMove {
    pub fn apply(&self, tour: &mut [usize], rng: &mut dyn RngCore) {
        match self {
            Self::Swap => swap_mutation(tour, rng),
            Self::Invert => invert_mutation(tour, rng),
        }
    }
}

impl fmt::Display for TourMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Swap => "swap",
            Self::Invert => "invert",
        })
    }
}

/// Parameters of a TSP evolution.
///
/// ```
/// use evocomp::problems::TspConfig;
///
/// let config = TspConfig::new(50).with_mutation(0.3, 2).with_seed(7);
/// assert!(!config.evolution.proportional);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TspConfig {
    /// Engine configuration; always minimizing.
    pub evolution: EvolutionConfig,

    /// Probability of each move attempt.
    pub mutation_probability: f64,

    /// Move attempts per tour.
    pub mutation_amount: usize,

    /// Move tried by each attempt.
    pub tour_move: TourMove,

    /// Recombine parents with order crossover before mutating.
    pub crossover: bool,
}

impl TspConfig {
    pub fn new(population_size: usize) -> Self {
        Self {
            evolution: EvolutionConfig::new(population_size).with_proportional(false),
            mutation_probability: 0.1,
            mutation_amount: 1,
            tour_move: TourMove::Swap,
            crossover: false,
        }
    }

    pub fn with_tour_move(mut self, tour_move: TourMove) -> Self {
        self.tour_move = tour_move;
        self
    }

    pub fn with_mutation(mut self, probability: f64, amount: usize) -> Self {
        self.mutation_probability = probability;
        self.mutation_amount = amount;
        self
    }

    pub fn with_crossover(mut self, crossover: bool) -> Self {
        self.crossover = crossover;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.evolution = self.evolution.with_seed(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.evolution.validate()?;
        if self.evolution.proportional {
            return Err(Error::InvalidConfiguration(
                "tour length must be minimized".into(),
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
}
