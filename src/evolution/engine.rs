//! Generation-stepping engine.
//!
//! [`Evolution`] owns the population and advances it one generation per
//! [`step`](Evolution::step): selection → operators → evaluation → swap.

use super::config::EvolutionConfig;
use super::selection::Selection;
use super::stats::GenerationSnapshot;
use super::types::{FitnessFn, GeneticOperator, RandomGenerator, SelectionScheme};
use crate::io::StatisticsSink;
use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// A running evolution.
///
/// Constructed through [`Evolution::builder`]. The initial population is
/// generated and evaluated when the builder's [`build`](EvolutionBuilder::build)
/// is called; every successful [`step`](Evolution::step) replaces it with the
/// next generation.
///
/// The type parameter `S` is the [`StatisticsSink`] notified after
/// construction and after every step. The default `()` discards everything.
///
/// # Usage
///
/// ```
/// use evocomp::evolution::{Evolution, EvolutionConfig, Mutation, Selection};
/// use rand::{Rng, RngCore};
///
/// let mut evolution = Evolution::builder(EvolutionConfig::new(20).with_seed(42))
///     .random_generator(|rng: &mut dyn RngCore| -> evocomp::Result<f64> {
///         Ok(rng.random_range(-10.0..10.0))
///     })
///     .fitness_fn(|x: &f64| -> evocomp::Result<f64> { Ok(-x * x) })
///     .selection(Selection::Cutoff)
///     .operator(Mutation::new(|x: &f64, rng: &mut dyn RngCore| {
///         Ok(x + rng.random_range(-0.5..0.5))
///     }))
///     .build()
///     .unwrap();
///
/// for _ in 0..50 {
///     evolution.step().unwrap();
/// }
/// assert_eq!(evolution.generation(), 50);
/// let (_, best) = evolution.fittest_individual();
/// assert!(best > -1.0);
/// ```
pub struct Evolution<I, S = ()> {
    config: EvolutionConfig,
    fitness_fn: Box<dyn FitnessFn<I>>,
    selection: Box<dyn SelectionScheme<I>>,
    operators: Vec<Box<dyn GeneticOperator<I>>>,
    sink: S,
    rng: StdRng,
    generation: usize,
    current_population: Vec<I>,
    current_fitness_values: Vec<f64>,
}

impl<I: Clone + 'static> Evolution<I> {
    /// Starts building an evolution with cutoff selection, no operators and
    /// no sink.
    pub fn builder(config: EvolutionConfig) -> EvolutionBuilder<I> {
        EvolutionBuilder {
            config,
            random_generator: None,
            fitness_fn: None,
            selection: Box::new(Selection::Cutoff),
            operators: Vec::new(),
            sink: (),
            rng: None,
        }
    }
}

impl<I, S: StatisticsSink<I>> Evolution<I, S> {
    /// Advances one generation.
    ///
    /// On error the previous generation (population, fitness values and
    /// generation counter) is left untouched. Errors raised by the sink are
    /// the exception: they are reported after the new generation is in place.
    pub fn step(&mut self) -> Result<()> {
        let next_population = self.next_population()?;
        let next_fitness_values = evaluate(&*self.fitness_fn, &next_population)?;

        self.current_population = next_population;
        self.current_fitness_values = next_fitness_values;
        self.generation += 1;

        log::debug!(
            "generation {}: best={} mean={}",
            self.generation,
            self.fittest_individual().1,
            self.mean_fitness()
        );

        self.report()
    }

    /// Calls the sink's `finalize`.
    pub fn finalize(&mut self) -> Result<()> {
        self.sink.finalize()
    }

    fn next_population(&mut self) -> Result<Vec<I>> {
        let expected = self.config.population_size;

        let mut population = self.selection.select(
            &self.current_population,
            &self.current_fitness_values,
            self.config.proportional,
            &mut self.rng,
        )?;
        for operator in &self.operators {
            population = operator.apply(population, expected, &mut self.rng)?;
        }

        if population.len() != expected {
            return Err(Error::PopulationSize {
                expected,
                actual: population.len(),
            });
        }
        Ok(population)
    }

    fn report(&mut self) -> Result<()> {
        let snapshot = GenerationSnapshot::new(
            self.generation,
            &self.current_population,
            &self.current_fitness_values,
            self.config.proportional,
        );
        self.sink.on_generation(&snapshot)
    }
}

impl<I, S> Evolution<I, S> {
    /// Number of completed steps.
    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn population_size(&self) -> usize {
        self.config.population_size
    }

    /// `true` if higher fitness is better.
    pub fn is_proportional(&self) -> bool {
        self.config.proportional
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub fn current_population(&self) -> &[I] {
        &self.current_population
    }

    /// Fitness values aligned by index with [`current_population`](Self::current_population).
    pub fn current_fitness_values(&self) -> &[f64] {
        &self.current_fitness_values
    }

    /// Read-only view of the current generation.
    pub fn snapshot(&self) -> GenerationSnapshot<'_, I> {
        GenerationSnapshot::new(
            self.generation,
            &self.current_population,
            &self.current_fitness_values,
            self.config.proportional,
        )
    }

    /// The fittest individual of the current generation and its fitness.
    ///
    /// Maximum fitness when proportional, minimum otherwise. Ties go to the
    /// first individual in population order.
    pub fn fittest_individual(&self) -> (&I, f64) {
        self.snapshot().fittest()
    }

    /// Mean fitness of the current generation.
    pub fn mean_fitness(&self) -> f64 {
        self.snapshot().mean()
    }

    /// Median fitness of the current generation.
    pub fn median_fitness(&self) -> f64 {
        self.snapshot().median()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consumes the evolution and returns its sink.
    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// Builder for [`Evolution`].
pub struct EvolutionBuilder<I, S = ()> {
    config: EvolutionConfig,
    random_generator: Option<Box<dyn RandomGenerator<I>>>,
    fitness_fn: Option<Box<dyn FitnessFn<I>>>,
    selection: Box<dyn SelectionScheme<I>>,
    operators: Vec<Box<dyn GeneticOperator<I>>>,
    sink: S,
    rng: Option<StdRng>,
}

impl<I: 'static, S> EvolutionBuilder<I, S> {
    /// Sets the random individual generator.
    pub fn random_generator(mut self, generator: impl RandomGenerator<I> + 'static) -> Self {
        self.random_generator = Some(Box::new(generator));
        self
    }

    /// Sets the fitness function.
    pub fn fitness_fn(mut self, fitness_fn: impl FitnessFn<I> + 'static) -> Self {
        self.fitness_fn = Some(Box::new(fitness_fn));
        self
    }

    /// Sets the selection scheme.
    pub fn selection(mut self, selection: impl SelectionScheme<I> + 'static) -> Self {
        self.selection = Box::new(selection);
        self
    }

    /// Appends a genetic operator. Operators run in the order they are added.
    pub fn operator(mut self, operator: impl GeneticOperator<I> + 'static) -> Self {
        self.operators.push(Box::new(operator));
        self
    }

    /// Uses the given random source instead of seeding one from the config.
    pub fn rng(mut self, rng: StdRng) -> Self {
        self.rng = Some(rng);
        self
    }

    /// Replaces the statistics sink.
    pub fn sink<T>(self, sink: T) -> EvolutionBuilder<I, T> {
        EvolutionBuilder {
            config: self.config,
            random_generator: self.random_generator,
            fitness_fn: self.fitness_fn,
            selection: self.selection,
            operators: self.operators,
            sink,
            rng: self.rng,
        }
    }
}

impl<I, S: StatisticsSink<I>> EvolutionBuilder<I, S> {
    /// Generates and evaluates the initial population.
    ///
    /// # Errors
    /// [`Error::InvalidConfiguration`] if the config is invalid or the random
    /// generator or fitness function is missing; any error raised by the
    /// strategies or the sink.
    pub fn build(self) -> Result<Evolution<I, S>> {
        self.config.validate()?;
        let random_generator = self.random_generator.ok_or_else(|| {
            Error::InvalidConfiguration("a random generator is required".into())
        })?;
        let fitness_fn = self
            .fitness_fn
            .ok_or_else(|| Error::InvalidConfiguration("a fitness function is required".into()))?;

        let mut rng = match (self.rng, self.config.seed) {
            (Some(rng), _) => rng,
            (None, Some(seed)) => StdRng::seed_from_u64(seed),
            (None, None) => {
                let seed: u64 = rand::random();
                log::debug!("seeding evolution with {seed}");
                StdRng::seed_from_u64(seed)
            }
        };

        let current_population = (0..self.config.population_size)
            .map(|_| random_generator.generate(&mut rng))
            .collect::<Result<Vec<I>>>()?;
        let current_fitness_values = evaluate(&*fitness_fn, &current_population)?;

        let mut evolution = Evolution {
            config: self.config,
            fitness_fn,
            selection: self.selection,
            operators: self.operators,
            sink: self.sink,
            rng,
            generation: 0,
            current_population,
            current_fitness_values,
        };
        evolution.report()?;
        Ok(evolution)
    }
}

/// Evaluate every individual, rejecting NaN fitness.
fn evaluate<I>(fitness_fn: &dyn FitnessFn<I>, population: &[I]) -> Result<Vec<f64>> {
    population
        .iter()
        .map(|individual| {
            let f = fitness_fn.fitness(individual)?;
            if f.is_nan() {
                return Err(Error::InvalidFitness(
                    "fitness function returned NaN".into(),
                ));
            }
            Ok(f)
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolution::{Crossover, Mutation};
    use proptest::prelude::*;
    use rand::{Rng, RngCore};
    use std::cell::Cell;
    use std::rc::Rc;

    fn uniform(rng: &mut dyn RngCore) -> Result<f64> {
        Ok(rng.random_range(0.0..100.0))
    }

    fn identity(x: &f64) -> Result<f64> {
        Ok(*x)
    }

    /// Random generator yielding 1, 2, 3, ... in order.
    fn counting() -> impl Fn(&mut dyn RngCore) -> Result<f64> {
        let next = Cell::new(0.0);
        move |_rng: &mut dyn RngCore| -> Result<f64> {
            next.set(next.get() + 1.0);
            Ok(next.get())
        }
    }

    #[derive(Default)]
    struct Recorder {
        generations: Vec<(usize, f64, f64, f64)>,
        finalized: bool,
    }

    impl StatisticsSink<f64> for Recorder {
        fn on_generation(&mut self, snapshot: &GenerationSnapshot<'_, f64>) -> Result<()> {
            self.generations.push((
                snapshot.generation(),
                snapshot.fittest().1,
                snapshot.mean(),
                snapshot.median(),
            ));
            Ok(())
        }

        fn finalize(&mut self) -> Result<()> {
            self.finalized = true;
            Ok(())
        }
    }

    #[test]
    fn test_construction_sizes() {
        let evolution = Evolution::builder(EvolutionConfig::new(17).with_seed(42))
            .random_generator(uniform)
            .fitness_fn(identity)
            .build()
            .unwrap();

        assert_eq!(evolution.generation(), 0);
        assert_eq!(evolution.current_population().len(), 17);
        assert_eq!(evolution.current_fitness_values().len(), 17);
    }

    #[test]
    fn test_zero_population_is_invalid() {
        let result = Evolution::builder(EvolutionConfig::new(0))
            .random_generator(uniform)
            .fitness_fn(identity)
            .build();
        assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn test_missing_strategies_are_invalid() {
        let result = Evolution::builder(EvolutionConfig::new(4))
            .fitness_fn(identity)
            .build();
        assert!(matches!(result, Err(Error::InvalidConfiguration(_))));

        let result = Evolution::builder(EvolutionConfig::new(4))
            .random_generator(uniform)
            .build();
        assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn test_cutoff_scenario_before_operators() {
        let seen = Rc::new(std::cell::RefCell::new(Vec::new()));
        let seen_in_op = Rc::clone(&seen);

        let mut evolution = Evolution::builder(EvolutionConfig::new(4).with_seed(1))
            .random_generator(counting())
            .fitness_fn(identity)
            .operator(move |pop: Vec<f64>, _size: usize, _rng: &mut dyn RngCore| -> Result<Vec<f64>> {
                seen_in_op.borrow_mut().push(pop.clone());
                Ok(pop)
            })
            .build()
            .unwrap();

        assert_eq!(evolution.current_population(), &[1.0, 2.0, 3.0, 4.0]);
        evolution.step().unwrap();
        assert_eq!(seen.borrow()[0], vec![3.0, 4.0, 3.0, 4.0]);
        assert_eq!(evolution.current_population(), &[3.0, 4.0, 3.0, 4.0]);
    }

    #[test]
    fn test_mean_and_median() {
        let evolution = Evolution::builder(EvolutionConfig::new(4).with_seed(1))
            .random_generator(counting())
            .fitness_fn(identity)
            .build()
            .unwrap();

        assert!((evolution.mean_fitness() - 2.5).abs() < 1e-12);
        assert!((evolution.median_fitness() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_fittest_respects_direction() {
        let max = Evolution::builder(EvolutionConfig::new(5).with_seed(1))
            .random_generator(counting())
            .fitness_fn(identity)
            .build()
            .unwrap();
        assert_eq!(max.fittest_individual(), (&5.0, 5.0));

        let min = Evolution::builder(EvolutionConfig::new(5).with_seed(1).with_proportional(false))
            .random_generator(counting())
            .fitness_fn(identity)
            .build()
            .unwrap();
        assert_eq!(min.fittest_individual(), (&1.0, 1.0));
    }

    #[test]
    fn test_step_increments_generation_and_keeps_size() {
        let mut evolution = Evolution::builder(EvolutionConfig::new(10).with_seed(42))
            .random_generator(uniform)
            .fitness_fn(identity)
            .operator(Mutation::new(|x: &f64, rng: &mut dyn RngCore| {
                Ok(x + rng.random_range(-1.0..1.0))
            }))
            .build()
            .unwrap();

        for expected in 1..=5 {
            evolution.step().unwrap();
            assert_eq!(evolution.generation(), expected);
            assert_eq!(evolution.current_population().len(), 10);
            assert_eq!(evolution.current_fitness_values().len(), 10);
        }
    }

    #[test]
    fn test_singleton_population() {
        let mut evolution = Evolution::builder(EvolutionConfig::new(1).with_seed(42))
            .random_generator(uniform)
            .fitness_fn(identity)
            .operator(Crossover::new(|a: &f64, b: &f64, _rng: &mut dyn RngCore| {
                Ok((a + b) / 2.0)
            }))
            .build()
            .unwrap();

        let before = evolution.current_population()[0];
        evolution.step().unwrap();
        assert_eq!(evolution.current_population(), &[before]);
    }

    #[test]
    fn test_constant_fitness_cutoff_is_stable() {
        let mut evolution = Evolution::builder(EvolutionConfig::new(6).with_seed(1))
            .random_generator(counting())
            .fitness_fn(|_x: &f64| -> Result<f64> { Ok(1.0) })
            .build()
            .unwrap();

        evolution.step().unwrap();
        let survivors = evolution.current_population().to_vec();
        assert_eq!(survivors, vec![4.0, 5.0, 6.0, 4.0, 5.0, 6.0]);
        for _ in 0..5 {
            evolution.step().unwrap();
            assert_eq!(evolution.current_population(), survivors.as_slice());
        }
    }

    #[test]
    fn test_failed_step_leaves_state_intact() {
        let calls = Rc::new(Cell::new(0usize));
        let calls_in_fitness = Rc::clone(&calls);

        let mut evolution = Evolution::builder(EvolutionConfig::new(4).with_seed(1))
            .random_generator(counting())
            .fitness_fn(move |x: &f64| -> Result<f64> {
                calls_in_fitness.set(calls_in_fitness.get() + 1);
                // Fail on the last evaluation of the second generation.
                if calls_in_fitness.get() == 8 {
                    return Err(anyhow::anyhow!("fitness failure").into());
                }
                Ok(*x)
            })
            .operator(Mutation::new(|x: &f64, _rng: &mut dyn RngCore| Ok(x + 100.0)))
            .build()
            .unwrap();

        let population = evolution.current_population().to_vec();
        let fitness = evolution.current_fitness_values().to_vec();

        let err = evolution.step().unwrap_err();
        assert!(matches!(err, Error::Callback(_)));
        assert_eq!(evolution.generation(), 0);
        assert_eq!(evolution.current_population(), population.as_slice());
        assert_eq!(evolution.current_fitness_values(), fitness.as_slice());

        // Later steps work again.
        evolution.step().unwrap();
        assert_eq!(evolution.generation(), 1);
    }

    #[test]
    fn test_operator_error_leaves_state_intact() {
        let mut evolution = Evolution::builder(EvolutionConfig::new(4).with_seed(1))
            .random_generator(counting())
            .fitness_fn(identity)
            .operator(|_pop: Vec<f64>, _size: usize, _rng: &mut dyn RngCore| -> Result<Vec<f64>> {
                Err(anyhow::anyhow!("operator failure").into())
            })
            .build()
            .unwrap();

        assert!(evolution.step().is_err());
        assert_eq!(evolution.generation(), 0);
        assert_eq!(evolution.current_population(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_wrong_population_size_is_rejected() {
        let mut evolution = Evolution::builder(EvolutionConfig::new(4).with_seed(1))
            .random_generator(counting())
            .fitness_fn(identity)
            .operator(|mut pop: Vec<f64>, _size: usize, _rng: &mut dyn RngCore| -> Result<Vec<f64>> {
                pop.truncate(2);
                Ok(pop)
            })
            .build()
            .unwrap();

        let err = evolution.step().unwrap_err();
        assert!(matches!(
            err,
            Error::PopulationSize {
                expected: 4,
                actual: 2
            }
        ));
        assert_eq!(evolution.current_population().len(), 4);
    }

    #[test]
    fn test_nan_fitness_is_invalid() {
        let result = Evolution::builder(EvolutionConfig::new(3).with_seed(1))
            .random_generator(uniform)
            .fitness_fn(|_x: &f64| -> Result<f64> { Ok(f64::NAN) })
            .build();
        assert!(matches!(result, Err(Error::InvalidFitness(_))));
    }

    #[test]
    fn test_sink_sees_initial_and_each_step() {
        let mut evolution = Evolution::builder(EvolutionConfig::new(4).with_seed(1))
            .random_generator(counting())
            .fitness_fn(identity)
            .sink(Recorder::default())
            .build()
            .unwrap();

        evolution.step().unwrap();
        evolution.step().unwrap();
        evolution.finalize().unwrap();

        let recorder = evolution.into_sink();
        assert!(recorder.finalized);
        let generations: Vec<usize> = recorder.generations.iter().map(|g| g.0).collect();
        assert_eq!(generations, vec![0, 1, 2]);
        assert_eq!(recorder.generations[0], (0, 4.0, 2.5, 2.5));
        assert_eq!(recorder.generations[1], (1, 4.0, 3.5, 3.5));
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = |seed: u64| {
            let mut evolution = Evolution::builder(EvolutionConfig::new(8).with_seed(seed))
                .random_generator(uniform)
                .fitness_fn(identity)
                .selection(Selection::RouletteWheel)
                .operator(Mutation::new(|x: &f64, rng: &mut dyn RngCore| {
                    Ok(x + rng.random_range(-1.0..1.0))
                }))
                .build()
                .unwrap();
            for _ in 0..10 {
                evolution.step().unwrap();
            }
            evolution.current_population().to_vec()
        };
        assert_eq!(run(9), run(9));
    }

    #[test]
    fn test_injected_rng() {
        let a = Evolution::builder(EvolutionConfig::new(5))
            .random_generator(uniform)
            .fitness_fn(identity)
            .rng(StdRng::seed_from_u64(3))
            .build()
            .unwrap();
        let b = Evolution::builder(EvolutionConfig::new(5).with_seed(3))
            .random_generator(uniform)
            .fitness_fn(identity)
            .build()
            .unwrap();
        assert_eq!(a.current_population(), b.current_population());
    }

    #[test]
    fn test_optimizes_toward_maximum() {
        let mut evolution = Evolution::builder(EvolutionConfig::new(30).with_seed(42))
            .random_generator(|rng: &mut dyn RngCore| -> Result<f64> {
                Ok(rng.random_range(-10.0..10.0))
            })
            .fitness_fn(|x: &f64| -> Result<f64> { Ok(-(x - 3.0) * (x - 3.0)) })
            .operator(
                Mutation::new(|x: &f64, rng: &mut dyn RngCore| Ok(x + rng.random_range(-0.5..0.5)))
                    .with_probability(0.5),
            )
            .build()
            .unwrap();

        for _ in 0..100 {
            evolution.step().unwrap();
        }
        let (best, _) = evolution.fittest_individual();
        assert!((best - 3.0).abs() < 0.5, "expected ~3.0, got {best}");
    }

    proptest! {
        #[test]
        fn prop_sizes_preserved(size in 1usize..40, steps in 0usize..5, seed in any::<u64>()) {
            let mut evolution = Evolution::builder(EvolutionConfig::new(size).with_seed(seed))
                .random_generator(uniform)
                .fitness_fn(identity)
                .operator(Crossover::new(|a: &f64, b: &f64, _rng: &mut dyn RngCore| Ok((a + b) / 2.0)).shuffled())
                .build()
                .unwrap();
            for _ in 0..steps {
                evolution.step().unwrap();
            }
            prop_assert_eq!(evolution.generation(), steps);
            prop_assert_eq!(evolution.current_population().len(), size);
            prop_assert_eq!(evolution.current_fitness_values().len(), size);

            let (best, fitness) = evolution.fittest_individual();
            let max = evolution
                .current_fitness_values()
                .iter()
                .cloned()
                .fold(f64::NEG_INFINITY, f64::max);
            prop_assert_eq!(fitness, max);
            prop_assert_eq!(*best, fitness);
        }
    }
}
