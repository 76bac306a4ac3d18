//! Engine configuration.
//!
//! [`EvolutionConfig`] holds the parameters that are fixed for the lifetime
//! of an [`Evolution`](super::Evolution).

use crate::{Error, Result};

/// Configuration for an evolution run.
///
/// # Builder Pattern
///
/// ```
/// use evocomp::evolution::EvolutionConfig;
///
/// let config = EvolutionConfig::new(50)
///     .with_proportional(false)
///     .with_seed(42);
/// assert_eq!(config.population_size, 50);
/// assert!(!config.proportional);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EvolutionConfig {
    /// Number of individuals in every generation.
    pub population_size: usize,

    /// Direction of "better": `true` maximizes fitness, `false` minimizes it.
    pub proportional: bool,

    /// Random seed for reproducibility.
    ///
    /// `None` draws a seed from the operating system.
    pub seed: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            proportional: true,
            seed: None,
        }
    }
}

impl EvolutionConfig {
    /// Creates a maximizing configuration with the given population size.
    pub fn new(population_size: usize) -> Self {
        Self {
            population_size,
            ..Self::default()
        }
    }

    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the fitness direction.
    pub fn with_proportional(mut self, proportional: bool) -> Self {
        self.proportional = proportional;
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(Error::InvalidConfiguration(
                "population_size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
