//! Crate-wide error type.

/// Errors raised by the engine, its collaborators, and caller-supplied
/// strategies.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configuration value or settings row is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Fitness values cannot be used by the requested operation.
    #[error("invalid fitness: {0}")]
    InvalidFitness(String),

    /// The operator chain did not regenerate the population to its size.
    #[error("operators produced {actual} individuals, expected {expected}")]
    PopulationSize { expected: usize, actual: usize },

    /// A display grid is too small for the evolutions it should hold.
    #[error("layout {rows}x{columns} cannot hold {count} evolutions")]
    Layout {
        rows: usize,
        columns: usize,
        count: usize,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failure raised inside a caller-supplied strategy.
    #[error("strategy failed: {0}")]
    Callback(#[from] anyhow::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
