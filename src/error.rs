use thiserror::Error;

/// Errors raised while building a model, a mixture or a bounds object.
///
/// Evaluation never returns these: points outside the domain of a model
/// produce an infinite negative log likelihood instead.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Simulation requires measurement data")]
    MissingData,
    #[error("Simulation requires a simulation function")]
    MissingFunction,
    #[error("Covariance matrix is not positive definite")]
    NotPositiveDefinite,
    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Kurtosis parameter gamma must lie in (-1, 1], got {0}")]
    InvalidGamma(f64),
    #[error("Measurement uncertainty must be finite and positive, got {0}")]
    InvalidSigma(f64),
    #[error("Expected Mixture(M1, w1, M2, w2, ...): {0}")]
    InvalidMixture(String),
    #[error("Invalid bounds for parameter {index}: [{lower}, {upper}]")]
    InvalidBounds { index: usize, lower: f64, upper: f64 },
    #[error("Microslab step must be finite and positive, got {0}")]
    InvalidStep(f64),
    #[error("Could not start thread pool: {0}")]
    ThreadPool(String),
    #[error("Unknown option `{value}` for {what}")]
    UnknownOption { what: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, ModelError>;
