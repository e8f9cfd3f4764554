use std::{error::Error, fmt};

/// The result type used in the entire gradient module.
pub type Result<T> = std::result::Result<T, GradErr>;

/// Errors produced when the inputs of a gradient accumulation are invalid.
#[derive(Debug, Clone, PartialEq)]
pub enum GradErr {
    /// A matrix or vector dimension disagrees with the declared block layout or with another
    /// input.
    Shape {
        /// Which input and axis failed (e.g. "phi rows", "bias").
        what: &'static str,
        /// Observed value.
        got: usize,
        /// Expected value.
        expected: usize,
    },

    /// A scalar configuration value is unusable.
    Config(ConfigErr),

    /// The nonlinearity returned a vector of the wrong length.
    Nonlinearity {
        step: usize,
        block: usize,
        got: usize,
        expected: usize,
    },
}

/// Configuration failures, kept apart from shape failures so callers can tell a bad layout from
/// a bad hyperparameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigErr {
    TooFewRegWeights { got: usize, min: usize },
    ZeroDimension(&'static str),
    LayoutOverflow { n: usize, blocks: usize },
    NonFiniteStep(f64),
}

impl fmt::Display for GradErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradErr::Shape {
                what,
                got,
                expected,
            } => write!(f, "shape mismatch for {what}: got {got}, expected {expected}"),
            GradErr::Config(e) => write!(f, "invalid configuration: {e}"),
            GradErr::Nonlinearity {
                step,
                block,
                got,
                expected,
            } => write!(
                f,
                "nonlinearity returned {got} values at step {step}, block {block}, expected {expected}"
            ),
        }
    }
}

impl fmt::Display for ConfigErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigErr::TooFewRegWeights { got, min } => {
                write!(f, "got {got} regularization weights, need at least {min}")
            }
            ConfigErr::ZeroDimension(what) => write!(f, "{what} must be positive"),
            ConfigErr::LayoutOverflow { n, blocks } => {
                write!(f, "{blocks} blocks of {n} rows overflow the row count")
            }
            ConfigErr::NonFiniteStep(dt) => write!(f, "time step must be finite, got {dt}"),
        }
    }
}

impl Error for GradErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GradErr::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl Error for ConfigErr {}

impl From<ConfigErr> for GradErr {
    fn from(value: ConfigErr) -> Self {
        Self::Config(value)
    }
}
