//! Gradients of a block/time bilinear objective with respect to a weight matrix and a bias
//! vector, for fitting dynamical models to stacked trajectory data.

mod accumulator;
pub mod activations;
mod blocks;
mod builder;
mod config;
mod error;
mod history;
mod ops;

pub use accumulator::{GradientAccumulator, Gradients, accumulate_gradients};
pub use builder::{AccumulatorBuilder, Parallelism};
pub use config::{BlockDims, MIN_REG_WEIGHTS, RegWeights};
pub use error::{ConfigErr, GradErr, Result};
pub use history::{GradientHistory, NormSeries, series_norms};
pub use ops::outer_product;
