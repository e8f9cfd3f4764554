use serde::Serialize;

use crate::{BlockDims, GradientAccumulator, RegWeights, Result};

/// How the blocks of a single time step are evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Parallelism {
    /// One block after the other on the calling thread.
    #[default]
    Sequential,
    /// Blocks spread over the rayon thread pool, merged back in block order.
    Blocks,
}

/// Builds `GradientAccumulator`s.
///
/// Without further calls it yields no regularization, a unit time step and sequential
/// evaluation.
#[derive(Debug, Clone)]
pub struct AccumulatorBuilder {
    dims: BlockDims,
    reg: Option<RegWeights>,
    dt: f64,
    parallelism: Parallelism,
}

impl AccumulatorBuilder {
    /// Creates a new `AccumulatorBuilder`.
    ///
    /// # Args
    /// * `dims` - The layout of the stacked data matrices.
    pub fn new(dims: BlockDims) -> Self {
        Self {
            dims,
            reg: None,
            dt: 1.,
            parallelism: Parallelism::default(),
        }
    }

    pub fn reg(mut self, reg: RegWeights) -> Self {
        self.reg = Some(reg);
        self
    }

    pub fn dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    pub fn parallelism(mut self, parallelism: Parallelism) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Builds the `GradientAccumulator`.
    ///
    /// # Returns
    /// A `GradientAccumulator` whose `compute` evaluates blocks as selected by `parallelism`.
    ///
    /// # Errors
    /// Returns `GradErr::Config` if `dt` is not finite.
    pub fn build(self) -> Result<GradientAccumulator> {
        let reg = match self.reg {
            Some(reg) => reg,
            None => RegWeights::new([0., 0.])?,
        };

        let accumulator = GradientAccumulator::new(self.dims, reg, self.dt)?;
        Ok(accumulator.with_parallelism(self.parallelism))
    }
}
