use std::num::NonZeroUsize;

use crate::error::{ConfigErr, Result};

/// The minimum amount of regularization weights a `RegWeights` accepts.
pub const MIN_REG_WEIGHTS: usize = 2;

/// Layout of the stacked data matrices: `blocks` row blocks of `n` rows each, and `steps` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockDims {
    n: NonZeroUsize,
    blocks: NonZeroUsize,
    steps: NonZeroUsize,
}

impl BlockDims {
    /// Creates a new `BlockDims`.
    ///
    /// # Args
    /// * `n` - Rows per block, also the side of the weight matrix.
    /// * `blocks` - Amount of independent blocks stacked in the data matrices.
    /// * `steps` - Amount of time steps (columns) in the data matrices.
    ///
    /// # Returns
    /// A `BlockDims` instance.
    ///
    /// # Errors
    /// Returns `ConfigErr::LayoutOverflow` if `n * blocks` doesn't fit in a `usize`.
    pub fn new(n: NonZeroUsize, blocks: NonZeroUsize, steps: NonZeroUsize) -> Result<Self> {
        if n.checked_mul(blocks).is_none() {
            return Err(ConfigErr::LayoutOverflow {
                n: n.get(),
                blocks: blocks.get(),
            }
            .into());
        }

        Ok(Self { n, blocks, steps })
    }

    /// Same as `new` but from plain integers.
    ///
    /// # Errors
    /// Returns `ConfigErr::ZeroDimension` naming the first zero dimension, or
    /// `ConfigErr::LayoutOverflow` as `new` does.
    pub fn try_new(n: usize, blocks: usize, steps: usize) -> Result<Self> {
        let nonzero = |v, what| NonZeroUsize::new(v).ok_or(ConfigErr::ZeroDimension(what));

        Self::new(
            nonzero(n, "block size")?,
            nonzero(blocks, "block count")?,
            nonzero(steps, "time steps")?,
        )
    }

    pub fn n(&self) -> usize {
        self.n.get()
    }

    pub fn blocks(&self) -> usize {
        self.blocks.get()
    }

    pub fn steps(&self) -> usize {
        self.steps.get()
    }

    /// Returns the amount of rows of a stacked data matrix, `n * blocks`. Never overflows, it's
    /// checked on construction.
    pub fn rows(&self) -> usize {
        self.n() * self.blocks()
    }
}

/// A validated regularization weight sequence.
///
/// Only the second entry acts as the L2 coefficient; the first one is carried but never read.
#[derive(Debug, Clone, PartialEq)]
pub struct RegWeights {
    weights: Box<[f64]>,
}

impl RegWeights {
    /// Creates a new `RegWeights`.
    ///
    /// # Errors
    /// Returns `ConfigErr::TooFewRegWeights` if fewer than `MIN_REG_WEIGHTS` values are given.
    pub fn new<I>(weights: I) -> Result<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let weights: Box<[f64]> = weights.into_iter().collect();

        if weights.len() < MIN_REG_WEIGHTS {
            return Err(ConfigErr::TooFewRegWeights {
                got: weights.len(),
                min: MIN_REG_WEIGHTS,
            }
            .into());
        }

        Ok(Self { weights })
    }

    /// Returns the L2 penalty coefficient.
    pub fn lambda(&self) -> f64 {
        self.weights[1]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.weights
    }
}

/// Checks that `dt` is usable as a time step. Zero and negative values are valid.
pub(crate) fn check_step(dt: f64) -> Result<f64> {
    if !dt.is_finite() {
        return Err(ConfigErr::NonFiniteStep(dt).into());
    }

    Ok(dt)
}
