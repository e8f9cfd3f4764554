use log::{debug, trace};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rayon::prelude::*;

use crate::{
    BlockDims, GradErr, Parallelism, RegWeights, Result,
    activations::Nonlinearity,
    blocks::{self, StackedBlocks},
    config::check_step,
    ops::outer_product,
};

/// The gradient of the loss with respect to the weight matrix and the bias vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradients {
    /// Same shape as the weight matrix, `(n, n)`.
    pub v: Array2<f64>,
    /// Same length as the bias vector, `n`.
    pub b: Array1<f64>,
}

impl Gradients {
    /// Returns a zeroed gradient pair for blocks of size `n`.
    pub fn zeros(n: usize) -> Self {
        Self {
            v: Array2::zeros((n, n)),
            b: Array1::zeros(n),
        }
    }

    pub fn into_parts(self) -> (Array2<f64>, Array1<f64>) {
        (self.v, self.b)
    }
}

/// Accumulates the gradients of a block/time objective over stacked data matrices.
///
/// For every time step `k` in `0..steps - 1` and every block `i` (time outer, block inner):
///
/// ```text
/// grad_v += dt * outer(phi[i, k], sigma(x[i, k]))
/// grad_b += dt * phi[i, k]
/// ```
///
/// and finally `grad_v += dt * lambda * v`, `grad_b += dt * lambda * b`. The summation order is
/// fixed so results are reproducible bit for bit, whatever the `Parallelism` mode.
#[derive(Debug, Clone)]
pub struct GradientAccumulator {
    dims: BlockDims,
    reg: RegWeights,
    dt: f64,
    parallelism: Parallelism,
}

impl GradientAccumulator {
    /// Creates a new sequential `GradientAccumulator`, see `AccumulatorBuilder` for the other
    /// modes.
    ///
    /// # Args
    /// * `dims` - The layout of the stacked data matrices.
    /// * `reg` - The regularization weights.
    /// * `dt` - The time step size, scales every accumulated term.
    ///
    /// # Errors
    /// Returns `GradErr::Config` if `dt` is not finite.
    pub fn new(dims: BlockDims, reg: RegWeights, dt: f64) -> Result<Self> {
        Ok(Self {
            dims,
            reg,
            dt: check_step(dt)?,
            parallelism: Parallelism::Sequential,
        })
    }

    pub(crate) fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn dims(&self) -> BlockDims {
        self.dims
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn reg(&self) -> &RegWeights {
        &self.reg
    }

    pub fn parallelism(&self) -> Parallelism {
        self.parallelism
    }

    /// Computes the gradients with `accumulate` or `accumulate_par`, as selected by this
    /// accumulator's `Parallelism`.
    ///
    /// # Errors
    /// Same as `accumulate`.
    pub fn compute<S>(
        &self,
        phi: ArrayView2<f64>,
        x: ArrayView2<f64>,
        v: ArrayView2<f64>,
        b: ArrayView1<f64>,
        sigma: &S,
    ) -> Result<Gradients>
    where
        S: Nonlinearity + Sync + ?Sized,
    {
        match self.parallelism {
            Parallelism::Sequential => self.accumulate(phi, x, v, b, sigma),
            Parallelism::Blocks => self.accumulate_par(phi, x, v, b, sigma),
        }
    }

    /// Computes the gradients for the given data and parameters.
    ///
    /// # Args
    /// * `phi` - The stacked feature matrix, `(n * blocks, steps)`.
    /// * `x` - The stacked input matrix, same shape as `phi`.
    /// * `v` - The current weight matrix, `(n, n)`.
    /// * `b` - The current bias vector, `n`.
    /// * `sigma` - The nonlinearity applied to each block of `x`.
    ///
    /// # Returns
    /// Freshly allocated gradients, or an error if any input is malformed. Every shape is
    /// checked before accumulating, no partial result is ever returned.
    pub fn accumulate<S>(
        &self,
        phi: ArrayView2<f64>,
        x: ArrayView2<f64>,
        v: ArrayView2<f64>,
        b: ArrayView1<f64>,
        sigma: &S,
    ) -> Result<Gradients>
    where
        S: Nonlinearity + ?Sized,
    {
        let (phi, x) = self.validate(phi, x, v, b)?;
        let mut grad = Gradients::zeros(self.dims.n());

        for step in 0..self.dims.steps() - 1 {
            for block in 0..self.dims.blocks() {
                let s = self.activate(sigma, x.block(block, step), step, block)?;
                let phi_block = phi.block(block, step);

                grad.v.scaled_add(self.dt, &outer_product(phi_block, s.view()));
                grad.b.scaled_add(self.dt, &phi_block);
            }

            trace!(step = step; "accumulated time step");
        }

        self.regularize(&mut grad, v, b);
        Ok(grad)
    }

    /// Same as `accumulate` but evaluates the blocks of each time step on the rayon thread pool.
    ///
    /// The per-block terms are merged in block order, so the output is bit-identical to
    /// `accumulate`. If several blocks fail, any one of their errors may be returned.
    pub fn accumulate_par<S>(
        &self,
        phi: ArrayView2<f64>,
        x: ArrayView2<f64>,
        v: ArrayView2<f64>,
        b: ArrayView1<f64>,
        sigma: &S,
    ) -> Result<Gradients>
    where
        S: Nonlinearity + Sync + ?Sized,
    {
        let (phi, x) = self.validate(phi, x, v, b)?;
        let mut grad = Gradients::zeros(self.dims.n());

        for step in 0..self.dims.steps() - 1 {
            let terms = (0..self.dims.blocks())
                .into_par_iter()
                .map(|block| -> Result<Array2<f64>> {
                    let s = self.activate(sigma, x.block(block, step), step, block)?;
                    Ok(outer_product(phi.block(block, step), s.view()))
                })
                .collect::<Result<Vec<_>>>()?;

            for (block, term) in terms.iter().enumerate() {
                grad.v.scaled_add(self.dt, term);
                grad.b.scaled_add(self.dt, &phi.block(block, step));
            }

            trace!(step = step; "accumulated time step");
        }

        self.regularize(&mut grad, v, b);
        Ok(grad)
    }

    fn validate<'a>(
        &self,
        phi: ArrayView2<'a, f64>,
        x: ArrayView2<'a, f64>,
        v: ArrayView2<f64>,
        b: ArrayView1<f64>,
    ) -> Result<(StackedBlocks<'a>, StackedBlocks<'a>)> {
        let dims = self.dims;
        let n = dims.n();

        let phi = StackedBlocks::new(blocks::PHI, phi, dims)?;
        let x = StackedBlocks::new(blocks::X, x, dims)?;

        let checks = [
            ("v rows", v.nrows(), n),
            ("v columns", v.ncols(), n),
            ("bias", b.len(), n),
        ];

        for (what, got, expected) in checks {
            if got != expected {
                return Err(GradErr::Shape {
                    what,
                    got,
                    expected,
                });
            }
        }

        debug!(
            n = n,
            blocks = dims.blocks(),
            steps = dims.steps(),
            dt = self.dt;
            "accumulating gradients"
        );

        Ok((phi, x))
    }

    fn activate<S>(
        &self,
        sigma: &S,
        x_block: ArrayView1<f64>,
        step: usize,
        block: usize,
    ) -> Result<Array1<f64>>
    where
        S: Nonlinearity + ?Sized,
    {
        let s = sigma.apply(x_block);
        let expected = self.dims.n();

        if s.len() != expected {
            return Err(GradErr::Nonlinearity {
                step,
                block,
                got: s.len(),
                expected,
            });
        }

        Ok(s)
    }

    fn regularize(&self, grad: &mut Gradients, v: ArrayView2<f64>, b: ArrayView1<f64>) {
        let alpha = self.dt * self.reg.lambda();
        grad.v.scaled_add(alpha, &v);
        grad.b.scaled_add(alpha, &b);
    }
}

/// Computes the gradients of the block/time objective from plain inputs.
///
/// # Args
/// * `phi` - The stacked feature matrix, `(n * blocks, steps)`.
/// * `x` - The stacked input matrix, same shape as `phi`.
/// * `v` - The current weight matrix, `(n, n)`.
/// * `b` - The current bias vector, `n`.
/// * `n`, `blocks`, `steps` - The layout of the stacked matrices, all positive.
/// * `sigma` - The nonlinearity.
/// * `weights` - The regularization weights, at least two; `weights[1]` is the L2 coefficient.
/// * `dt` - The time step size.
///
/// # Returns
/// The pair `(grad_v, grad_b)`.
///
/// # Errors
/// - `GradErr::Config` for zero dimensions, fewer than two weights or a non-finite `dt`.
/// - `GradErr::Shape` when a matrix or vector disagrees with the layout.
/// - `GradErr::Nonlinearity` when `sigma` returns a vector whose length isn't `n`.
#[allow(clippy::too_many_arguments)]
pub fn accumulate_gradients<S>(
    phi: ArrayView2<f64>,
    x: ArrayView2<f64>,
    v: ArrayView2<f64>,
    b: ArrayView1<f64>,
    n: usize,
    blocks: usize,
    steps: usize,
    sigma: &S,
    weights: &[f64],
    dt: f64,
) -> Result<(Array2<f64>, Array1<f64>)>
where
    S: Nonlinearity + ?Sized,
{
    let dims = BlockDims::try_new(n, blocks, steps)?;
    let reg = RegWeights::new(weights.iter().copied())?;

    GradientAccumulator::new(dims, reg, dt)?
        .accumulate(phi, x, v, b, sigma)
        .map(Gradients::into_parts)
}
