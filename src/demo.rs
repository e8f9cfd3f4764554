use anyhow::Result;
use grad_core::{GradientHistory, activations::ActFn};
use log::{debug, info};
use ndarray::{Array1, Array2};
use ndarray_rand::{RandomExt, rand_distr::StandardNormal};
use rand::{SeedableRng, rngs::StdRng};

use crate::config::DemoConfig;

/// Runs `config.iters` independent gradient evaluations over freshly drawn random trajectories
/// and parameters, and records every result.
///
/// Parameters are never updated between iterations; this only exercises the accumulator.
pub fn run(config: &DemoConfig) -> Result<GradientHistory> {
    let accumulator = config.accumulator()?;
    let dims = accumulator.dims();
    let (n, rows, steps) = (dims.n(), dims.rows(), dims.steps());

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut history = GradientHistory::new(n);

    info!(
        n = n,
        blocks = dims.blocks(),
        steps = steps,
        iters = config.iters,
        parallel = config.parallel;
        "starting demo run"
    );

    for iter in 0..config.iters {
        let phi = Array2::random_using((rows, steps), StandardNormal, &mut rng);
        let x = Array2::random_using((rows, steps), StandardNormal, &mut rng);
        let v = Array2::random_using((n, n), StandardNormal, &mut rng);
        let b = Array1::random_using(n, StandardNormal, &mut rng);

        let grad = accumulator.compute(phi.view(), x.view(), v.view(), b.view(), &ActFn::Tanh)?;

        debug!(iter = iter; "gradients computed");
        history.push(grad)?;
    }

    Ok(history)
}
