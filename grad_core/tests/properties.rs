use grad_core::{
    AccumulatorBuilder, BlockDims, ConfigErr, GradErr, Parallelism, RegWeights,
    accumulate_gradients,
    activations::{ActFn, Nonlinearity},
};
use ndarray::{Array1, Array2, ArrayView1, array, s};
use ndarray_rand::{RandomExt, rand_distr::StandardNormal};
use rand::{SeedableRng, rngs::StdRng};

struct Problem {
    n: usize,
    blocks: usize,
    steps: usize,
    phi: Array2<f64>,
    x: Array2<f64>,
    v: Array2<f64>,
    b: Array1<f64>,
}

impl Problem {
    fn random(n: usize, blocks: usize, steps: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let rows = n * blocks;

        Self {
            n,
            blocks,
            steps,
            phi: Array2::random_using((rows, steps), StandardNormal, &mut rng),
            x: Array2::random_using((rows, steps), StandardNormal, &mut rng),
            v: Array2::random_using((n, n), StandardNormal, &mut rng),
            b: Array1::random_using(n, StandardNormal, &mut rng),
        }
    }

    fn run<S>(&self, sigma: &S, weights: &[f64], dt: f64) -> (Array2<f64>, Array1<f64>)
    where
        S: Nonlinearity + ?Sized,
    {
        accumulate_gradients(
            self.phi.view(),
            self.x.view(),
            self.v.view(),
            self.b.view(),
            self.n,
            self.blocks,
            self.steps,
            sigma,
            weights,
            dt,
        )
        .unwrap()
    }
}

fn assert_close<'a, 'b, G, E>(got: G, expected: E, tol: f64)
where
    G: IntoIterator<Item = &'a f64>,
    E: IntoIterator<Item = &'b f64>,
{
    for (i, (g, e)) in got.into_iter().zip(expected).enumerate() {
        assert!(
            (g - e).abs() <= tol * (1. + e.abs()),
            "entry {i}: got {g}, expected {e}"
        );
    }
}

#[test]
fn zero_data_without_regularization_gives_zero_gradients() {
    let sigmas = [ActFn::Identity, ActFn::Tanh, ActFn::sigmoid(1.)];

    for (n, blocks, steps) in [(1, 1, 1), (2, 3, 4), (5, 1, 7), (3, 4, 2)] {
        for sigma in &sigmas {
            for dt in [1., 0.01, -2.5] {
                let mut problem = Problem::random(n, blocks, steps, 7);
                problem.phi.fill(0.);
                problem.x.fill(0.);

                let (grad_v, grad_b) = problem.run(sigma, &[3., 0.], dt);

                assert_eq!(grad_v, Array2::<f64>::zeros((n, n)));
                assert_eq!(grad_b, Array1::<f64>::zeros(n));
            }
        }
    }
}

#[test]
fn single_time_step_is_regularization_only() {
    let problem = Problem::random(4, 3, 1, 11);
    let (dt, lambda) = (0.3, 0.7);

    // sigma would fail if it were ever called
    let sigma = |_: ArrayView1<f64>| Array1::<f64>::zeros(0);
    let (grad_v, grad_b) = problem.run(&sigma, &[0., lambda], dt);

    assert_eq!(grad_v, problem.v.mapv(|e| dt * lambda * e));
    assert_eq!(grad_b, problem.b.mapv(|e| dt * lambda * e));
}

#[test]
fn gradients_are_linear_in_dt() {
    let problem = Problem::random(3, 4, 5, 23);
    let weights = [0., 0.1];
    let (base_v, base_b) = problem.run(&ActFn::Tanh, &weights, 0.05);

    // powers of two scale every term exactly
    for c in [2., 0.5, 8.] {
        let (v, b) = problem.run(&ActFn::Tanh, &weights, 0.05 * c);
        assert_eq!(v, base_v.mapv(|e| e * c));
        assert_eq!(b, base_b.mapv(|e| e * c));
    }

    let (v, b) = problem.run(&ActFn::Tanh, &weights, 0.05 * 3.);
    assert_close(v.iter(), base_v.mapv(|e| e * 3.).iter(), 1e-12);
    assert_close(b.iter(), base_b.mapv(|e| e * 3.).iter(), 1e-12);
}

#[test]
fn blocks_accumulate_independently() {
    let problem = Problem::random(3, 4, 6, 31);
    let (dt, lambda) = (0.1, 0.5);
    let (n, steps) = (problem.n, problem.steps);

    let (full_v, full_b) = problem.run(&ActFn::Tanh, &[0., lambda], dt);

    let mut sum_v = Array2::<f64>::zeros((n, n));
    let mut sum_b = Array1::<f64>::zeros(n);

    for block in 0..problem.blocks {
        let rows = n * block..n * (block + 1);
        let (v, b) = accumulate_gradients(
            problem.phi.slice(s![rows.clone(), ..]),
            problem.x.slice(s![rows, ..]),
            problem.v.view(),
            problem.b.view(),
            n,
            1,
            steps,
            &ActFn::Tanh,
            &[0., 0.],
            dt,
        )
        .unwrap();

        sum_v += &v;
        sum_b += &b;
    }

    sum_v.scaled_add(dt * lambda, &problem.v);
    sum_b.scaled_add(dt * lambda, &problem.b);

    assert_close(full_v.iter(), sum_v.iter(), 1e-12);
    assert_close(full_b.iter(), sum_b.iter(), 1e-12);
}

#[test]
fn matches_time_outer_block_inner_reference_exactly() {
    let problem = Problem::random(3, 5, 4, 47);
    let (dt, lambda) = (0.02, 0.3);
    let Problem {
        n,
        blocks,
        steps,
        ref phi,
        ref x,
        ref v,
        ref b,
    } = problem;

    let mut expected_v = vec![vec![0.; n]; n];
    let mut expected_b = vec![0.; n];

    for k in 0..steps - 1 {
        for i in 0..blocks {
            let s: Vec<f64> = (0..n).map(|q| x[[n * i + q, k]].tanh()).collect();

            for p in 0..n {
                let phi_p = phi[[n * i + p, k]];
                for q in 0..n {
                    expected_v[p][q] += dt * (phi_p * s[q]);
                }
                expected_b[p] += dt * phi_p;
            }
        }
    }

    for p in 0..n {
        for q in 0..n {
            expected_v[p][q] += dt * lambda * v[[p, q]];
        }
        expected_b[p] += dt * lambda * b[p];
    }

    let (grad_v, grad_b) = problem.run(&ActFn::Tanh, &[0., lambda], dt);

    for p in 0..n {
        assert_eq!(grad_b[p], expected_b[p]);
        for q in 0..n {
            assert_eq!(grad_v[[p, q]], expected_v[p][q]);
        }
    }
}

#[test]
fn degenerate_steps_are_accepted() {
    let problem = Problem::random(2, 2, 3, 5);
    let (pos_v, pos_b) = problem.run(&ActFn::Tanh, &[0., 0.2], 0.5);
    let (neg_v, neg_b) = problem.run(&ActFn::Tanh, &[0., 0.2], -0.5);
    let (zero_v, zero_b) = problem.run(&ActFn::Tanh, &[0., 0.2], 0.);

    assert_eq!(neg_v, pos_v.mapv(|e| -e));
    assert_eq!(neg_b, pos_b.mapv(|e| -e));
    assert_eq!(zero_v, Array2::<f64>::zeros((2, 2)));
    assert_eq!(zero_b, Array1::<f64>::zeros(2));
}

#[test]
fn extra_phi_row_is_a_shape_error() {
    let (n, blocks, steps) = (2, 3, 4);
    let phi = Array2::<f64>::zeros((n * blocks + 1, steps));
    let x = Array2::<f64>::zeros((n * blocks, steps));
    let v = Array2::<f64>::eye(n);
    let b = Array1::<f64>::zeros(n);

    let err = accumulate_gradients(
        phi.view(),
        x.view(),
        v.view(),
        b.view(),
        n,
        blocks,
        steps,
        &ActFn::Identity,
        &[0., 1.],
        1.,
    )
    .unwrap_err();

    assert_eq!(
        err,
        GradErr::Shape {
            what: "phi rows",
            got: 7,
            expected: 6
        }
    );
    assert_eq!(err.to_string(), "shape mismatch for phi rows: got 7, expected 6");
}

#[test]
fn x_row_mismatch_names_x_rows() {
    let (n, blocks, steps) = (2, 3, 4);
    let phi = Array2::<f64>::zeros((n * blocks, steps));
    let x = Array2::<f64>::zeros((n * blocks - 1, steps));
    let v = Array2::<f64>::eye(n);
    let b = Array1::<f64>::zeros(n);

    let err = accumulate_gradients(
        phi.view(),
        x.view(),
        v.view(),
        b.view(),
        n,
        blocks,
        steps,
        &ActFn::Identity,
        &[0., 1.],
        1.,
    )
    .unwrap_err();

    assert_eq!(err.to_string(), "shape mismatch for x rows: got 5, expected 6");
}

#[test]
fn overflowing_layout_is_a_config_error() {
    let empty = Array2::<f64>::zeros((0, 1));
    let v = Array2::<f64>::eye(1);
    let b = Array1::<f64>::zeros(1);
    let n = usize::MAX / 2 + 1;

    let err = accumulate_gradients(
        empty.view(),
        empty.view(),
        v.view(),
        b.view(),
        n,
        2,
        1,
        &ActFn::Identity,
        &[0., 1.],
        1.,
    )
    .unwrap_err();

    assert_eq!(
        err,
        GradErr::Config(ConfigErr::LayoutOverflow { n, blocks: 2 })
    );
}

#[test]
fn builder_modes_match_the_free_function() {
    let problem = Problem::random(3, 4, 5, 61);
    let (dt, lambda) = (0.05, 0.2);
    let expected = problem.run(&ActFn::Tanh, &[0., lambda], dt);

    for parallelism in [Parallelism::Sequential, Parallelism::Blocks] {
        let acc = AccumulatorBuilder::new(BlockDims::try_new(3, 4, 5).unwrap())
            .reg(RegWeights::new([0., lambda]).unwrap())
            .dt(dt)
            .parallelism(parallelism)
            .build()
            .unwrap();

        let got = acc
            .compute(
                problem.phi.view(),
                problem.x.view(),
                problem.v.view(),
                problem.b.view(),
                &ActFn::Tanh,
            )
            .unwrap();

        assert_eq!(got.into_parts(), expected);
    }
}

#[test]
fn single_weight_is_a_config_error() {
    let problem = Problem::random(2, 1, 2, 3);

    let err = accumulate_gradients(
        problem.phi.view(),
        problem.x.view(),
        problem.v.view(),
        problem.b.view(),
        2,
        1,
        2,
        &ActFn::Identity,
        &[1.],
        1.,
    )
    .unwrap_err();

    assert_eq!(
        err,
        GradErr::Config(ConfigErr::TooFewRegWeights { got: 1, min: 2 })
    );
}

#[test]
fn long_nonlinearity_output_is_a_nonlinearity_error() {
    let problem = Problem::random(2, 2, 3, 9);
    let sigma = |x: ArrayView1<f64>| Array1::from_iter(x.iter().copied().chain([0.]));

    let err = accumulate_gradients(
        problem.phi.view(),
        problem.x.view(),
        problem.v.view(),
        problem.b.view(),
        2,
        2,
        3,
        &sigma,
        &[0., 1.],
        1.,
    )
    .unwrap_err();

    assert_eq!(
        err,
        GradErr::Nonlinearity {
            step: 0,
            block: 0,
            got: 3,
            expected: 2
        }
    );
}

#[test]
fn concrete_scenario() {
    let phi = array![[1., 2.], [3., 4.]];
    let x = Array2::<f64>::zeros((2, 2));
    let v = array![[1., 0.], [0., 1.]];
    let b = array![0., 0.];

    let (grad_v, grad_b) = accumulate_gradients(
        phi.view(),
        x.view(),
        v.view(),
        b.view(),
        2,
        1,
        2,
        &ActFn::Identity,
        &[0., 1.],
        1.,
    )
    .unwrap();

    assert_eq!(grad_v, array![[1., 0.], [0., 1.]]);
    assert_eq!(grad_b, array![1., 3.]);
}
