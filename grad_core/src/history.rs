use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};
use serde::Serialize;

use crate::{GradErr, Result, accumulator::Gradients, ops::l2_norm};

/// Per-slice norms of a gradient series, one entry per recorded time index.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormSeries {
    /// Frobenius norm of each weight gradient.
    pub weight: Vec<f64>,
    /// Euclidean norm of each bias gradient.
    pub bias: Vec<f64>,
}

impl NormSeries {
    pub fn len(&self) -> usize {
        self.weight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weight.is_empty()
    }
}

/// An ordered record of gradients, typically one entry per outer training iteration.
#[derive(Debug, Clone)]
pub struct GradientHistory {
    n: usize,
    entries: Vec<Gradients>,
}

impl GradientHistory {
    /// Creates an empty history for gradients of blocks of size `n`.
    pub fn new(n: usize) -> Self {
        Self {
            n,
            entries: Vec::new(),
        }
    }

    /// Appends a gradient pair to the history.
    ///
    /// # Errors
    /// Returns `GradErr::Shape` if `grad.v` isn't `(n, n)` or `grad.b` isn't of length `n`.
    pub fn push(&mut self, grad: Gradients) -> Result<()> {
        let n = self.n;
        let checks = [
            ("weight gradient rows", grad.v.nrows()),
            ("weight gradient columns", grad.v.ncols()),
            ("bias gradient", grad.b.len()),
        ];

        for (what, got) in checks {
            if got != n {
                return Err(GradErr::Shape {
                    what,
                    got,
                    expected: n,
                });
            }
        }

        self.entries.push(grad);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Gradients> {
        self.entries.iter()
    }

    /// Returns the weight gradients stacked along a trailing time axis, `(n, n, len)`.
    pub fn weight_series(&self) -> Array3<f64> {
        let n = self.n;
        Array3::from_shape_fn((n, n, self.len()), |(p, q, k)| self.entries[k].v[[p, q]])
    }

    /// Returns the bias gradients stacked along a trailing time axis, `(n, len)`.
    pub fn bias_series(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.n, self.len()), |(p, k)| self.entries[k].b[p])
    }

    /// Returns the norm of every recorded gradient, in insertion order.
    pub fn norms(&self) -> NormSeries {
        let (weight, bias) = self
            .entries
            .iter()
            .map(|g| (l2_norm(g.v.iter()), l2_norm(g.b.iter())))
            .unzip();

        NormSeries { weight, bias }
    }
}

/// Computes the per-slice norms of raw gradient series.
///
/// # Args
/// * `weight_series` - Weight gradients, `(n, n, t)`.
/// * `bias_series` - Bias gradients, `(n, t)`.
///
/// # Errors
/// Returns `GradErr::Shape` if the weight slices aren't square, if the bias length differs from
/// `n` or if both series disagree on `t`.
pub fn series_norms(
    weight_series: ArrayView3<f64>,
    bias_series: ArrayView2<f64>,
) -> Result<NormSeries> {
    let (rows, cols, t) = weight_series.dim();
    let (bias_len, bias_t) = bias_series.dim();

    let checks = [
        ("weight series columns", cols, rows),
        ("bias series rows", bias_len, rows),
        ("bias series length", bias_t, t),
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

    let weight = weight_series
        .axis_iter(Axis(2))
        .map(|slice| l2_norm(slice.iter()))
        .collect();

    let bias = bias_series
        .axis_iter(Axis(1))
        .map(|slice| l2_norm(slice.iter()))
        .collect();

    Ok(NormSeries { weight, bias })
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn grad(v: Array2<f64>, b: ndarray::Array1<f64>) -> Gradients {
        Gradients { v, b }
    }

    #[test]
    fn push_rejects_mismatched_shapes() {
        let mut history = GradientHistory::new(2);

        let err = history
            .push(grad(Array2::zeros((2, 3)), array![0., 0.]))
            .unwrap_err();
        assert_eq!(
            err,
            GradErr::Shape {
                what: "weight gradient columns",
                got: 3,
                expected: 2
            }
        );

        assert!(history.push(grad(Array2::zeros((2, 2)), array![0.])).is_err());
        assert!(history.is_empty());
    }

    #[test]
    fn series_have_trailing_time_axis() {
        let mut history = GradientHistory::new(2);
        history
            .push(grad(array![[1., 2.], [3., 4.]], array![5., 6.]))
            .unwrap();
        history
            .push(grad(array![[7., 8.], [9., 10.]], array![11., 12.]))
            .unwrap();

        let weights = history.weight_series();
        let biases = history.bias_series();

        assert_eq!(weights.dim(), (2, 2, 2));
        assert_eq!(weights[[1, 0, 1]], 9.);
        assert_eq!(biases, array![[5., 11.], [6., 12.]]);
    }

    #[test]
    fn empty_history_has_empty_series() {
        let history = GradientHistory::new(3);

        assert_eq!(history.weight_series().dim(), (3, 3, 0));
        assert_eq!(history.bias_series().dim(), (3, 0));
        assert!(history.norms().is_empty());
    }

    #[test]
    fn norms_match_series_norms() {
        let mut history = GradientHistory::new(2);
        history
            .push(grad(array![[3., 0.], [0., 4.]], array![6., 8.]))
            .unwrap();
        history
            .push(grad(array![[0., 0.], [0., 0.]], array![0., 1.]))
            .unwrap();

        let norms = history.norms();
        assert_eq!(norms.weight, vec![5., 0.]);
        assert_eq!(norms.bias, vec![10., 1.]);

        let raw = series_norms(history.weight_series().view(), history.bias_series().view())
            .unwrap();
        assert_eq!(raw, norms);
    }

    #[test]
    fn series_norms_rejects_length_mismatch() {
        let weights = Array3::<f64>::zeros((2, 2, 3));
        let biases = Array2::<f64>::zeros((2, 4));

        let err = series_norms(weights.view(), biases.view()).unwrap_err();
        assert_eq!(
            err,
            GradErr::Shape {
                what: "bias series length",
                got: 4,
                expected: 3
            }
        );
    }
}
