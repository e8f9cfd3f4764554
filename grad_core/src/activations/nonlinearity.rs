use ndarray::{Array1, ArrayView1};

/// A map from a block's raw input to its activated values.
///
/// Implementations must be total over any finite input and should return a vector of the same
/// length as `x`; the accumulator checks the length and reports a `GradErr::Nonlinearity`
/// otherwise.
///
/// Any `Fn(ArrayView1<f64>) -> Array1<f64>` is a nonlinearity, so callers can pass closures:
///
/// ```
/// use grad_core::activations::Nonlinearity;
/// use ndarray::{array, ArrayView1};
///
/// let relu = |x: ArrayView1<f64>| x.mapv(|v| v.max(0.));
/// assert_eq!(relu.apply(array![-1., 2.].view()), array![0., 2.]);
/// ```
pub trait Nonlinearity {
    fn apply(&self, x: ArrayView1<f64>) -> Array1<f64>;
}

impl<F> Nonlinearity for F
where
    F: Fn(ArrayView1<f64>) -> Array1<f64>,
{
    fn apply(&self, x: ArrayView1<f64>) -> Array1<f64> {
        self(x)
    }
}
