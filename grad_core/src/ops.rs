use ndarray::{Array2, ArrayView1, Axis};

/// Returns the outer product of `u` and `w`, the matrix whose `(p, q)` entry is `u[p] * w[q]`.
pub fn outer_product(u: ArrayView1<f64>, w: ArrayView1<f64>) -> Array2<f64> {
    let col = u.insert_axis(Axis(1));
    let row = w.insert_axis(Axis(0));
    col.dot(&row)
}

/// Frobenius norm of a matrix, or Euclidean norm when given a vector view.
pub(crate) fn l2_norm<'a, I>(values: I) -> f64
where
    I: IntoIterator<Item = &'a f64>,
{
    values.into_iter().map(|v| v * v).sum::<f64>().sqrt()
}
