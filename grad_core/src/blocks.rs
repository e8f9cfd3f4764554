use std::ops::Range;

use ndarray::{ArrayView1, ArrayView2, s};

use crate::{BlockDims, GradErr, Result};

/// A read-only view over a stacked `(n * blocks, steps)` data matrix.
///
/// The shape is validated once on construction, so handing out block slices afterwards can't go
/// out of range for any `block < blocks` and `step < steps`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StackedBlocks<'a> {
    data: ArrayView2<'a, f64>,
    dims: BlockDims,
}

impl<'a> StackedBlocks<'a> {
    /// Creates a new `StackedBlocks`.
    ///
    /// # Args
    /// * `name` - The name used for this matrix in error messages (e.g. "phi").
    /// * `data` - The stacked matrix.
    /// * `dims` - The expected layout.
    ///
    /// # Errors
    /// Returns `GradErr::Shape` if the row count isn't `n * blocks` or the column count isn't
    /// `steps`.
    pub(crate) fn new(name: Axis2Names, data: ArrayView2<'a, f64>, dims: BlockDims) -> Result<Self> {
        let (rows, cols) = data.dim();

        if rows != dims.rows() {
            return Err(GradErr::Shape {
                what: name.rows,
                got: rows,
                expected: dims.rows(),
            });
        }

        if cols != dims.steps() {
            return Err(GradErr::Shape {
                what: name.cols,
                got: cols,
                expected: dims.steps(),
            });
        }

        Ok(Self { data, dims })
    }

    /// Returns the row range `[n * block, n * (block + 1))` covered by `block`.
    pub(crate) fn rows_of(&self, block: usize) -> Range<usize> {
        let n = self.dims.n();
        n * block..n * (block + 1)
    }

    /// Returns the length-`n` column slice of `block` at time `step`, or `None` if either index
    /// is out of range.
    pub(crate) fn get(&self, block: usize, step: usize) -> Option<ArrayView1<'a, f64>> {
        if block >= self.dims.blocks() || step >= self.dims.steps() {
            return None;
        }

        let rows = self.rows_of(block);
        Some(self.data.slice_move(s![rows, step]))
    }

    /// Same as `get` but panics on out of range indices.
    pub(crate) fn block(&self, block: usize, step: usize) -> ArrayView1<'a, f64> {
        self.get(block, step).unwrap_or_else(|| {
            panic!(
                "block ({block}, {step}) out of range for {} blocks and {} steps",
                self.dims.blocks(),
                self.dims.steps()
            )
        })
    }
}

/// Names of the two axes of a stacked matrix for error reporting.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Axis2Names {
    rows: &'static str,
    cols: &'static str,
}

pub(crate) const PHI: Axis2Names = Axis2Names {
    rows: "phi rows",
    cols: "phi columns",
};

pub(crate) const X: Axis2Names = Axis2Names {
    rows: "x rows",
    cols: "x columns",
};
