use ndarray::{Array1, ArrayView1};

use super::{Nonlinearity, Sigmoid};

/// The elementwise nonlinearities shipped with the crate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ActFn {
    Identity,
    Tanh,
    Sigmoid(Sigmoid),
}

impl ActFn {
    pub fn sigmoid(amp: f64) -> Self {
        Self::Sigmoid(Sigmoid::new(amp))
    }

    pub fn f(&self, x: f64) -> f64 {
        match self {
            Self::Identity => x,
            Self::Tanh => x.tanh(),
            Self::Sigmoid(a) => a.f(x),
        }
    }
}

impl Nonlinearity for ActFn {
    fn apply(&self, x: ArrayView1<f64>) -> Array1<f64> {
        match self {
            Self::Identity => x.to_owned(),
            _ => x.mapv(|v| self.f(v)),
        }
    }
}
