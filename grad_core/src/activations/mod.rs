mod act_fn;
mod nonlinearity;
mod sigmoid;

pub use act_fn::ActFn;
pub use nonlinearity::Nonlinearity;
pub use sigmoid::Sigmoid;
