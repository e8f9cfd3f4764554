use std::{env, str::FromStr};

use anyhow::{Context, Result};
use grad_core::{AccumulatorBuilder, BlockDims, GradientAccumulator, Parallelism, RegWeights};
use serde::Serialize;

const DEFAULT_N: usize = 4;
const DEFAULT_BLOCKS: usize = 3;
const DEFAULT_STEPS: usize = 50;
const DEFAULT_DT: f64 = 0.01;
const DEFAULT_LAMBDA: f64 = 0.1;
const DEFAULT_ITERS: usize = 10;
const DEFAULT_SEED: u64 = 42;

/// Settings of the demonstration run, read from `GRAD_*` environment variables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemoConfig {
    pub n: usize,
    pub blocks: usize,
    pub steps: usize,
    pub dt: f64,
    pub lambda: f64,
    pub iters: usize,
    pub seed: u64,
    pub parallel: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            n: DEFAULT_N,
            blocks: DEFAULT_BLOCKS,
            steps: DEFAULT_STEPS,
            dt: DEFAULT_DT,
            lambda: DEFAULT_LAMBDA,
            iters: DEFAULT_ITERS,
            seed: DEFAULT_SEED,
            parallel: false,
        }
    }
}

impl DemoConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, falling back to the defaults for missing keys.
    ///
    /// # Errors
    /// Fails naming the variable whose value can't be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            n: parse_or(&lookup, "GRAD_N", defaults.n)?,
            blocks: parse_or(&lookup, "GRAD_BLOCKS", defaults.blocks)?,
            steps: parse_or(&lookup, "GRAD_STEPS", defaults.steps)?,
            dt: parse_or(&lookup, "GRAD_DT", defaults.dt)?,
            lambda: parse_or(&lookup, "GRAD_LAMBDA", defaults.lambda)?,
            iters: parse_or(&lookup, "GRAD_ITERS", defaults.iters)?,
            seed: parse_or(&lookup, "GRAD_SEED", defaults.seed)?,
            parallel: parse_or(&lookup, "GRAD_PARALLEL", defaults.parallel)?,
        })
    }

    /// Builds the accumulator described by this configuration.
    ///
    /// The first regularization weight is unused by the accumulator, it's filled with zero.
    pub fn accumulator(&self) -> Result<GradientAccumulator> {
        let dims = BlockDims::try_new(self.n, self.blocks, self.steps)?;
        let parallelism = if self.parallel {
            Parallelism::Blocks
        } else {
            Parallelism::Sequential
        };

        let accumulator = AccumulatorBuilder::new(dims)
            .reg(RegWeights::new([0., self.lambda])?)
            .dt(self.dt)
            .parallelism(parallelism)
            .build()?;

        Ok(accumulator)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}
