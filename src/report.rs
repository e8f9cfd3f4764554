use anyhow::Result;
use grad_core::{GradientHistory, NormSeries};
use serde::Serialize;

use crate::config::DemoConfig;

/// The outcome of a demo run: its configuration and the norm of every recorded gradient.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub config: &'a DemoConfig,
    pub norms: NormSeries,
}

impl<'a> Report<'a> {
    pub fn new(config: &'a DemoConfig, history: &GradientHistory) -> Self {
        Self {
            config,
            norms: history.norms(),
        }
    }

    /// Renders the report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
