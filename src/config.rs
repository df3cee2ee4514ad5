//! Optional YAML configuration.
//!
//! ```yaml
//! history_limit: 20
//! columns:
//!   input: Measurements
//!   primary: Length
//!   secondary: Chest
//!   tertiary: Sleeve
//!   output: Summary
//! ```
//!
//! Without a `columns` block the editor classifies columns by header name.

use std::path::Path;

use anyhow::{Result, bail};
use log::debug;
use serde::Deserialize;

use crate::{
    columns::{ColumnClassifier, ExplicitColumns, HeaderHeuristics},
    history::DEFAULT_HISTORY_LIMIT,
    yaml_provider,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub columns: Option<ExplicitColumns>,
    pub history_limit: Option<usize>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let config: Config = yaml_provider::load_from_path(path)?;
        config.check()?;
        debug!("Loaded configuration from {path:?}: {config:?}");
        Ok(config)
    }

    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn parse(input: &str) -> Result<Self> {
        let config: Config = yaml_provider::from_str(input)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        if self.history_limit == Some(0) {
            bail!("history_limit must be at least 1");
        }
        Ok(())
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit.unwrap_or(DEFAULT_HISTORY_LIMIT)
    }

    pub fn classifier(&self) -> Box<dyn ColumnClassifier> {
        match &self.columns {
            Some(columns) => Box::new(columns.clone()),
            None => Box::new(HeaderHeuristics),
        }
    }
}
