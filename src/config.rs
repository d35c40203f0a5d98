use std::fs::read_to_string;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct OptimizationConfig {
    pub remove_unused_stores: bool,
    pub invert_loops: bool,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        OptimizationConfig {
            remove_unused_stores: false,
            invert_loops: true,
        }
    }
}

impl OptimizationConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("invalid optimization config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = read_to_string(path)
            .with_context(|| format!("unable to open config file {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("while reading {}", path.display()))
    }

    pub fn with_overrides(
        self,
        remove_unused_stores: Option<bool>,
        invert_loops: Option<bool>,
    ) -> Self {
        OptimizationConfig {
            remove_unused_stores: remove_unused_stores.unwrap_or(self.remove_unused_stores),
            invert_loops: invert_loops.unwrap_or(self.invert_loops),
        }
    }
}
