//! Top-level pipeline configuration

use crate::error::{AutoMlError, Result};
use crate::preprocessing::PreprocessingConfig;
use crate::training::SelectionConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a full preprocess-and-select run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoMlConfig {
    /// Column holding the regression target
    pub target_column: String,
    pub preprocessing: PreprocessingConfig,
    pub selection: SelectionConfig,
}

impl Default for AutoMlConfig {
    fn default() -> Self {
        Self {
            target_column: "Price".to_string(),
            preprocessing: PreprocessingConfig::default(),
            selection: SelectionConfig::default(),
        }
    }
}

impl AutoMlConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_column = target.into();
        self
    }

    pub fn with_preprocessing(mut self, config: PreprocessingConfig) -> Self {
        self.preprocessing = config;
        self
    }

    pub fn with_selection(mut self, config: SelectionConfig) -> Self {
        self.selection = config;
        self
    }

    /// Load configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_column.trim().is_empty() {
            return Err(AutoMlError::ConfigError(
                "target_column must not be empty".to_string(),
            ));
        }
        self.preprocessing.validate()?;
        self.selection.validate()
    }
}
