//! Model selection configuration

use crate::error::{AutoMlError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for candidate training and selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Fraction of rows held out for scoring
    pub test_size: f64,
    /// Seed for the split shuffle and seeded candidates
    pub random_state: u64,
    /// Shuffle rows before splitting
    pub shuffle: bool,
    /// Train candidates concurrently
    pub parallel: bool,
    /// Number of trees in the random forest candidate
    pub n_estimators: usize,
    /// Maximum tree depth (None = grow until pure)
    pub max_depth: Option<usize>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            random_state: 42,
            shuffle: true,
            parallel: false,
            n_estimators: 100,
            max_depth: None,
        }
    }
}

impl SelectionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(AutoMlError::ConfigError(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        if self.n_estimators == 0 {
            return Err(AutoMlError::ConfigError(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if self.max_depth == Some(0) {
            return Err(AutoMlError::ConfigError(
                "max_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
