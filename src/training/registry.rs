//! Ordered registry of candidate regressors

use crate::error::{AutoMlError, Result};
use super::config::SelectionConfig;
use super::linear_models::LinearRegression;
use super::models::Regressor;
use super::random_forest::RandomForest;
use std::fmt;
use std::sync::Arc;

/// Builds a fresh, unfitted candidate
pub type ModelFactory = Arc<dyn Fn() -> Box<dyn Regressor> + Send + Sync>;

pub const LINEAR_REGRESSION: &str = "Linear Regression";
pub const RANDOM_FOREST: &str = "Random Forest";

/// Named candidate factories, kept in registration order.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    entries: Vec<(String, ModelFactory)>,
}

impl ModelRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Linear Regression followed by Random Forest, configured from `config`
    pub fn with_defaults(config: &SelectionConfig) -> Self {
        let n_estimators = config.n_estimators;
        let max_depth = config.max_depth;
        let seed = config.random_state;

        let linear: ModelFactory = Arc::new(|| Box::new(LinearRegression::new()) as Box<dyn Regressor>);
        let forest: ModelFactory = Arc::new(move || {
            let mut forest = RandomForest::new_regressor(n_estimators).with_random_state(seed);
            if let Some(depth) = max_depth {
                forest = forest.with_max_depth(depth);
            }
            Box::new(forest) as Box<dyn Regressor>
        });

        let mut registry = Self::new();
        registry.entries.push((LINEAR_REGRESSION.to_string(), linear));
        registry.entries.push((RANDOM_FOREST.to_string(), forest));
        registry
    }

    /// Append a candidate. Names must be unique.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> Result<&mut Self>
    where
        F: Fn() -> Box<dyn Regressor> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.contains(&name) {
            return Err(AutoMlError::ConfigError(format!(
                "candidate '{}' is already registered",
                name
            )));
        }
        self.entries.push((name, Arc::new(factory)));
        Ok(self)
    }

    /// Keep only the named candidates, preserving registration order.
    pub fn restrict_to(&mut self, names: &[&str]) -> Result<&mut Self> {
        if let Some(unknown) = names.iter().find(|n| !self.contains(n)) {
            return Err(AutoMlError::ConfigError(format!(
                "unknown candidate '{}', registered: {:?}",
                unknown,
                self.names()
            )));
        }
        self.entries.retain(|(name, _)| names.contains(&name.as_str()));
        Ok(self)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> &[(String, ModelFactory)] {
        &self.entries
    }
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("candidates", &self.names())
            .finish()
    }
}
