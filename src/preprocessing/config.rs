//! Preprocessing configuration

use serde::{Deserialize, Serialize};
use crate::error::{AutoMlError, Result};
use super::{ScalerType, ImputeStrategy};

/// Fill value used for missing categorical entries by default
pub const DEFAULT_CATEGORICAL_FILL: &str = "missing";

/// Configuration for feature preprocessing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingConfig {
    /// Strategy for handling missing numeric values
    pub numeric_impute_strategy: ImputeStrategy,

    /// Strategy for handling missing categorical values
    pub categorical_impute_strategy: ImputeStrategy,

    /// Type of scaler to use for numeric features
    pub scaler_type: ScalerType,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            numeric_impute_strategy: ImputeStrategy::Median,
            categorical_impute_strategy: ImputeStrategy::ConstantString(
                DEFAULT_CATEGORICAL_FILL.to_string(),
            ),
            scaler_type: ScalerType::Standard,
        }
    }
}

impl PreprocessingConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set numeric impute strategy
    pub fn with_numeric_impute(mut self, strategy: ImputeStrategy) -> Self {
        self.numeric_impute_strategy = strategy;
        self
    }

    /// Builder method to set categorical impute strategy
    pub fn with_categorical_impute(mut self, strategy: ImputeStrategy) -> Self {
        self.categorical_impute_strategy = strategy;
        self
    }

    /// Builder method to set scaler type
    pub fn with_scaler(mut self, scaler_type: ScalerType) -> Self {
        self.scaler_type = scaler_type;
        self
    }

    /// Reject strategies that cannot apply to the column role they are set for.
    pub fn validate(&self) -> Result<()> {
        if !self.numeric_impute_strategy.supports_numeric() {
            return Err(AutoMlError::ConfigError(format!(
                "{:?} cannot impute numeric columns",
                self.numeric_impute_strategy
            )));
        }
        if !self.categorical_impute_strategy.supports_categorical() {
            return Err(AutoMlError::ConfigError(format!(
                "{:?} cannot impute categorical columns",
                self.categorical_impute_strategy
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PreprocessingConfig::default();
        assert_eq!(config.numeric_impute_strategy, ImputeStrategy::Median);
        assert_eq!(
            config.categorical_impute_strategy,
            ImputeStrategy::ConstantString("missing".to_string())
        );
        assert_eq!(config.scaler_type, ScalerType::Standard);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = PreprocessingConfig::new()
            .with_scaler(ScalerType::MinMax)
            .with_numeric_impute(ImputeStrategy::Mean)
            .with_categorical_impute(ImputeStrategy::MostFrequent);

        assert!(matches!(config.scaler_type, ScalerType::MinMax));
        assert_eq!(config.numeric_impute_strategy, ImputeStrategy::Mean);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_mismatched_strategies_rejected() {
        let config = PreprocessingConfig::new().with_numeric_impute(ImputeStrategy::ConstantString("x".into()));
        assert!(matches!(config.validate(), Err(AutoMlError::ConfigError(_))));

        let config = PreprocessingConfig::new().with_categorical_impute(ImputeStrategy::Median);
        assert!(matches!(config.validate(), Err(AutoMlError::ConfigError(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PreprocessingConfig = serde_json::from_str(r#"{"scaler_type":"Robust"}"#).unwrap();
        assert_eq!(config.scaler_type, ScalerType::Robust);
        assert_eq!(config.numeric_impute_strategy, ImputeStrategy::Median);
    }
}
