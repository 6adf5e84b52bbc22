//! estate-automl - Preprocessing and model selection for property prices
//!
//! This crate turns a mixed-type property table into a dense numeric matrix
//! and picks the best of several regressors on a held-out split:
//! - Column role discovery, imputation, scaling and one-hot encoding
//! - Linear Regression and Random Forest candidates behind one trait
//! - Seeded train / held-out splitting and best-by-R² selection
//! - A synthetic housing dataset and a CLI driver
//!
//! # Modules
//!
//! - [`preprocessing`] - `FeaturePreprocessor` and its per-role transformers
//! - [`training`] - Regressors, the candidate registry and `ModelSelector`
//! - [`config`] - Top-level JSON-loadable configuration
//! - [`synthetic`] - Seeded housing data generator
//! - [`utils`] - CSV loading and saving
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use estate_automl::prelude::*;
//!
//! # fn main() -> estate_automl::Result<()> {
//! let table = HousingDataGenerator::new(500).generate()?;
//!
//! let mut preprocessor = FeaturePreprocessor::new();
//! let (x, y) = preprocessor.fit_transform(&table, "Price")?;
//!
//! let selection = ModelSelector::default().train_and_evaluate(&x, &y)?;
//! println!("{}", selection.summary());
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;
pub mod config;

// Core ML modules
pub mod preprocessing;
pub mod training;

// Data
pub mod synthetic;
pub mod utils;

// Services
pub mod cli;

pub use error::{AutoMlError, CandidateError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{AutoMlError, CandidateError, Result};

    // Configuration
    pub use crate::config::AutoMlConfig;

    // Preprocessing
    pub use crate::preprocessing::{
        ColumnType, FeaturePreprocessor, FeatureSchema, ImputeStrategy, PreprocessingConfig,
        ScalerType,
    };

    // Training
    pub use crate::training::{
        CandidateOutcome, LinearRegression, ModelRegistry, ModelSelector, RandomForest,
        RegressionMetrics, Regressor, Selection, SelectionConfig,
    };

    // Data
    pub use crate::synthetic::HousingDataGenerator;
    pub use crate::utils::DataLoader;
}
