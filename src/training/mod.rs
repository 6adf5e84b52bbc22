//! Model training and selection module
//!
//! Provides the candidate regressors and the selector that compares them:
//! - Linear Regression (ordinary least squares, minimum-norm solution)
//! - Decision trees and Random Forests
//! - Seeded train / held-out splitting
//! - An ordered candidate registry and best-by-R² selection

mod config;
mod models;
mod registry;
mod selector;
mod split;
pub mod linear_models;
pub mod decision_tree;
pub mod random_forest;

pub use config::SelectionConfig;
pub use models::{Regressor, RegressionMetrics};
pub use registry::{ModelFactory, ModelRegistry, LINEAR_REGRESSION, RANDOM_FOREST};
pub use selector::{CandidateOutcome, ModelSelector, Selection};
pub use split::{train_test_split, TrainTestSplit};
pub use linear_models::LinearRegression;
pub use decision_tree::{DecisionTree, TreeNode};
pub use random_forest::{RandomForest, MaxFeatures};
