//! Candidate training, scoring and best-model selection

use crate::error::{AutoMlError, CandidateError, Result};
use super::config::SelectionConfig;
use super::models::{RegressionMetrics, Regressor};
use super::registry::{ModelFactory, ModelRegistry};
use super::split::{train_test_split, TrainTestSplit};
use indexmap::IndexMap;
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Result of training and scoring one candidate
#[derive(Debug)]
pub enum CandidateOutcome {
    Scored {
        metrics: RegressionMetrics,
        training_time_secs: f64,
    },
    /// The candidate raised an error; it takes no part in selection
    Failed(CandidateError),
}

impl CandidateOutcome {
    pub fn metrics(&self) -> Option<&RegressionMetrics> {
        match self {
            CandidateOutcome::Scored { metrics, .. } => Some(metrics),
            CandidateOutcome::Failed(_) => None,
        }
    }

    pub fn mse(&self) -> Option<f64> {
        self.metrics().map(|m| m.mse)
    }

    pub fn r2(&self) -> Option<f64> {
        self.metrics().map(|m| m.r2)
    }

    pub fn is_scored(&self) -> bool {
        matches!(self, CandidateOutcome::Scored { .. })
    }

    pub fn error(&self) -> Option<&CandidateError> {
        match self {
            CandidateOutcome::Failed(err) => Some(err),
            CandidateOutcome::Scored { .. } => None,
        }
    }
}

/// A fitted candidate with its held-out score
struct TrainedCandidate {
    model: Box<dyn Regressor>,
    metrics: RegressionMetrics,
    training_time_secs: f64,
}

/// Held-out partition of the processed matrix and target
struct SplitData {
    x_train: Array2<f64>,
    y_train: Array1<f64>,
    x_test: Array2<f64>,
    y_test: Array1<f64>,
}

/// Outcome of a model selection run
#[derive(Debug)]
pub struct Selection {
    best_name: String,
    best_score: f64,
    best_model: Box<dyn Regressor>,
    results: IndexMap<String, CandidateOutcome>,
    split: TrainTestSplit,
}

impl Selection {
    pub fn best_name(&self) -> &str {
        &self.best_name
    }

    /// Held-out R² of the best model
    pub fn best_score(&self) -> f64 {
        self.best_score
    }

    pub fn best_model(&self) -> &dyn Regressor {
        self.best_model.as_ref()
    }

    pub fn into_best_model(self) -> Box<dyn Regressor> {
        self.best_model
    }

    /// Every candidate's outcome, in registry order
    pub fn results(&self) -> &IndexMap<String, CandidateOutcome> {
        &self.results
    }

    pub fn split(&self) -> &TrainTestSplit {
        &self.split
    }

    /// Predict with the best model
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.best_model.predict(x)
    }

    /// Text report of the run
    pub fn summary(&self) -> String {
        let mut report = String::new();
        report.push_str("=== Model Selection Report ===\n\n");

        report.push_str("--- Data Split ---\n");
        report.push_str(&format!("Train rows:    {}\n", self.split.n_train()));
        report.push_str(&format!("Held-out rows: {}\n\n", self.split.n_test()));

        report.push_str("--- Candidates ---\n");
        for (name, outcome) in &self.results {
            match outcome {
                CandidateOutcome::Scored { metrics, training_time_secs } => {
                    report.push_str(&format!(
                        "  {:<20} MSE = {:.4}, RMSE = {:.4}, MAE = {:.4}, R² = {:.4} ({:.3}s)\n",
                        name, metrics.mse, metrics.rmse, metrics.mae, metrics.r2, training_time_secs
                    ));
                }
                CandidateOutcome::Failed(err) => {
                    report.push_str(&format!("  {:<20} FAILED: {}\n", name, err.source));
                }
            }
        }
        report.push('\n');

        report.push_str("--- Selected Model ---\n");
        report.push_str(&format!("{} (R² = {:.4})\n", self.best_name, self.best_score));

        report
    }
}

/// Trains every registered candidate on one split and keeps the best by R².
#[derive(Debug, Clone)]
pub struct ModelSelector {
    config: SelectionConfig,
    registry: ModelRegistry,
}

impl Default for ModelSelector {
    fn default() -> Self {
        Self::new(SelectionConfig::default())
    }
}

impl ModelSelector {
    /// Selector over the default candidates: Linear Regression, Random Forest
    pub fn new(config: SelectionConfig) -> Self {
        let registry = ModelRegistry::with_defaults(&config);
        Self { config, registry }
    }

    /// Selector over a caller-supplied candidate list
    pub fn with_registry(config: SelectionConfig, registry: ModelRegistry) -> Self {
        Self { config, registry }
    }

    /// Keep only the named candidates
    pub fn restrict_to(&mut self, names: &[&str]) -> Result<&mut Self> {
        self.registry.restrict_to(names)?;
        Ok(self)
    }

    pub fn candidate_names(&self) -> Vec<&str> {
        self.registry.names()
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Split, train and score every candidate, then pick the best by R².
    ///
    /// Ties keep the earlier-registered candidate. A candidate that fails is
    /// recorded in the results and skipped; if all fail the run fails with
    /// [`AutoMlError::NoUsableCandidate`].
    pub fn train_and_evaluate(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Selection> {
        if self.registry.is_empty() {
            return Err(AutoMlError::NoCandidates);
        }
        Self::validate_target(x, y)?;
        self.config.validate()?;

        let split = train_test_split(
            x.nrows(),
            self.config.test_size,
            self.config.shuffle,
            self.config.random_state,
        )?;
        debug!(train = split.n_train(), test = split.n_test(), "Data split");

        let data = SplitData {
            x_train: x.select(Axis(0), &split.train_indices),
            y_train: y.select(Axis(0), &split.train_indices),
            x_test: x.select(Axis(0), &split.test_indices),
            y_test: y.select(Axis(0), &split.test_indices),
        };

        let entries = self.registry.entries();
        let outcomes: Vec<(String, std::result::Result<TrainedCandidate, CandidateError>)> =
            if self.config.parallel {
                entries
                    .par_iter()
                    .map(|(name, factory)| (name.clone(), Self::evaluate_candidate(name, factory, &data)))
                    .collect()
            } else {
                entries
                    .iter()
                    .map(|(name, factory)| (name.clone(), Self::evaluate_candidate(name, factory, &data)))
                    .collect()
            };

        let best_idx = best_candidate(
            outcomes
                .iter()
                .map(|(_, outcome)| outcome.as_ref().ok().map(|c| c.metrics.r2)),
        );

        let mut results = IndexMap::with_capacity(outcomes.len());
        let mut best = None;
        for (idx, (name, outcome)) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(trained) => {
                    results.insert(
                        name.clone(),
                        CandidateOutcome::Scored {
                            metrics: trained.metrics,
                            training_time_secs: trained.training_time_secs,
                        },
                    );
                    if Some(idx) == best_idx {
                        best = Some((name, trained.metrics.r2, trained.model));
                    }
                }
                Err(err) => {
                    results.insert(name, CandidateOutcome::Failed(err));
                }
            }
        }

        let Some((best_name, best_score, best_model)) = best else {
            let failures = results
                .into_values()
                .filter_map(|outcome| match outcome {
                    CandidateOutcome::Failed(err) => Some(err),
                    CandidateOutcome::Scored { .. } => None,
                })
                .collect();
            return Err(AutoMlError::NoUsableCandidate { failures });
        };

        info!(model = %best_name, r2 = best_score, "Selected best model");

        Ok(Selection {
            best_name,
            best_score,
            best_model,
            results,
            split,
        })
    }

    fn validate_target(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if y.is_empty() {
            return Err(AutoMlError::InvalidTarget("target is empty".to_string()));
        }
        if y.len() != x.nrows() {
            return Err(AutoMlError::InvalidTarget(format!(
                "target has {} values but the matrix has {} rows",
                y.len(),
                x.nrows()
            )));
        }
        if let Some(row) = y.iter().position(|v| !v.is_finite()) {
            return Err(AutoMlError::InvalidTarget(format!(
                "target value at row {} is not finite",
                row
            )));
        }
        Ok(())
    }

    fn evaluate_candidate(
        name: &str,
        factory: &ModelFactory,
        data: &SplitData,
    ) -> std::result::Result<TrainedCandidate, CandidateError> {
        let start = Instant::now();
        let mut model = factory();

        let scored = model
            .fit(&data.x_train, &data.y_train)
            .and_then(|_| model.predict(&data.x_test))
            .and_then(|y_pred| RegressionMetrics::compute(&data.y_test, &y_pred));

        match scored {
            Ok(metrics) => {
                let training_time_secs = start.elapsed().as_secs_f64();
                info!(
                    model = name,
                    mse = metrics.mse,
                    r2 = metrics.r2,
                    elapsed_secs = training_time_secs,
                    "Model performance"
                );
                Ok(TrainedCandidate {
                    model,
                    metrics,
                    training_time_secs,
                })
            }
            Err(err) => {
                warn!(model = name, error = %err, "Candidate failed");
                Err(CandidateError::new(name, err))
            }
        }
    }
}

/// Index of the highest score; the first of equal scores wins and `None`
/// entries never win.
fn best_candidate(scores: impl IntoIterator<Item = Option<f64>>) -> Option<usize> {
    scores
        .into_iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (idx, score)| match (best, score) {
            (None, Some(s)) => Some((idx, s)),
            (Some((_, b)), Some(s)) if s > b => Some((idx, s)),
            _ => best,
        })
        .map(|(idx, _)| idx)
}
