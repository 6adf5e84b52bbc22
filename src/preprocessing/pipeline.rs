//! Feature preprocessing pipeline

use crate::error::{AutoMlError, Result};
use super::{
    config::PreprocessingConfig,
    imputer::Imputer,
    scaler::Scaler,
    encoder::OneHotEncoder,
    ColumnType, FeatureSchema, FeatureStats,
};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

/// Parameters learned by a successful `fit`. Read-only afterwards.
#[derive(Debug, Clone)]
struct FittedTransformState {
    schema: FeatureSchema,
    numeric_columns: Vec<String>,
    categorical_columns: Vec<String>,
    numeric_imputer: Option<Imputer>,
    categorical_imputer: Option<Imputer>,
    scaler: Option<Scaler>,
    encoder: Option<OneHotEncoder>,
    feature_stats: Vec<FeatureStats>,
    output_feature_names: Vec<String>,
    fit_rows: usize,
    fit_time: f64,
}

#[derive(Debug, Clone)]
enum PreprocessorState {
    Unfitted,
    Fitted(Box<FittedTransformState>),
}

/// Converts a raw feature table into a dense numeric matrix.
///
/// Numeric columns are imputed then scaled; categorical columns are filled
/// then one-hot encoded. The output layout is
/// `[numeric columns..., indicator columns...]` and is frozen at fit time,
/// so every later `transform` produces the same number of columns.
#[derive(Debug, Clone)]
pub struct FeaturePreprocessor {
    config: PreprocessingConfig,
    state: PreprocessorState,
}

impl FeaturePreprocessor {
    /// Create a new preprocessor with default configuration
    pub fn new() -> Self {
        Self::with_config(PreprocessingConfig::default())
    }

    /// Create a new preprocessor with custom configuration
    pub fn with_config(config: PreprocessingConfig) -> Self {
        Self {
            config,
            state: PreprocessorState::Unfitted,
        }
    }

    pub fn config(&self) -> &PreprocessingConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        matches!(self.state, PreprocessorState::Fitted(_))
    }

    /// Learn column roles and transformation parameters from `df`.
    ///
    /// On error the previous state (fitted or not) is left untouched.
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        let fitted = self.fit_state(df)?;
        info!(
            rows = fitted.fit_rows,
            numeric = fitted.numeric_columns.len(),
            categorical = fitted.categorical_columns.len(),
            output_features = fitted.output_feature_names.len(),
            elapsed_ms = fitted.fit_time * 1e3,
            "Preprocessor fitted"
        );
        self.state = PreprocessorState::Fitted(Box::new(fitted));
        Ok(self)
    }

    /// Apply the fitted parameters to `df`.
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        let fitted = self.fitted()?;
        fitted.schema.validate(df)?;

        debug!(rows = df.height(), "Starting data transformation");
        let mut result = fitted.schema.conform(df)?;

        if let Some(ref imputer) = fitted.numeric_imputer {
            result = imputer.transform(&result)?;
        }
        if let Some(ref imputer) = fitted.categorical_imputer {
            result = imputer.transform(&result)?;
        }
        if let Some(ref scaler) = fitted.scaler {
            result = scaler.transform(&result)?;
        }

        let indicators = match fitted.encoder {
            Some(ref encoder) => encoder.transform(&result)?,
            None => Vec::new(),
        };

        let matrix = Self::assemble(&result, &fitted.numeric_columns, &indicators)?;
        debug!(shape = ?matrix.dim(), "Data transformed");
        Ok(matrix)
    }

    /// Split `table` into features and `target_column`, fit on the features,
    /// and return the transformed features with the target vector.
    pub fn fit_transform(
        &mut self,
        table: &DataFrame,
        target_column: &str,
    ) -> Result<(Array2<f64>, Array1<f64>)> {
        let target = table
            .column(target_column)
            .map_err(|_| AutoMlError::MissingTarget(target_column.to_string()))?;
        let y = extract_target(target.as_materialized_series())?;

        let features = table.drop(target_column)?;
        self.fit(&features)?;
        let x = self.transform(&features)?;
        Ok((x, y))
    }

    /// The frozen column partition, once fitted
    pub fn schema(&self) -> Option<&FeatureSchema> {
        match &self.state {
            PreprocessorState::Fitted(f) => Some(&f.schema),
            PreprocessorState::Unfitted => None,
        }
    }

    /// Get numeric column names
    pub fn numeric_columns(&self) -> &[String] {
        match &self.state {
            PreprocessorState::Fitted(f) => &f.numeric_columns,
            PreprocessorState::Unfitted => &[],
        }
    }

    /// Get categorical column names
    pub fn categorical_columns(&self) -> &[String] {
        match &self.state {
            PreprocessorState::Fitted(f) => &f.categorical_columns,
            PreprocessorState::Unfitted => &[],
        }
    }

    /// Names of the columns of the processed matrix
    pub fn output_feature_names(&self) -> Result<&[String]> {
        Ok(&self.fitted()?.output_feature_names)
    }

    pub fn n_output_features(&self) -> Result<usize> {
        Ok(self.fitted()?.output_feature_names.len())
    }

    /// Raw per-column statistics observed at fit, in schema order
    pub fn feature_stats(&self) -> &[FeatureStats] {
        match &self.state {
            PreprocessorState::Fitted(f) => &f.feature_stats,
            PreprocessorState::Unfitted => &[],
        }
    }

    pub fn numeric_imputer(&self) -> Option<&Imputer> {
        self.fitted().ok().and_then(|f| f.numeric_imputer.as_ref())
    }

    pub fn scaler(&self) -> Option<&Scaler> {
        self.fitted().ok().and_then(|f| f.scaler.as_ref())
    }

    pub fn encoder(&self) -> Option<&OneHotEncoder> {
        self.fitted().ok().and_then(|f| f.encoder.as_ref())
    }

    /// Seconds spent in the last successful fit
    pub fn fit_time(&self) -> Option<f64> {
        self.fitted().ok().map(|f| f.fit_time)
    }

    fn fitted(&self) -> Result<&FittedTransformState> {
        match &self.state {
            PreprocessorState::Fitted(f) => Ok(f),
            PreprocessorState::Unfitted => Err(AutoMlError::UnfittedState),
        }
    }

    fn fit_state(&self, df: &DataFrame) -> Result<FittedTransformState> {
        let start = Instant::now();

        if df.height() == 0 || df.width() == 0 {
            return Err(AutoMlError::NotFitted(format!(
                "input has {} rows and {} columns",
                df.height(),
                df.width()
            )));
        }
        self.config.validate()?;

        let schema = FeatureSchema::infer(df)?;
        let numeric_columns = schema.numeric_columns();
        let categorical_columns = schema.categorical_columns();
        let numeric: Vec<&str> = numeric_columns.iter().map(|s| s.as_str()).collect();
        let categorical: Vec<&str> = categorical_columns.iter().map(|s| s.as_str()).collect();

        let raw = schema.conform(df)?;
        let feature_stats = Self::compute_statistics(&raw, &schema)?;

        let mut numeric_imputer = None;
        let mut scaler = None;
        if !numeric.is_empty() {
            let mut imputer = Imputer::new(self.config.numeric_impute_strategy.clone());
            // Scaling parameters are learned from the imputed values
            let imputed = imputer.fit_transform(&raw, &numeric)?;

            let mut fitted_scaler = Scaler::new(self.config.scaler_type.clone());
            fitted_scaler.fit(&imputed, &numeric)?;

            numeric_imputer = Some(imputer);
            scaler = Some(fitted_scaler);
        }

        let mut categorical_imputer = None;
        let mut encoder = None;
        if !categorical.is_empty() {
            let mut imputer = Imputer::new(self.config.categorical_impute_strategy.clone());
            // Fill first so the fill value becomes a category when entries are missing
            let imputed = imputer.fit_transform(&raw, &categorical)?;

            let mut fitted_encoder = OneHotEncoder::new();
            fitted_encoder.fit(&imputed, &categorical)?;

            categorical_imputer = Some(imputer);
            encoder = Some(fitted_encoder);
        }

        let mut output_feature_names = numeric_columns.clone();
        if let Some(ref enc) = encoder {
            output_feature_names.extend(enc.feature_names());
        }

        Ok(FittedTransformState {
            schema,
            numeric_columns,
            categorical_columns,
            numeric_imputer,
            categorical_imputer,
            scaler,
            encoder,
            feature_stats,
            output_feature_names,
            fit_rows: df.height(),
            fit_time: start.elapsed().as_secs_f64(),
        })
    }

    fn compute_statistics(df: &DataFrame, schema: &FeatureSchema) -> Result<Vec<FeatureStats>> {
        schema
            .columns()
            .iter()
            .map(|(name, role)| {
                let series = df.column(name)?.as_materialized_series();
                match role {
                    ColumnType::Numeric => FeatureStats::from_numeric_series(name, series),
                    ColumnType::Categorical => FeatureStats::from_categorical_series(name, series),
                }
            })
            .collect()
    }

    /// Build the row-major output matrix from the scaled numeric columns
    /// followed by the indicator columns.
    fn assemble(df: &DataFrame, numeric_columns: &[String], indicators: &[Series]) -> Result<Array2<f64>> {
        let n_rows = df.height();

        let mut col_data: Vec<Vec<f64>> = Vec::with_capacity(numeric_columns.len() + indicators.len());
        for col_name in numeric_columns {
            let series = df
                .column(col_name)
                .map_err(|_| AutoMlError::FeatureNotFound(col_name.clone()))?
                .as_materialized_series();
            col_data.push(series_to_vec(series)?);
        }
        for series in indicators {
            col_data.push(series_to_vec(series)?);
        }

        let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
        Ok(Array2::from_shape_fn((n_rows, col_refs.len()), |(r, c)| col_refs[c][r]))
    }
}

impl Default for FeaturePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

fn series_to_vec(series: &Series) -> Result<Vec<f64>> {
    let ca = series.f64()?;
    if ca.null_count() > 0 {
        return Err(AutoMlError::DataError(format!(
            "column '{}' has missing values after imputation",
            series.name()
        )));
    }
    Ok(ca.into_no_null_iter().collect())
}

/// Extract a finite numeric target vector.
fn extract_target(series: &Series) -> Result<Array1<f64>> {
    if ColumnType::from_dtype(series.dtype()) != Some(ColumnType::Numeric) {
        return Err(AutoMlError::InvalidTarget(format!(
            "target '{}' has non-numeric dtype {}",
            series.name(),
            series.dtype()
        )));
    }

    let casted = series.cast(&DataType::Float64)?;
    casted
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| match v {
            Some(v) if v.is_finite() => Ok(v),
            _ => Err(AutoMlError::InvalidTarget(format!(
                "target '{}' is missing or non-finite at row {}",
                series.name(),
                row
            ))),
        })
        .collect()
}
