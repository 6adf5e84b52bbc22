//! Missing value imputation strategies

use crate::error::{AutoMlError, Result};
use super::config::DEFAULT_CATEGORICAL_FILL;
use indexmap::IndexMap;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Strategy for imputing missing values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Replace with mean (numeric only)
    Mean,
    /// Replace with median (numeric only)
    Median,
    /// Replace with mode / most frequent value; ties pick the smallest value
    MostFrequent,
    /// Replace with a constant value (numeric only)
    Constant(f64),
    /// Replace with a constant string (categorical only)
    ConstantString(String),
}

impl ImputeStrategy {
    pub fn supports_numeric(&self) -> bool {
        !matches!(self, ImputeStrategy::ConstantString(_))
    }

    pub fn supports_categorical(&self) -> bool {
        matches!(self, ImputeStrategy::MostFrequent | ImputeStrategy::ConstantString(_))
    }
}

/// Learned fill value for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImputeValue {
    Numeric(f64),
    String(String),
}

/// Imputer for handling missing values.
///
/// Numeric columns treat both nulls and NaN as missing; string columns treat
/// nulls as missing.
#[derive(Debug, Clone)]
pub struct Imputer {
    strategy: ImputeStrategy,
    fill_values: IndexMap<String, ImputeValue>,
    is_fitted: bool,
}

impl Imputer {
    /// Create a new imputer with the specified strategy
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self {
            strategy,
            fill_values: IndexMap::new(),
            is_fitted: false,
        }
    }

    pub fn strategy(&self) -> &ImputeStrategy {
        &self.strategy
    }

    /// Fit the imputer to the given columns of `df`
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        let mut fill_values = IndexMap::with_capacity(columns.len());
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| AutoMlError::FeatureNotFound(col_name.to_string()))?;

            let fill_value = self.compute_fill_value(col_name, column.as_materialized_series())?;
            fill_values.insert(col_name.to_string(), fill_value);
        }

        self.fill_values = fill_values;
        self.is_fitted = true;
        Ok(self)
    }

    /// Transform the data by imputing missing values in every fitted column
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(AutoMlError::UnfittedState);
        }

        let mut result = df.clone();
        for (col_name, fill_value) in &self.fill_values {
            let column = df
                .column(col_name)
                .map_err(|_| AutoMlError::FeatureNotFound(col_name.clone()))?;
            let filled = Self::fill_series(column.as_materialized_series(), fill_value)?;
            result.with_column(filled)?;
        }

        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// The value learned for `column` during fit
    pub fn fill_value(&self, column: &str) -> Option<&ImputeValue> {
        self.fill_values.get(column)
    }

    fn compute_fill_value(&self, col_name: &str, series: &Series) -> Result<ImputeValue> {
        if series.dtype() == &DataType::String {
            let ca = series.str()?;
            let observed: Vec<&str> = ca.into_iter().flatten().collect();
            return match &self.strategy {
                ImputeStrategy::ConstantString(val) => Ok(ImputeValue::String(val.clone())),
                ImputeStrategy::MostFrequent => {
                    let mode = Self::compute_mode_string(&observed).unwrap_or_else(|| {
                        warn!(column = col_name, "no observed categories, falling back to constant fill");
                        DEFAULT_CATEGORICAL_FILL.to_string()
                    });
                    Ok(ImputeValue::String(mode))
                }
                other => Err(AutoMlError::ConfigError(format!(
                    "{other:?} cannot impute categorical column '{col_name}'"
                ))),
            };
        }

        let casted = series.cast(&DataType::Float64)?;
        let observed: Vec<f64> = casted
            .f64()?
            .into_iter()
            .flatten()
            .filter(|v| !v.is_nan())
            .collect();

        let value = match &self.strategy {
            ImputeStrategy::Constant(val) => Some(*val),
            ImputeStrategy::Mean if !observed.is_empty() => {
                Some(observed.iter().sum::<f64>() / observed.len() as f64)
            }
            ImputeStrategy::Median => super::median(&observed),
            ImputeStrategy::MostFrequent => Self::compute_mode_numeric(&observed),
            ImputeStrategy::Mean => None,
            ImputeStrategy::ConstantString(_) => {
                return Err(AutoMlError::ConfigError(format!(
                    "{:?} cannot impute numeric column '{col_name}'",
                    self.strategy
                )));
            }
        };

        Ok(ImputeValue::Numeric(value.unwrap_or_else(|| {
            warn!(column = col_name, "numeric column has no observed values, imputing 0.0");
            0.0
        })))
    }

    /// Most frequent value; ties resolve to the smallest value
    fn compute_mode_numeric(values: &[f64]) -> Option<f64> {
        let mut counts: HashMap<u64, usize> = HashMap::new();
        for val in values {
            *counts.entry(val.to_bits()).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .map(|(bits, count)| (f64::from_bits(bits), count))
            .max_by(|(va, ca), (vb, cb)| ca.cmp(cb).then_with(|| vb.total_cmp(va)))
            .map(|(val, _)| val)
    }

    /// Most frequent string; ties resolve to the lexicographically smallest
    fn compute_mode_string(values: &[&str]) -> Option<String> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for &val in values {
            *counts.entry(val).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .max_by(|(va, ca), (vb, cb)| ca.cmp(cb).then_with(|| vb.cmp(va)))
            .map(|(val, _)| val.to_string())
    }

    fn fill_series(series: &Series, fill_value: &ImputeValue) -> Result<Series> {
        match fill_value {
            ImputeValue::Numeric(val) => {
                let casted = series.cast(&DataType::Float64)?;
                let filled: Float64Chunked = casted
                    .f64()?
                    .into_iter()
                    .map(|opt| match opt {
                        Some(v) if !v.is_nan() => Some(v),
                        _ => Some(*val),
                    })
                    .collect();

                Ok(filled.with_name(series.name().clone()).into_series())
            }
            ImputeValue::String(val) => {
                let casted = series.cast(&DataType::String)?;
                let filled: StringChunked = casted
                    .str()?
                    .into_iter()
                    .map(|opt| Some(opt.unwrap_or(val.as_str())))
                    .collect();

                Ok(filled.with_name(series.name().clone()).into_series())
            }
        }
    }
}
