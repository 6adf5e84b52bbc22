//! Feature scaling implementations

use crate::error::{AutoMlError, Result};
use indexmap::IndexMap;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Type of scaler to use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalerType {
    /// Standard scaling (z-score normalization): (x - mean) / std, population std
    Standard,
    /// Min-Max scaling: (x - min) / (max - min)
    MinMax,
    /// Robust scaling using median and IQR
    Robust,
    /// Max absolute scaling: x / max(|x|)
    MaxAbs,
    /// No scaling
    None,
}

/// Parameters for one fitted column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    /// mean, min, median or 0
    pub center: f64,
    /// std, range, IQR or max |x|; never zero
    pub scale: f64,
}

/// Feature scaler
#[derive(Debug, Clone)]
pub struct Scaler {
    scaler_type: ScalerType,
    params: IndexMap<String, ScalerParams>,
    is_fitted: bool,
}

impl Scaler {
    /// Create a new scaler
    pub fn new(scaler_type: ScalerType) -> Self {
        Self {
            scaler_type,
            params: IndexMap::new(),
            is_fitted: false,
        }
    }

    /// Fit the scaler to the data. Columns must already be free of missing values.
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        let mut params = IndexMap::with_capacity(columns.len());
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| AutoMlError::FeatureNotFound(col_name.to_string()))?;
            let values = Self::column_values(column.as_materialized_series())?;

            let fitted = self.compute_params(col_name, &values);
            debug!(column = %col_name, center = fitted.center, scale = fitted.scale, "fitted scaler");
            params.insert(col_name.to_string(), fitted);
        }

        self.params = params;
        self.is_fitted = true;
        Ok(self)
    }

    /// Transform the data.
    /// Builds all replacement columns first, then applies them in a single pass.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        self.map_columns(df, |v, p| (v - p.center) / p.scale)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Inverse transform the data
    pub fn inverse_transform(&self, df: &DataFrame) -> Result<DataFrame> {
        self.map_columns(df, |v, p| v * p.scale + p.center)
    }

    /// Map a single scaled value of `column` back to its original units
    pub fn inverse_transform_value(&self, column: &str, value: f64) -> Option<f64> {
        self.params.get(column).map(|p| value * p.scale + p.center)
    }

    /// Fitted parameters for `column`
    pub fn params(&self, column: &str) -> Option<ScalerParams> {
        self.params.get(column).copied()
    }

    fn map_columns(&self, df: &DataFrame, f: impl Fn(f64, &ScalerParams) -> f64) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(AutoMlError::UnfittedState);
        }

        let replacements: Vec<Series> = self
            .params
            .iter()
            .map(|(col_name, params)| {
                let column = df
                    .column(col_name)
                    .map_err(|_| AutoMlError::FeatureNotFound(col_name.clone()))?;
                let series = column.as_materialized_series();
                let casted = series.cast(&DataType::Float64)?;
                let mapped: Float64Chunked = casted
                    .f64()?
                    .into_iter()
                    .map(|opt| opt.map(|v| f(v, params)))
                    .collect();
                Ok(mapped.with_name(series.name().clone()).into_series())
            })
            .collect::<Result<Vec<_>>>()?;

        let mut result = df.clone();
        for scaled in replacements {
            result.with_column(scaled)?;
        }

        Ok(result)
    }

    fn column_values(series: &Series) -> Result<Vec<f64>> {
        let casted = series.cast(&DataType::Float64)?;
        let ca = casted.f64()?;
        if ca.null_count() > 0 {
            return Err(AutoMlError::DataError(format!(
                "column '{}' still has missing values; impute before scaling",
                series.name()
            )));
        }
        Ok(ca.into_no_null_iter().collect())
    }

    fn compute_params(&self, col_name: &str, values: &[f64]) -> ScalerParams {
        let (center, scale) = match self.scaler_type {
            ScalerType::Standard => {
                let n = values.len().max(1) as f64;
                let mean = values.iter().sum::<f64>() / n;
                let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                (mean, var.sqrt())
            }
            ScalerType::MinMax => {
                let min = values.iter().copied().reduce(f64::min).unwrap_or(0.0);
                let max = values.iter().copied().reduce(f64::max).unwrap_or(1.0);
                (min, max - min)
            }
            ScalerType::Robust => {
                let median = super::median(values).unwrap_or(0.0);
                let q1 = super::quantile(values, 0.25).unwrap_or(0.0);
                let q3 = super::quantile(values, 0.75).unwrap_or(1.0);
                (median, q3 - q1)
            }
            ScalerType::MaxAbs => {
                let max_abs = values.iter().fold(0.0f64, |a, b| a.max(b.abs()));
                (0.0, max_abs)
            }
            ScalerType::None => (0.0, 1.0),
        };

        let scale = if scale == 0.0 || !scale.is_finite() {
            warn!(column = col_name, "zero or undefined scale, leaving column unscaled");
            1.0
        } else {
            scale
        };

        ScalerParams { center, scale }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn single_column(values: &[f64]) -> DataFrame {
        DataFrame::new(vec![Column::new("a".into(), values)]).unwrap()
    }

    #[test]
    fn test_standard_scaler() {
        let df = single_column(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        let mut scaler = Scaler::new(ScalerType::Standard);
        let result = scaler.fit_transform(&df, &["a"]).unwrap();

        let col: Vec<f64> = result.column("a").unwrap().f64().unwrap().into_no_null_iter().collect();
        let mean = col.iter().sum::<f64>() / col.len() as f64;
        let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / col.len() as f64;
        assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-10);
        assert_abs_diff_eq!(var, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_minmax_scaler() {
        let df = single_column(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        let mut scaler = Scaler::new(ScalerType::MinMax);
        let result = scaler.fit_transform(&df, &["a"]).unwrap();

        let col = result.column("a").unwrap().f64().unwrap();
        assert_abs_diff_eq!(col.min().unwrap(), 0.0, epsilon = 1e-10);
        assert_abs_diff_eq!(col.max().unwrap(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_robust_scaler_params() {
        let df = single_column(&[1.0, 2.0, 3.0, 4.0, 100.0]);

        let mut scaler = Scaler::new(ScalerType::Robust);
        scaler.fit(&df, &["a"]).unwrap();

        let params = scaler.params("a").unwrap();
        assert_eq!(params.center, 3.0);
        assert_eq!(params.scale, 2.0);
    }

    #[test]
    fn test_constant_column_is_not_divided_by_zero() {
        let df = single_column(&[7.0, 7.0, 7.0]);

        let mut scaler = Scaler::new(ScalerType::Standard);
        let result = scaler.fit_transform(&df, &["a"]).unwrap();

        let col = result.column("a").unwrap().f64().unwrap();
        assert!(col.into_no_null_iter().all(|v| v == 0.0));
    }

    #[test]
    fn test_inverse_transform() {
        let df = single_column(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        let mut scaler = Scaler::new(ScalerType::Standard);
        let scaled = scaler.fit_transform(&df, &["a"]).unwrap();
        let unscaled = scaler.inverse_transform(&scaled).unwrap();

        let original = df.column("a").unwrap().f64().unwrap();
        let restored = unscaled.column("a").unwrap().f64().unwrap();

        for (o, r) in original.into_iter().zip(restored.into_iter()) {
            assert_abs_diff_eq!(o.unwrap(), r.unwrap(), epsilon = 1e-10);
        }

        assert_abs_diff_eq!(scaler.inverse_transform_value("a", 0.0).unwrap(), 3.0, epsilon = 1e-10);
        assert!(scaler.inverse_transform_value("b", 0.0).is_none());
    }

    #[test]
    fn test_missing_values_rejected() {
        let df = DataFrame::new(vec![Column::new("a".into(), &[Some(1.0), None])]).unwrap();
        let mut scaler = Scaler::new(ScalerType::Standard);
        assert!(matches!(scaler.fit(&df, &["a"]), Err(AutoMlError::DataError(_))));
    }
}
