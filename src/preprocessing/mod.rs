//! Feature preprocessing module
//!
//! Turns a raw feature table into a dense numeric matrix:
//! - Column role discovery (numeric vs categorical) frozen in a [`FeatureSchema`]
//! - Missing value imputation
//! - Feature scaling (StandardScaler, MinMaxScaler, RobustScaler, MaxAbsScaler)
//! - One-hot encoding with a fixed vocabulary per column

mod config;
mod imputer;
mod scaler;
mod encoder;
mod pipeline;

pub use config::PreprocessingConfig;
pub use imputer::{Imputer, ImputeStrategy};
pub use scaler::{Scaler, ScalerType};
pub use encoder::OneHotEncoder;
pub use pipeline::FeaturePreprocessor;

use crate::error::{AutoMlError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Role of a feature column, resolved once from its stored dtype at fit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Numeric,
    Categorical,
}

impl ColumnType {
    /// Classify a dtype, or `None` if it has no preprocessing role.
    pub fn from_dtype(dtype: &DataType) -> Option<Self> {
        match dtype {
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 |
            DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 |
            DataType::Float32 | DataType::Float64 => Some(ColumnType::Numeric),
            DataType::String | DataType::Categorical(_, _) => Some(ColumnType::Categorical),
            _ => None,
        }
    }

    /// Whether a column of `dtype` can be fed to a column fitted with this role.
    /// An all-null column carries no values and is accepted for either role.
    fn accepts(&self, dtype: &DataType) -> bool {
        matches!(dtype, DataType::Null) || Self::from_dtype(dtype) == Some(*self)
    }

    /// The dtype every column of this role is cast to before processing
    fn working_dtype(&self) -> DataType {
        match self {
            ColumnType::Numeric => DataType::Float64,
            ColumnType::Categorical => DataType::String,
        }
    }
}

/// Partition of feature columns into numeric and categorical roles.
///
/// Built once from the `fit` input and never recomputed from `transform`
/// inputs. Column order is the order the columns appeared in the fit table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    columns: Vec<(String, ColumnType)>,
}

impl FeatureSchema {
    /// Infer the schema of `df` from its column dtypes.
    pub fn infer(df: &DataFrame) -> Result<Self> {
        let columns = df
            .get_columns()
            .iter()
            .map(|col| {
                let name = col.name().to_string();
                match ColumnType::from_dtype(col.dtype()) {
                    Some(role) => Ok((name, role)),
                    None => Err(AutoMlError::UnsupportedColumnType {
                        column: name,
                        dtype: col.dtype().to_string(),
                    }),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[(String, ColumnType)] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|(col, _)| col == name)
            .map(|(_, role)| *role)
    }

    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns_of(ColumnType::Numeric)
    }

    pub fn categorical_columns(&self) -> Vec<String> {
        self.columns_of(ColumnType::Categorical)
    }

    fn columns_of(&self, role: ColumnType) -> Vec<String> {
        self.columns
            .iter()
            .filter(|(_, r)| *r == role)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Check that `df` has exactly the schema's columns with compatible dtypes.
    pub fn validate(&self, df: &DataFrame) -> Result<()> {
        let expected: HashSet<&str> = self.columns.iter().map(|(n, _)| n.as_str()).collect();

        let mut missing = Vec::new();
        let mut mistyped = Vec::new();
        for (name, role) in &self.columns {
            match df.column(name) {
                Ok(col) if role.accepts(col.dtype()) => {}
                Ok(_) => mistyped.push(name.clone()),
                Err(_) => missing.push(name.clone()),
            }
        }

        let unexpected: Vec<String> = df
            .get_column_names()
            .into_iter()
            .filter(|name| !expected.contains(name.as_str()))
            .map(|name| name.to_string())
            .collect();

        if missing.is_empty() && unexpected.is_empty() && mistyped.is_empty() {
            Ok(())
        } else {
            Err(AutoMlError::SchemaMismatch { missing, unexpected, mistyped })
        }
    }

    /// Select the schema's columns in schema order, cast to their working dtype.
    pub(crate) fn conform(&self, df: &DataFrame) -> Result<DataFrame> {
        let columns = self
            .columns
            .iter()
            .map(|(name, role)| {
                let col = df
                    .column(name)
                    .map_err(|_| AutoMlError::FeatureNotFound(name.clone()))?;
                Ok(col.cast(&role.working_dtype())?)
            })
            .collect::<Result<Vec<Column>>>()?;

        Ok(DataFrame::new(columns)?)
    }
}

/// Feature statistics computed during fit, on the raw (pre-imputation) values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureStats {
    pub name: String,
    pub dtype: ColumnType,
    pub count: usize,
    pub null_count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub median: Option<f64>,
    pub unique_count: Option<usize>,
    pub categories: Option<Vec<String>>,
}

impl FeatureStats {
    /// Create new feature statistics
    pub fn new(name: impl Into<String>, dtype: ColumnType) -> Self {
        Self {
            name: name.into(),
            dtype,
            count: 0,
            null_count: 0,
            mean: None,
            std: None,
            min: None,
            max: None,
            median: None,
            unique_count: None,
            categories: None,
        }
    }

    /// Compute statistics from a Float64 series. NaN counts as missing.
    pub fn from_numeric_series(name: &str, series: &Series) -> Result<Self> {
        let mut stats = Self::new(name, ColumnType::Numeric);
        let ca = series.f64()?;
        let observed: Vec<f64> = ca.into_iter().flatten().filter(|v| !v.is_nan()).collect();

        stats.count = series.len();
        stats.null_count = series.len() - observed.len();

        if !observed.is_empty() {
            let n = observed.len() as f64;
            let mean = observed.iter().sum::<f64>() / n;
            let var = observed.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            stats.mean = Some(mean);
            stats.std = Some(var.sqrt());
            stats.min = observed.iter().copied().reduce(f64::min);
            stats.max = observed.iter().copied().reduce(f64::max);
            stats.median = median(&observed);
        }

        Ok(stats)
    }

    /// Compute statistics from a String series; categories keep first-seen order.
    pub fn from_categorical_series(name: &str, series: &Series) -> Result<Self> {
        let mut stats = Self::new(name, ColumnType::Categorical);
        stats.count = series.len();
        stats.null_count = series.null_count();

        let mut seen = HashSet::new();
        let categories: Vec<String> = series
            .str()?
            .into_iter()
            .flatten()
            .filter(|v| seen.insert(*v))
            .map(|v| v.to_string())
            .collect();

        stats.unique_count = Some(categories.len());
        stats.categories = Some(categories);
        Ok(stats)
    }
}

/// Median of a slice, averaging the two middle values for even lengths.
pub(crate) fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Linear-interpolated quantile, `q` in `[0, 1]`.
pub(crate) fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed_df() -> DataFrame {
        df!(
            "SquareFeet" => &[1000i64, 2000, 1500],
            "Location" => &["Urban", "Rural", "Urban"],
            "Age" => &[10.0, 20.0, 30.0],
        )
        .unwrap()
    }

    #[test]
    fn test_schema_inference() {
        let schema = FeatureSchema::infer(&mixed_df()).unwrap();
        assert_eq!(schema.numeric_columns(), vec!["SquareFeet", "Age"]);
        assert_eq!(schema.categorical_columns(), vec!["Location"]);
        assert_eq!(schema.column_type("Location"), Some(ColumnType::Categorical));
        assert_eq!(schema.column_type("Price"), None);
    }

    #[test]
    fn test_unsupported_dtype() {
        let df = df!("flag" => &[true, false]).unwrap();
        let err = FeatureSchema::infer(&df).unwrap_err();
        assert!(matches!(err, AutoMlError::UnsupportedColumnType { .. }));
    }

    #[test]
    fn test_validate_reports_all_problems() {
        let schema = FeatureSchema::infer(&mixed_df()).unwrap();
        let other = df!(
            "SquareFeet" => &["big", "small"],
            "Location" => &["Urban", "Rural"],
            "Garage" => &[1, 0],
        )
        .unwrap();

        match schema.validate(&other).unwrap_err() {
            AutoMlError::SchemaMismatch { missing, unexpected, mistyped } => {
                assert_eq!(missing, vec!["Age"]);
                assert_eq!(unexpected, vec!["Garage"]);
                assert_eq!(mistyped, vec!["SquareFeet"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validate_accepts_reordered_columns() {
        let schema = FeatureSchema::infer(&mixed_df()).unwrap();
        let reordered = df!(
            "Age" => &[1.0],
            "Location" => &["Suburban"],
            "SquareFeet" => &[900i64],
        )
        .unwrap();
        assert!(schema.validate(&reordered).is_ok());
    }

    #[test]
    fn test_feature_stats_new() {
        let stats = FeatureStats::new("test_feature", ColumnType::Numeric);
        assert_eq!(stats.name, "test_feature");
        assert_eq!(stats.dtype, ColumnType::Numeric);
        assert_eq!(stats.count, 0);
    }

    #[test]
    fn test_categorical_stats_first_seen_order() {
        let series = Series::new("city".into(), &[Some("SF"), None, Some("LA"), Some("SF")]);
        let stats = FeatureStats::from_categorical_series("city", &series).unwrap();
        assert_eq!(stats.null_count, 1);
        assert_eq!(stats.categories.unwrap(), vec!["SF", "LA"]);
    }

    #[test]
    fn test_median_and_quantile() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(&[]), None);
        assert_eq!(quantile(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.25), Some(2.0));
    }

    #[test]
    fn test_column_type_serialize() {
        let json = serde_json::to_string(&ColumnType::Numeric).unwrap();
        assert_eq!(json, "\"Numeric\"");
    }
}
