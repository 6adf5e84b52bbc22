//! One-hot categorical encoding

use crate::error::{AutoMlError, Result};
use indexmap::IndexMap;
use polars::prelude::*;

/// One-hot encoder with a fixed vocabulary per column.
///
/// Categories are indexed in the order they were first seen during fit.
/// A category that was never seen produces an all-zero indicator block.
#[derive(Debug, Clone, Default)]
pub struct OneHotEncoder {
    // column name -> (category -> indicator offset)
    mappings: IndexMap<String, IndexMap<String, usize>>,
    is_fitted: bool,
}

impl OneHotEncoder {
    /// Create a new encoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit the encoder to the given string columns of `df`. Nulls are skipped.
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        let mut mappings = IndexMap::with_capacity(columns.len());
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| AutoMlError::FeatureNotFound(col_name.to_string()))?;

            let mapping = Self::build_mapping(column.as_materialized_series())?;
            mappings.insert(col_name.to_string(), mapping);
        }

        self.mappings = mappings;
        self.is_fitted = true;
        Ok(self)
    }

    /// Encode every fitted column into indicator series, in fit order.
    pub fn transform(&self, df: &DataFrame) -> Result<Vec<Series>> {
        if !self.is_fitted {
            return Err(AutoMlError::UnfittedState);
        }

        let mut encoded = Vec::with_capacity(self.n_output_features());
        for (col_name, mapping) in &self.mappings {
            let column = df
                .column(col_name)
                .map_err(|_| AutoMlError::FeatureNotFound(col_name.clone()))?;
            let casted = column.as_materialized_series().cast(&DataType::String)?;
            let ca = casted.str()?;

            let positions: Vec<Option<usize>> = ca
                .into_iter()
                .map(|v| v.and_then(|s| mapping.get(s).copied()))
                .collect();

            for (category, &idx) in mapping {
                let values: Vec<f64> = positions
                    .iter()
                    .map(|pos| if *pos == Some(idx) { 1.0 } else { 0.0 })
                    .collect();
                encoded.push(Series::new(Self::feature_name(col_name, category).into(), values));
            }
        }

        Ok(encoded)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<Vec<Series>> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Learned categories for `column`, in indicator order
    pub fn categories(&self, column: &str) -> Option<Vec<&str>> {
        self.mappings
            .get(column)
            .map(|mapping| mapping.keys().map(|k| k.as_str()).collect())
    }

    /// Names of the indicator columns produced by `transform`
    pub fn feature_names(&self) -> Vec<String> {
        self.mappings
            .iter()
            .flat_map(|(col_name, mapping)| {
                mapping.keys().map(move |category| Self::feature_name(col_name, category))
            })
            .collect()
    }

    pub fn n_output_features(&self) -> usize {
        self.mappings.values().map(|m| m.len()).sum()
    }

    fn feature_name(column: &str, category: &str) -> String {
        format!("{}_{}", column, category)
    }

    fn build_mapping(series: &Series) -> Result<IndexMap<String, usize>> {
        let casted = series.cast(&DataType::String)?;
        let ca = casted.str()?;

        let mut mapping = IndexMap::new();
        for val in ca.into_iter().flatten() {
            if !mapping.contains_key(val) {
                let idx = mapping.len();
                mapping.insert(val.to_string(), idx);
            }
        }

        Ok(mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city_df(values: &[&str]) -> DataFrame {
        DataFrame::new(vec![Column::new("city".into(), values)]).unwrap()
    }

    #[test]
    fn test_first_seen_order() {
        let mut encoder = OneHotEncoder::new();
        encoder.fit(&city_df(&["NYC", "LA", "NYC", "SF"]), &["city"]).unwrap();

        assert_eq!(encoder.categories("city").unwrap(), vec!["NYC", "LA", "SF"]);
        assert_eq!(encoder.feature_names(), vec!["city_NYC", "city_LA", "city_SF"]);
    }

    #[test]
    fn test_onehot_values() {
        let mut encoder = OneHotEncoder::new();
        let encoded = encoder.fit_transform(&city_df(&["NYC", "LA", "NYC"]), &["city"]).unwrap();

        assert_eq!(encoded.len(), 2);
        let nyc: Vec<f64> = encoded[0].f64().unwrap().into_no_null_iter().collect();
        let la: Vec<f64> = encoded[1].f64().unwrap().into_no_null_iter().collect();
        assert_eq!(nyc, vec![1.0, 0.0, 1.0]);
        assert_eq!(la, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_unseen_category_is_all_zero() {
        let mut encoder = OneHotEncoder::new();
        encoder.fit(&city_df(&["NYC", "LA"]), &["city"]).unwrap();

        let encoded = encoder.transform(&city_df(&["Boston"])).unwrap();
        assert_eq!(encoded.len(), 2);
        for series in &encoded {
            assert_eq!(series.f64().unwrap().get(0), Some(0.0));
        }
    }

    #[test]
    fn test_transform_before_fit() {
        let encoder = OneHotEncoder::new();
        assert!(matches!(encoder.transform(&city_df(&["NYC"])), Err(AutoMlError::UnfittedState)));
    }
}
