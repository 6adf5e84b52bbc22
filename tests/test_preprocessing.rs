//! Integration test: Feature preprocessing

use approx::assert_abs_diff_eq;
use estate_automl::error::AutoMlError;
use estate_automl::preprocessing::{
    ColumnType, FeaturePreprocessor, ImputeStrategy, PreprocessingConfig, ScalerType,
};
use polars::prelude::*;

fn listings() -> DataFrame {
    df!(
        "SquareFeet" => &[Some(1000i64), Some(2000), None, Some(1500), Some(3000)],
        "Bedrooms" => &[2i64, 3, 3, 2, 4],
        "Location" => &[Some("Urban"), Some("Rural"), Some("Urban"), None, Some("Suburban")],
    )
    .unwrap()
}

fn unscaled() -> FeaturePreprocessor {
    FeaturePreprocessor::with_config(PreprocessingConfig::new().with_scaler(ScalerType::None))
}

#[test]
fn test_output_width_is_fixed_at_fit() {
    let mut preprocessor = FeaturePreprocessor::new();
    preprocessor.fit(&listings()).unwrap();

    // 2 numeric + Urban, Rural, missing, Suburban
    assert_eq!(preprocessor.n_output_features().unwrap(), 6);
    assert_eq!(
        preprocessor.output_feature_names().unwrap(),
        &[
            "SquareFeet",
            "Bedrooms",
            "Location_Urban",
            "Location_Rural",
            "Location_missing",
            "Location_Suburban",
        ]
    );

    // A batch with a single known category and no missing values keeps the layout
    let batch = df!(
        "SquareFeet" => &[1200i64],
        "Bedrooms" => &[1i64],
        "Location" => &["Rural"],
    )
    .unwrap();
    let x = preprocessor.transform(&batch).unwrap();
    assert_eq!(x.dim(), (1, 6));
    assert_eq!(x.row(0).to_vec()[2..], [0.0, 1.0, 0.0, 0.0]);
}

#[test]
fn test_transform_is_idempotent() {
    let df = listings();
    let mut preprocessor = FeaturePreprocessor::new();
    preprocessor.fit(&df).unwrap();

    let first = preprocessor.transform(&df).unwrap();
    let second = preprocessor.transform(&df).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_unseen_category_encodes_to_zeros() {
    let mut preprocessor = FeaturePreprocessor::new();
    preprocessor.fit(&listings()).unwrap();

    let batch = df!(
        "SquareFeet" => &[1200i64],
        "Bedrooms" => &[2i64],
        "Location" => &["Coastal"],
    )
    .unwrap();
    let x = preprocessor.transform(&batch).unwrap();
    assert!(x.row(0).iter().skip(2).all(|&v| v == 0.0));
}

#[test]
fn test_missing_numeric_uses_fit_time_median() {
    let mut preprocessor = unscaled();
    preprocessor.fit(&listings()).unwrap();

    // Observed SquareFeet: 1000, 2000, 1500, 3000 -> median 1750
    let x = preprocessor.transform(&listings()).unwrap();
    assert_abs_diff_eq!(x[[2, 0]], 1750.0, epsilon = 1e-9);

    // The fill value comes from fit data, not from the batch
    let batch = df!(
        "SquareFeet" => &[None, Some(9000i64)],
        "Bedrooms" => &[1i64, 1],
        "Location" => &["Urban", "Urban"],
    )
    .unwrap();
    let x = preprocessor.transform(&batch).unwrap();
    assert_abs_diff_eq!(x[[0, 0]], 1750.0, epsilon = 1e-9);
    assert_abs_diff_eq!(x[[1, 0]], 9000.0, epsilon = 1e-9);
}

#[test]
fn test_nan_counts_as_missing() {
    let df = df!(
        "area" => &[1.0, f64::NAN, 3.0, 5.0],
    )
    .unwrap();
    let mut preprocessor = unscaled();
    preprocessor.fit(&df).unwrap();

    let x = preprocessor.transform(&df).unwrap();
    assert_eq!(x[[1, 0]], 3.0);
    assert_eq!(preprocessor.feature_stats()[0].null_count, 1);
}

#[test]
fn test_standardized_columns() {
    let mut preprocessor = FeaturePreprocessor::new();
    preprocessor.fit(&listings()).unwrap();
    let x = preprocessor.transform(&listings()).unwrap();

    for j in 0..2 {
        let col = x.column(j);
        let mean = col.mean().unwrap();
        let var = col.mapv(|v| (v - mean).powi(2)).mean().unwrap();
        assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(var, 1.0, epsilon = 1e-9);
    }
}

#[test]
fn test_transform_before_fit() {
    let preprocessor = FeaturePreprocessor::new();
    assert!(matches!(
        preprocessor.transform(&listings()),
        Err(AutoMlError::UnfittedState)
    ));
    assert!(preprocessor.output_feature_names().is_err());
}

#[test]
fn test_fit_on_empty_input() {
    let mut preprocessor = FeaturePreprocessor::new();
    let no_rows = listings().head(Some(0));
    assert!(matches!(preprocessor.fit(&no_rows), Err(AutoMlError::NotFitted(_))));

    let no_columns = DataFrame::empty();
    assert!(matches!(preprocessor.fit(&no_columns), Err(AutoMlError::NotFitted(_))));
    assert!(!preprocessor.is_fitted());
}

#[test]
fn test_schema_mismatch() {
    let mut preprocessor = FeaturePreprocessor::new();
    preprocessor.fit(&listings()).unwrap();

    let missing_column = listings().drop("Bedrooms").unwrap();
    match preprocessor.transform(&missing_column).unwrap_err() {
        AutoMlError::SchemaMismatch { missing, unexpected, mistyped } => {
            assert_eq!(missing, vec!["Bedrooms"]);
            assert!(unexpected.is_empty());
            assert!(mistyped.is_empty());
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let mut extra_column = listings();
    extra_column
        .with_column(Series::new("Garage".into(), &[1i64, 0, 1, 0, 1]))
        .unwrap();
    assert!(matches!(
        preprocessor.transform(&extra_column),
        Err(AutoMlError::SchemaMismatch { .. })
    ));

    let retyped = df!(
        "SquareFeet" => &["big"],
        "Bedrooms" => &[2i64],
        "Location" => &["Urban"],
    )
    .unwrap();
    match preprocessor.transform(&retyped).unwrap_err() {
        AutoMlError::SchemaMismatch { mistyped, .. } => assert_eq!(mistyped, vec!["SquareFeet"]),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_reordered_and_null_columns_are_accepted() {
    let mut preprocessor = unscaled();
    preprocessor.fit(&listings()).unwrap();

    let batch = DataFrame::new(vec![
        Column::full_null("Location".into(), 2, &DataType::Null),
        Column::new("Bedrooms".into(), &[5i64, 6]),
        Column::new("SquareFeet".into(), &[800i64, 900]),
    ])
    .unwrap();

    let x = preprocessor.transform(&batch).unwrap();
    assert_eq!(x.dim(), (2, 6));
    // Numeric columns keep fit order regardless of input order
    assert_eq!(x[[0, 0]], 800.0);
    assert_eq!(x[[0, 1]], 5.0);
    // Null location is filled with the fit-time fill category
    assert_eq!(x.row(0).to_vec()[2..], [0.0, 0.0, 1.0, 0.0]);
}

#[test]
fn test_categorical_dtype_is_categorical_role() {
    let mut df = listings();
    let location = df
        .column("Location")
        .unwrap()
        .cast(&DataType::Categorical(None, CategoricalOrdering::Physical))
        .unwrap();
    df.with_column(location).unwrap();

    let mut preprocessor = FeaturePreprocessor::new();
    preprocessor.fit(&df).unwrap();
    assert_eq!(
        preprocessor.schema().unwrap().column_type("Location"),
        Some(ColumnType::Categorical)
    );
    assert_eq!(preprocessor.n_output_features().unwrap(), 6);
}

#[test]
fn test_unsupported_column_type() {
    let df = df!(
        "SquareFeet" => &[1000i64, 2000],
        "HasGarage" => &[true, false],
    )
    .unwrap();
    let mut preprocessor = FeaturePreprocessor::new();
    assert!(matches!(
        preprocessor.fit(&df),
        Err(AutoMlError::UnsupportedColumnType { .. })
    ));
}

#[test]
fn test_refit_overwrites_previous_state() {
    let mut preprocessor = FeaturePreprocessor::new();
    preprocessor.fit(&listings()).unwrap();

    let other = df!(
        "Rooms" => &[1.0, 2.0],
    )
    .unwrap();
    preprocessor.fit(&other).unwrap();

    assert_eq!(preprocessor.output_feature_names().unwrap(), &["Rooms"]);
    assert!(matches!(
        preprocessor.transform(&listings()),
        Err(AutoMlError::SchemaMismatch { .. })
    ));
}

#[test]
fn test_fit_transform_splits_target() {
    let mut table = listings();
    table
        .with_column(Series::new("Price".into(), &[100.0, 200.0, 150.0, 120.0, 300.0]))
        .unwrap();

    let mut preprocessor = FeaturePreprocessor::new();
    let (x, y) = preprocessor.fit_transform(&table, "Price").unwrap();

    assert_eq!(x.dim(), (5, 6));
    assert_eq!(y.to_vec(), vec![100.0, 200.0, 150.0, 120.0, 300.0]);
    assert!(preprocessor.schema().unwrap().column_type("Price").is_none());
}

#[test]
fn test_missing_target_leaves_instance_unchanged() {
    let mut preprocessor = FeaturePreprocessor::new();
    assert!(matches!(
        preprocessor.fit_transform(&listings(), "Price"),
        Err(AutoMlError::MissingTarget(_))
    ));
    assert!(!preprocessor.is_fitted());

    preprocessor.fit(&listings()).unwrap();
    assert!(preprocessor.fit_transform(&listings(), "Price").is_err());
    assert_eq!(preprocessor.n_output_features().unwrap(), 6);
}

#[test]
fn test_most_frequent_imputation() {
    let config = PreprocessingConfig::new()
        .with_scaler(ScalerType::None)
        .with_numeric_impute(ImputeStrategy::MostFrequent)
        .with_categorical_impute(ImputeStrategy::MostFrequent);
    let df = df!(
        "Bedrooms" => &[Some(3i64), Some(2), Some(3), None],
        "Location" => &[Some("Rural"), None, Some("Rural"), Some("Urban")],
    )
    .unwrap();

    let mut preprocessor = FeaturePreprocessor::with_config(config);
    preprocessor.fit(&df).unwrap();
    let x = preprocessor.transform(&df).unwrap();

    assert_eq!(x[[3, 0]], 3.0);
    assert_eq!(
        preprocessor.output_feature_names().unwrap(),
        &["Bedrooms", "Location_Rural", "Location_Urban"]
    );
    assert_eq!(x.row(1).to_vec()[1..], [1.0, 0.0]);
}

#[test]
fn test_concurrent_transforms() {
    let mut preprocessor = FeaturePreprocessor::new();
    preprocessor.fit(&listings()).unwrap();
    let expected = preprocessor.transform(&listings()).unwrap();

    let shared = &preprocessor;
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(move || shared.transform(&listings()).unwrap()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
