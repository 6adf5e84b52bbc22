//! Synthetic data generation module
//!
//! Generates a reproducible property-price dataset with numeric, categorical
//! and (optionally) missing values, for demos, tests and benchmarks.

use crate::error::{AutoMlError, Result};
use polars::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Location categories and their price multipliers
pub const LOCATIONS: [(&str, f64); 3] = [("Urban", 1.5), ("Suburban", 1.2), ("Rural", 1.0)];

/// Seeded generator for the housing dataset.
///
/// Columns: `SquareFeet`, `Bedrooms`, `Bathrooms`, `Location`, `Age`, `Price`.
/// Price is linear in the numeric features plus Gaussian noise, scaled by
/// the location multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HousingDataGenerator {
    pub n_samples: usize,
    pub seed: u64,
    /// Standard deviation of the price noise
    pub noise_std: f64,
    /// Probability that a feature cell is nulled (target is never nulled)
    pub missing_rate: f64,
}

impl Default for HousingDataGenerator {
    fn default() -> Self {
        Self {
            n_samples: 1000,
            seed: 42,
            noise_std: 25_000.0,
            missing_rate: 0.0,
        }
    }
}

impl HousingDataGenerator {
    pub fn new(n_samples: usize) -> Self {
        Self {
            n_samples,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_noise_std(mut self, noise_std: f64) -> Self {
        self.noise_std = noise_std;
        self
    }

    pub fn with_missing_rate(mut self, rate: f64) -> Self {
        self.missing_rate = rate;
        self
    }

    /// Generate the dataset. Identical settings give identical frames.
    pub fn generate(&self) -> Result<DataFrame> {
        if self.n_samples == 0 {
            return Err(AutoMlError::ConfigError("n_samples must be at least 1".to_string()));
        }
        if !(0.0..1.0).contains(&self.missing_rate) {
            return Err(AutoMlError::ConfigError(format!(
                "missing_rate must be in [0, 1), got {}",
                self.missing_rate
            )));
        }
        if !(self.noise_std.is_finite() && self.noise_std >= 0.0) {
            return Err(AutoMlError::ConfigError(format!(
                "noise_std must be finite and non-negative, got {}",
                self.noise_std
            )));
        }
        let noise = Normal::new(0.0, self.noise_std)
            .map_err(|e| AutoMlError::ConfigError(format!("invalid noise_std: {}", e)))?;

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let n = self.n_samples;

        let mut square_feet = Vec::with_capacity(n);
        let mut bedrooms = Vec::with_capacity(n);
        let mut bathrooms = Vec::with_capacity(n);
        let mut location = Vec::with_capacity(n);
        let mut age = Vec::with_capacity(n);
        let mut price = Vec::with_capacity(n);

        for _ in 0..n {
            let sqft: i64 = rng.gen_range(500..5000);
            let beds: i64 = rng.gen_range(1..6);
            let baths: i64 = rng.gen_range(1..4);
            let (loc, multiplier) = LOCATIONS[rng.gen_range(0..LOCATIONS.len())];
            let years: i64 = rng.gen_range(0..50);

            let base = 50_000.0
                + 200.0 * sqft as f64
                + 15_000.0 * beds as f64
                + 10_000.0 * baths as f64
                - 500.0 * years as f64
                + noise.sample(&mut rng);

            square_feet.push(sqft);
            bedrooms.push(beds);
            bathrooms.push(baths);
            location.push(loc);
            age.push(years);
            price.push(base * multiplier);
        }

        let columns = vec![
            Column::new("SquareFeet".into(), self.with_missing(&mut rng, square_feet)),
            Column::new("Bedrooms".into(), self.with_missing(&mut rng, bedrooms)),
            Column::new("Bathrooms".into(), self.with_missing(&mut rng, bathrooms)),
            Column::new("Location".into(), self.with_missing(&mut rng, location)),
            Column::new("Age".into(), self.with_missing(&mut rng, age)),
            Column::new("Price".into(), price),
        ];

        let df = DataFrame::new(columns)?;
        debug!(rows = df.height(), missing_rate = self.missing_rate, "Generated housing data");
        Ok(df)
    }

    fn with_missing<T>(&self, rng: &mut ChaCha8Rng, values: Vec<T>) -> Vec<Option<T>> {
        if self.missing_rate == 0.0 {
            return values.into_iter().map(Some).collect();
        }
        values
            .into_iter()
            .map(|v| if rng.gen_bool(self.missing_rate) { None } else { Some(v) })
            .collect()
    }
}
