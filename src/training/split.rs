//! Train / held-out row partitioning

use crate::error::{AutoMlError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Row indices of one train / held-out partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainTestSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

impl TrainTestSplit {
    pub fn n_train(&self) -> usize {
        self.train_indices.len()
    }

    pub fn n_test(&self) -> usize {
        self.test_indices.len()
    }
}

/// Partition `n_rows` row indices into train and held-out sets.
///
/// The held-out count is `ceil(test_size * n_rows)` clamped to
/// `[1, n_rows - 1]`, so both sides are non-empty. With `shuffle`, indices
/// are permuted by a ChaCha8 stream seeded with `seed` and the first
/// held-out-count of them are held out; otherwise the last rows are held out.
/// Identical arguments always give the identical split.
pub fn train_test_split(
    n_rows: usize,
    test_size: f64,
    shuffle: bool,
    seed: u64,
) -> Result<TrainTestSplit> {
    if n_rows < 2 {
        return Err(AutoMlError::InvalidTarget(format!(
            "need at least 2 rows to hold out a scoring set, got {}",
            n_rows
        )));
    }
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(AutoMlError::ConfigError(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }

    let n_test = ((test_size * n_rows as f64).ceil() as usize).clamp(1, n_rows - 1);

    let mut indices: Vec<usize> = (0..n_rows).collect();
    let (test_indices, train_indices) = if shuffle {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        indices.shuffle(&mut rng);
        let train = indices.split_off(n_test);
        (indices, train)
    } else {
        let test = indices.split_off(n_rows - n_test);
        (test, indices)
    };

    Ok(TrainTestSplit {
        train_indices,
        test_indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_split_sizes() {
        let split = train_test_split(100, 0.2, true, 42).unwrap();
        assert_eq!(split.n_test(), 20);
        assert_eq!(split.n_train(), 80);

        // ceil(0.2 * 3) = 1
        let split = train_test_split(3, 0.2, true, 42).unwrap();
        assert_eq!(split.n_test(), 1);
        assert_eq!(split.n_train(), 2);

        // ceil(0.25 * 10) = 3
        let split = train_test_split(10, 0.25, true, 42).unwrap();
        assert_eq!(split.n_test(), 3);
    }

    #[test]
    fn test_split_covers_every_row_once() {
        let split = train_test_split(57, 0.3, true, 7).unwrap();
        let all: HashSet<usize> = split
            .train_indices
            .iter()
            .chain(split.test_indices.iter())
            .copied()
            .collect();
        assert_eq!(all.len(), 57);
        assert_eq!(split.n_train() + split.n_test(), 57);
    }

    #[test]
    fn test_split_determinism() {
        let a = train_test_split(50, 0.2, true, 42).unwrap();
        let b = train_test_split(50, 0.2, true, 42).unwrap();
        assert_eq!(a, b);

        let c = train_test_split(50, 0.2, true, 43).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_unshuffled_holds_out_tail() {
        let split = train_test_split(5, 0.4, false, 0).unwrap();
        assert_eq!(split.train_indices, vec![0, 1, 2]);
        assert_eq!(split.test_indices, vec![3, 4]);
    }

    #[test]
    fn test_clamped_to_leave_training_rows() {
        let split = train_test_split(2, 0.9, true, 1).unwrap();
        assert_eq!(split.n_test(), 1);
        assert_eq!(split.n_train(), 1);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(train_test_split(1, 0.2, true, 0), Err(AutoMlError::InvalidTarget(_))));
        assert!(matches!(train_test_split(0, 0.2, true, 0), Err(AutoMlError::InvalidTarget(_))));
        assert!(matches!(train_test_split(10, 1.5, true, 0), Err(AutoMlError::ConfigError(_))));
    }
}
