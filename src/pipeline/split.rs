//! Train/test partitioning and k-fold index generation

use anyhow::Result;
use faer::Mat;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::error::PipelineError;

/// Default holdout share
pub const DEFAULT_TEST_RATIO: f64 = 0.2;

/// Default shuffle seed
pub const DEFAULT_SEED: u64 = 42;

/// Result of a train/test split
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: Mat<f64>,
    pub x_test: Mat<f64>,
    pub y_train: Vec<u8>,
    pub y_test: Vec<u8>,
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Shuffle row indices with a seeded RNG and cut off `ceil(ratio * n)` rows
/// for the test partition.
pub fn split_indices(n_samples: usize, test_ratio: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        anyhow::bail!(PipelineError::InvalidSplit(format!(
            "test ratio must be between 0 and 1 (exclusive), got {}",
            test_ratio
        )));
    }

    let n_test = (n_samples as f64 * test_ratio).ceil() as usize;
    let n_train = n_samples.saturating_sub(n_test);
    if n_test == 0 || n_train == 0 {
        anyhow::bail!(PipelineError::InvalidSplit(format!(
            "{} samples with test ratio {} leaves an empty partition (train={}, test={})",
            n_samples, test_ratio, n_train, n_test
        )));
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test = indices[..n_test].to_vec();
    let train = indices[n_test..].to_vec();
    Ok((train, test))
}

/// Split X and y into training and holdout partitions
pub fn train_test_split(x: &Mat<f64>, y: &[u8], test_ratio: f64, seed: u64) -> Result<TrainTestSplit> {
    if x.nrows() != y.len() {
        anyhow::bail!(PipelineError::DimensionMismatch {
            expected: x.nrows(),
            actual: y.len(),
        });
    }

    let (train_indices, test_indices) = split_indices(x.nrows(), test_ratio, seed)?;

    Ok(TrainTestSplit {
        x_train: select_rows(x, &train_indices),
        x_test: select_rows(x, &test_indices),
        y_train: select_labels(y, &train_indices),
        y_test: select_labels(y, &test_indices),
        train_indices,
        test_indices,
    })
}

/// Copy the given rows of a matrix, in the given order
pub fn select_rows(x: &Mat<f64>, indices: &[usize]) -> Mat<f64> {
    Mat::from_fn(indices.len(), x.ncols(), |i, j| x[(indices[i], j)])
}

pub fn select_labels(y: &[u8], indices: &[usize]) -> Vec<u8> {
    indices.iter().map(|&i| y[i]).collect()
}

/// K-fold cross-validation splitter (no shuffling).
///
/// The stratified variant keeps the class balance of every test fold close to
/// the overall balance, assigning each class's samples to folds in contiguous
/// blocks in row order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KFold {
    n_splits: usize,
    stratified: bool,
}

impl KFold {
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            stratified: false,
        }
    }

    pub fn stratified(n_splits: usize) -> Self {
        Self {
            n_splits,
            stratified: true,
        }
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Generate (train, test) index pairs for each fold
    pub fn split(&self, y: &[u8]) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
        let n_samples = y.len();
        if self.n_splits < 2 {
            anyhow::bail!(PipelineError::InvalidSplit(format!(
                "at least 2 folds are required, got {}",
                self.n_splits
            )));
        }
        if self.n_splits > n_samples {
            anyhow::bail!(PipelineError::InvalidSplit(format!(
                "cannot make {} folds from {} samples",
                self.n_splits, n_samples
            )));
        }

        let test_folds = if self.stratified {
            self.stratified_assignment(y)?
        } else {
            self.contiguous_assignment(n_samples)
        };

        Ok((0..self.n_splits)
            .map(|fold| {
                let (test, train): (Vec<usize>, Vec<usize>) =
                    (0..n_samples).partition(|&i| test_folds[i] == fold);
                (train, test)
            })
            .collect())
    }

    /// Consecutive folds; the first `n % k` folds get one extra sample
    fn contiguous_assignment(&self, n_samples: usize) -> Vec<usize> {
        let fold_size = n_samples / self.n_splits;
        let remainder = n_samples % self.n_splits;

        let mut assignment = Vec::with_capacity(n_samples);
        for fold in 0..self.n_splits {
            let size = if fold < remainder { fold_size + 1 } else { fold_size };
            assignment.extend(std::iter::repeat(fold).take(size));
        }
        assignment
    }

    fn stratified_assignment(&self, y: &[u8]) -> Result<Vec<usize>> {
        let k = self.n_splits;
        let counts = [
            y.iter().filter(|&&l| l == 0).count(),
            y.iter().filter(|&&l| l == 1).count(),
        ];

        let present: Vec<usize> = counts.iter().copied().filter(|&c| c > 0).collect();
        if present.iter().all(|&c| c < k) {
            anyhow::bail!(PipelineError::InvalidSplit(format!(
                "{} folds is greater than the number of members in each class {:?}",
                k, counts
            )));
        }
        if present.iter().any(|&c| c < k) {
            log::warn!(
                "The least populated class has only {} members, which is less than {} folds",
                present.iter().min().copied().unwrap_or(0),
                k
            );
        }

        // Deal the label-sorted samples round robin to find how many of each
        // class every fold receives.
        let sorted: Vec<u8> = std::iter::repeat(0u8)
            .take(counts[0])
            .chain(std::iter::repeat(1u8).take(counts[1]))
            .collect();
        let mut allocation = vec![[0usize; 2]; k];
        for (pos, &label) in sorted.iter().enumerate() {
            allocation[pos % k][label as usize] += 1;
        }

        let mut assignment = vec![0usize; y.len()];
        for class in 0..2u8 {
            let folds: Vec<usize> = (0..k)
                .flat_map(|fold| std::iter::repeat(fold).take(allocation[fold][class as usize]))
                .collect();
            for (slot, (i, _)) in y
                .iter()
                .enumerate()
                .filter(|(_, &l)| l == class)
                .enumerate()
            {
                assignment[i] = folds[slot];
            }
        }

        Ok(assignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sizes_round_test_up() {
        let (train, test) = split_indices(11, 0.2, 42).unwrap();
        assert_eq!(test.len(), 3);
        assert_eq!(train.len(), 8);
    }

    #[test]
    fn test_invalid_ratio() {
        assert!(split_indices(10, 0.0, 1).is_err());
        assert!(split_indices(10, 1.0, 1).is_err());
        assert!(split_indices(1, 0.5, 1).is_err());
    }

    #[test]
    fn test_contiguous_folds() {
        let y = vec![0u8; 7];
        let folds = KFold::new(3).split(&y).unwrap();
        let test_sizes: Vec<usize> = folds.iter().map(|(_, t)| t.len()).collect();
        assert_eq!(test_sizes, vec![3, 2, 2]);
        assert_eq!(folds[0].1, vec![0, 1, 2]);
    }

    #[test]
    fn test_stratified_folds_keep_class_balance() {
        let y: Vec<u8> = (0..20).map(|i| (i % 2) as u8).collect();
        let folds = KFold::stratified(5).split(&y).unwrap();

        for (train, test) in &folds {
            assert_eq!(test.len(), 4);
            assert_eq!(train.len() + test.len(), 20);
            let positives = test.iter().filter(|&&i| y[i] == 1).count();
            assert_eq!(positives, 2);
        }
    }

    #[test]
    fn test_stratified_rejects_tiny_classes() {
        let y = vec![0u8, 1, 0, 1];
        assert!(KFold::stratified(3).split(&y).is_err());
    }
}
