//! Stratified train/test splits and k-fold resampling.
//!
//! Both operations take an explicit seed; given the same seed and the same
//! row order they always produce the same partition.
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::data_handling::Dataset;
use crate::error::{PipelineError, Result};
use crate::stats::largest_remainder;

/// Training/test partition of a dataset.
#[derive(Debug, Clone)]
pub struct Split {
    pub train: Dataset,
    pub test: Dataset,
    /// Row indices into the source dataset, ascending.
    pub train_rows: Vec<usize>,
    pub test_rows: Vec<usize>,
}

/// One cross-validation fold: fit on `analysis`, score on `assessment`.
#[derive(Debug, Clone, PartialEq)]
pub struct Fold {
    pub id: usize,
    pub analysis: Vec<usize>,
    pub assessment: Vec<usize>,
}

/// Stratified random split keeping roughly `prop` of every `strata` class in
/// the training set.
///
/// Per-class sizes come from [`largest_remainder`], so the training set has
/// `round(prop * n)` rows and each class is within one row of its share.
///
/// # Arguments
///
/// * `dataset` - The full dataset
/// * `prop` - Training proportion, strictly between 0 and 1
/// * `strata` - Categorical column to stratify on
/// * `seed` - Seed for the per-class shuffles
///
/// # Returns
///
/// A [`Split`] with the train and test datasets and the original row
/// indices of each, sorted ascending. Together they cover every row once.
pub fn initial_split(dataset: &Dataset, prop: f64, strata: &str, seed: u64) -> Result<Split> {
    if !(prop > 0.0 && prop < 1.0) {
        return Err(PipelineError::Config(format!(
            "split proportion must be in (0, 1), got {}",
            prop
        )));
    }
    let groups = strata_groups(dataset, strata)?;
    if dataset.is_empty() {
        return Err(PipelineError::InsufficientData(
            "cannot split an empty dataset".to_string(),
        ));
    }

    let sizes: Vec<usize> = groups.iter().map(|(_, rows)| rows.len()).collect();
    let n_train = largest_remainder(&sizes, prop);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train_rows = Vec::new();
    let mut test_rows = Vec::new();
    for ((label, mut rows), take) in groups.into_iter().zip(n_train) {
        rows.shuffle(&mut rng);
        log::debug!(
            "Stratum '{}': {} of {} rows to training",
            label,
            take,
            rows.len()
        );
        train_rows.extend_from_slice(&rows[..take]);
        test_rows.extend_from_slice(&rows[take..]);
    }
    train_rows.sort_unstable();
    test_rows.sort_unstable();

    log::info!(
        "Split {} rows into {} training and {} test rows (prop = {})",
        dataset.nrows(),
        train_rows.len(),
        test_rows.len(),
        prop
    );

    Ok(Split {
        train: dataset.select_rows(&train_rows),
        test: dataset.select_rows(&test_rows),
        train_rows,
        test_rows,
    })
}

/// Stratified v-fold cross-validation.
///
/// Rows of each class are shuffled and dealt round-robin across the folds;
/// the dealing position carries over from one class to the next so fold
/// sizes differ by at most one. Every class needs at least `k` rows.
pub fn vfold_cv(dataset: &Dataset, k: usize, strata: &str, seed: u64) -> Result<Vec<Fold>> {
    if k < 2 {
        return Err(PipelineError::Config(format!(
            "cross-validation needs at least 2 folds, got {}",
            k
        )));
    }
    let groups = strata_groups(dataset, strata)?;
    if dataset.nrows() < k {
        return Err(PipelineError::InsufficientData(format!(
            "{} rows cannot be divided into {} folds",
            dataset.nrows(),
            k
        )));
    }
    if let Some((label, rows)) = groups.iter().find(|(_, rows)| rows.len() < k) {
        return Err(PipelineError::InsufficientData(format!(
            "class '{}' has {} rows, fewer than the {} folds needed to stratify",
            label,
            rows.len(),
            k
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut assignment = vec![0usize; dataset.nrows()];
    let mut next = 0usize;
    for (_, mut rows) in groups {
        rows.shuffle(&mut rng);
        for row in rows {
            assignment[row] = next % k;
            next += 1;
        }
    }

    let folds = (0..k)
        .map(|id| {
            let (assessment, analysis): (Vec<usize>, Vec<usize>) =
                (0..dataset.nrows()).partition(|&row| assignment[row] == id);
            Fold {
                id,
                analysis,
                assessment,
            }
        })
        .collect::<Vec<_>>();

    log::debug!(
        "Created {} stratified folds, assessment sizes {:?}",
        k,
        folds.iter().map(|f| f.assessment.len()).collect::<Vec<_>>()
    );
    Ok(folds)
}

fn strata_groups(dataset: &Dataset, strata: &str) -> Result<Vec<(String, Vec<usize>)>> {
    if dataset.column(strata).is_none() {
        return Err(PipelineError::Config(format!(
            "stratification field '{}' is not in the dataset",
            strata
        )));
    }
    dataset.group_indices(strata)
}
