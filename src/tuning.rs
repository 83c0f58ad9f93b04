//! Grid search over cross-validation folds.
//!
//! Each (combination, fold) pair is an independent task: the recipe is
//! prepped on the fold's analysis rows only, the model is trained, and the
//! assessment rows are scored by accuracy. Tasks run on the rayon pool and
//! are collected in grid-then-fold order before any aggregation.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::config::{GridConfig, Hyperparams};
use crate::data_handling::Dataset;
use crate::error::{PipelineError, Result};
use crate::evaluate::evaluate;
use crate::splitting::Fold;
use crate::stats::{mean_sd, std_err};
use crate::workflow::Workflow;

/// Closed range a tunable parameter is drawn from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
    /// Space values evenly in log10 rather than linearly.
    pub log10: bool,
}

impl ParamRange {
    pub const HIDDEN_UNITS: ParamRange = ParamRange {
        min: 1.0,
        max: 10.0,
        log10: false,
    };
    pub const EPOCHS: ParamRange = ParamRange {
        min: 10.0,
        max: 1000.0,
        log10: false,
    };
    pub const PENALTY: ParamRange = ParamRange {
        min: -10.0,
        max: 0.0,
        log10: true,
    };

    /// `levels` evenly spaced values from `min` to `max`.
    pub fn values(&self, levels: usize) -> Vec<f64> {
        let raw: Vec<f64> = match levels {
            0 => Vec::new(),
            1 => vec![self.min],
            _ => (0..levels)
                .map(|i| self.min + (self.max - self.min) * i as f64 / (levels - 1) as f64)
                .collect(),
        };
        if self.log10 {
            raw.into_iter().map(|v| 10f64.powf(v)).collect()
        } else {
            raw
        }
    }
}

/// Candidate values for each tunable parameter.
///
/// Combinations enumerate hidden units outermost, then epochs, then penalty.
#[derive(Debug, Clone, PartialEq)]
pub struct HyperGrid {
    pub hidden_units: Vec<usize>,
    pub epochs: Vec<usize>,
    pub penalty: Vec<f64>,
}

impl HyperGrid {
    /// Regular grid over the default ranges. Integer parameters are rounded
    /// and deduplicated, so small ranges may yield fewer than `levels` values.
    pub fn regular(levels: usize) -> Result<Self> {
        if levels == 0 {
            return Err(PipelineError::Config(
                "a regular grid needs at least one level".to_string(),
            ));
        }
        let ints = |range: ParamRange| {
            let mut v: Vec<usize> = range
                .values(levels)
                .into_iter()
                .map(|x| x.round() as usize)
                .collect();
            v.dedup();
            v
        };
        Ok(HyperGrid {
            hidden_units: ints(ParamRange::HIDDEN_UNITS),
            epochs: ints(ParamRange::EPOCHS),
            penalty: ParamRange::PENALTY.values(levels),
        })
    }

    pub fn from_config(config: &GridConfig) -> Result<Self> {
        match config {
            GridConfig::Explicit {
                hidden_units,
                epochs,
                penalty,
            } => Ok(HyperGrid {
                hidden_units: hidden_units.clone(),
                epochs: epochs.clone(),
                penalty: penalty.clone(),
            }),
            GridConfig::Regular { levels } => HyperGrid::regular(*levels),
        }
    }

    pub fn combinations(&self) -> Vec<Hyperparams> {
        let mut out = Vec::with_capacity(self.hidden_units.len() * self.epochs.len() * self.penalty.len());
        for &hidden_units in &self.hidden_units {
            for &epochs in &self.epochs {
                for &penalty in &self.penalty {
                    out.push(Hyperparams {
                        hidden_units,
                        epochs,
                        penalty,
                    });
                }
            }
        }
        out
    }
}

/// Shared flag for stopping a long grid search early. Tasks that have not
/// started when the flag is raised fail with `Cancelled`.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Accuracy of one combination on one fold.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldMetric {
    /// Index of the combination in the grid.
    pub config: usize,
    pub params: Hyperparams,
    pub fold: usize,
    pub accuracy: f64,
}

/// Fold-averaged accuracy of one combination.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSummary {
    pub config: usize,
    pub params: Hyperparams,
    pub mean: f64,
    pub std_err: f64,
    pub n: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TuneResult {
    pub grid: Vec<Hyperparams>,
    /// Per-fold metrics in grid-then-fold order.
    pub metrics: Vec<FoldMetric>,
}

impl TuneResult {
    /// Mean accuracy and standard error per combination, in grid order.
    pub fn collect_metrics(&self) -> Vec<MetricSummary> {
        self.grid
            .iter()
            .enumerate()
            .map(|(config, params)| {
                let values: Vec<f64> = self
                    .metrics
                    .iter()
                    .filter(|m| m.config == config)
                    .map(|m| m.accuracy)
                    .collect();
                let mean = mean_sd(&values).map(|(m, _)| m).unwrap_or(f64::NAN);
                MetricSummary {
                    config,
                    params: *params,
                    mean,
                    std_err: std_err(&values),
                    n: values.len(),
                }
            })
            .collect()
    }

    /// The `n` best combinations by mean accuracy; equal means keep grid order.
    pub fn show_best(&self, n: usize) -> Vec<MetricSummary> {
        let mut summary = self.collect_metrics();
        summary.sort_by(|a, b| {
            b.mean
                .partial_cmp(&a.mean)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        summary.truncate(n);
        summary
    }

    /// Combination with the highest mean accuracy. Ties go to the
    /// combination enumerated first.
    pub fn select_best(&self) -> Result<Hyperparams> {
        let mut best: Option<MetricSummary> = None;
        for summary in self.collect_metrics() {
            if !summary.mean.is_finite() {
                continue;
            }
            match &best {
                Some(b) if summary.mean <= b.mean => {}
                _ => best = Some(summary),
            }
        }
        best.map(|b| b.params).ok_or_else(|| {
            PipelineError::InsufficientData("no tuning results to select from".to_string())
        })
    }
}

/// Evaluate every grid combination on every fold of `train`.
///
/// For each (combination, fold) pair the recipe is prepped on the fold's
/// analysis rows, the model is trained on the baked analysis rows and
/// accuracy is measured on the assessment rows. Pairs run in parallel.
///
/// # Arguments
///
/// * `workflow` - Recipe and base model spec; grid values replace its hyperparameters
/// * `train` - The training partition the folds index into
/// * `folds` - Resampling folds from [`crate::splitting::vfold_cv`]
/// * `grid` - Hyperparameter combinations, validated before any training
/// * `cancel` - Optional token checked before each fold fit
///
/// # Returns
///
/// A [`TuneResult`] holding one [`FoldMetric`] per (combination, fold), ordered
/// by combination then fold. The first failing fit aborts the whole search.
pub fn tune_grid(
    workflow: &Workflow,
    train: &Dataset,
    folds: &[Fold],
    grid: &[Hyperparams],
    cancel: Option<&CancelToken>,
) -> Result<TuneResult> {
    if grid.is_empty() {
        return Err(PipelineError::Config("tuning grid is empty".to_string()));
    }
    if folds.is_empty() {
        return Err(PipelineError::Config("no resampling folds given".to_string()));
    }
    for params in grid {
        params.validate()?;
    }

    let tasks: Vec<(usize, &Fold)> = (0..grid.len())
        .flat_map(|config| folds.iter().map(move |fold| (config, fold)))
        .collect();
    log::info!(
        "Tuning {} combinations over {} folds ({} fits)",
        grid.len(),
        folds.len(),
        tasks.len()
    );

    let metrics = tasks
        .par_iter()
        .map(|&(config, fold)| {
            if cancel.map_or(false, CancelToken::is_cancelled) {
                return Err(PipelineError::Cancelled);
            }
            let params = grid[config];
            let accuracy = fit_resample(workflow, train, fold, &params)?;
            log::debug!(
                "config {} {:?} fold {}: accuracy {:.4}",
                config,
                params,
                fold.id,
                accuracy
            );
            Ok(FoldMetric {
                config,
                params,
                fold: fold.id,
                accuracy,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let result = TuneResult {
        grid: grid.to_vec(),
        metrics,
    };
    if let Some(best) = result.show_best(1).first() {
        log::info!(
            "Best combination: {:?} with mean accuracy {:.4} (se {:.4})",
            best.params,
            best.mean,
            best.std_err
        );
    }
    Ok(result)
}

/// Train on the analysis rows of `fold` and return assessment accuracy.
fn fit_resample(workflow: &Workflow, train: &Dataset, fold: &Fold, params: &Hyperparams) -> Result<f64> {
    let analysis = train.select_rows(&fold.analysis);
    let assessment = train.select_rows(&fold.assessment);
    let fitted = finalize_workflow(workflow, params).fit(&analysis)?;
    Ok(evaluate(&fitted, &assessment, workflow.outcome())?.accuracy)
}

/// Workflow whose model spec carries `best` instead of its current values.
pub fn finalize_workflow(workflow: &Workflow, best: &Hyperparams) -> Workflow {
    Workflow {
        recipe: workflow.recipe.clone(),
        spec: workflow.spec.with_hyperparams(best),
    }
}
