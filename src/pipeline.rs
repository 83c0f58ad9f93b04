//! End-to-end run: load, split, resample, tune, finalize, evaluate.
use std::path::Path;

use crate::config::{Hyperparams, PipelineConfig};
use crate::data_handling::Dataset;
use crate::error::Result;
use crate::evaluate::{last_fit, LastFit};
use crate::io::read_survey_csv;
use crate::preprocessing::Recipe;
use crate::splitting::{initial_split, vfold_cv};
use crate::tuning::{finalize_workflow, tune_grid, CancelToken, HyperGrid, TuneResult};
use crate::workflow::Workflow;

#[derive(Debug)]
pub struct PipelineReport {
    pub best: Hyperparams,
    pub tuning: TuneResult,
    pub last_fit: LastFit,
}

impl PipelineReport {
    pub fn test_accuracy(&self) -> f64 {
        self.last_fit.evaluation.accuracy
    }
}

/// Read the survey file at `path` and run every stage on it.
pub fn run_pipeline<P: AsRef<Path>>(path: P, config: &PipelineConfig) -> Result<PipelineReport> {
    let dataset = read_survey_csv(path, &config.data)?;
    run_pipeline_on(&dataset, config, None)
}

/// Run split → folds → tune → finalize → last fit on an already loaded dataset.
pub fn run_pipeline_on(
    dataset: &Dataset,
    config: &PipelineConfig,
    cancel: Option<&CancelToken>,
) -> Result<PipelineReport> {
    let outcome = config.data.label_name.as_str();
    dataset.log_summary(outcome);

    let split = initial_split(dataset, config.split.prop, outcome, config.split.seed)?;
    let folds = vfold_cv(&split.train, config.tuning.folds, outcome, config.tuning.seed)?;

    let workflow = Workflow::new(Recipe::new(outcome), config.model.clone());
    let grid = HyperGrid::from_config(&config.tuning.grid)?.combinations();
    let tuning = tune_grid(&workflow, &split.train, &folds, &grid, cancel)?;

    let best = tuning.select_best()?;
    log::info!(
        "Finalizing with hidden_units={}, epochs={}, penalty={:e}",
        best.hidden_units,
        best.epochs,
        best.penalty
    );
    let final_workflow = finalize_workflow(&workflow, &best);
    let last_fit = last_fit(&final_workflow, &split, outcome)?;

    Ok(PipelineReport {
        best,
        tuning,
        last_fit,
    })
}
