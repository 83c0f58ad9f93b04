//! Integration tests for cross-validated grid search.

mod common;

use segment_classifiers::config::{GridConfig, Hyperparams, ModelSpec};
use segment_classifiers::data_handling::Dataset;
use segment_classifiers::evaluate::evaluate;
use segment_classifiers::preprocessing::Recipe;
use segment_classifiers::splitting::{initial_split, vfold_cv, Fold};
use segment_classifiers::stats::mean_sd;
use segment_classifiers::tuning::{finalize_workflow, tune_grid, CancelToken, HyperGrid};
use segment_classifiers::workflow::Workflow;
use segment_classifiers::PipelineError;

fn setup() -> (Workflow, Dataset, Vec<Fold>) {
    let data = common::standard_survey();
    let split = initial_split(&data, 0.75, "segment", 42).unwrap();
    let folds = vfold_cv(&split.train, 3, "segment", 42).unwrap();
    let workflow = Workflow::new(Recipe::new("segment"), ModelSpec::default());
    (workflow, split.train, folds)
}

fn small_grid() -> Vec<Hyperparams> {
    HyperGrid {
        hidden_units: vec![2, 4],
        epochs: vec![60],
        penalty: vec![0.0, 0.1],
    }
    .combinations()
}

// ---------------------------------------------------------------------------
// tune_grid
// ---------------------------------------------------------------------------

#[test]
fn metrics_cover_every_combination_and_fold() {
    let (workflow, train, folds) = setup();
    let grid = small_grid();
    let result = tune_grid(&workflow, &train, &folds, &grid, None).unwrap();

    assert_eq!(result.grid, grid);
    assert_eq!(result.metrics.len(), grid.len() * folds.len());
    for (i, m) in result.metrics.iter().enumerate() {
        assert_eq!(m.config, i / folds.len());
        assert_eq!(m.fold, i % folds.len());
        assert_eq!(m.params, grid[m.config]);
        assert!((0.0..=1.0).contains(&m.accuracy), "accuracy {}", m.accuracy);
    }

    let summary = result.collect_metrics();
    assert_eq!(summary.len(), grid.len());
    assert!(summary.iter().all(|s| s.n == folds.len()));
}

#[test]
fn selected_combination_has_highest_mean() {
    let (workflow, train, folds) = setup();
    let grid = small_grid();
    let result = tune_grid(&workflow, &train, &folds, &grid, None).unwrap();

    let best = result.select_best().unwrap();
    let summary = result.collect_metrics();
    let best_mean = summary.iter().find(|s| s.params == best).unwrap().mean;
    assert!(summary.iter().all(|s| s.mean <= best_mean));
    assert_eq!(result.show_best(1)[0].params, best);
}

#[test]
fn tuning_is_deterministic() {
    let (workflow, train, folds) = setup();
    let grid = small_grid();
    let a = tune_grid(&workflow, &train, &folds, &grid, None).unwrap();
    let b = tune_grid(&workflow, &train, &folds, &grid, None).unwrap();
    assert_eq!(a, b);
}

#[test]
fn cancelled_search_stops() {
    let (workflow, train, folds) = setup();
    let token = CancelToken::new();
    token.cancel();
    let err = tune_grid(&workflow, &train, &folds, &small_grid(), Some(&token)).unwrap_err();
    assert!(matches!(err, PipelineError::Cancelled), "got {:?}", err);
}

#[test]
fn invalid_combination_is_rejected_before_training() {
    let (workflow, train, folds) = setup();
    let grid = vec![
        Hyperparams {
            hidden_units: 3,
            epochs: 10,
            penalty: 0.0,
        },
        Hyperparams {
            hidden_units: 0,
            epochs: 10,
            penalty: 0.0,
        },
    ];
    let err = tune_grid(&workflow, &train, &folds, &grid, None).unwrap_err();
    match err {
        PipelineError::InvalidHyperparameter { name, .. } => assert_eq!(name, "hidden_units"),
        other => panic!("expected invalid hyperparameter, got {:?}", other),
    }
}

#[test]
fn empty_grid_or_folds_is_config_error() {
    let (workflow, train, folds) = setup();
    let err = tune_grid(&workflow, &train, &folds, &[], None).unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)), "got {:?}", err);
    let err = tune_grid(&workflow, &train, &[], &small_grid(), None).unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)), "got {:?}", err);
}

// ---------------------------------------------------------------------------
// grids and finalization
// ---------------------------------------------------------------------------

#[test]
fn explicit_grid_from_config() {
    let grid = HyperGrid::from_config(&GridConfig::Explicit {
        hidden_units: vec![3],
        epochs: vec![20, 40],
        penalty: vec![0.01],
    })
    .unwrap();
    let combos = grid.combinations();
    assert_eq!(combos.len(), 2);
    assert_eq!(combos[1].epochs, 40);
}

#[test]
fn regular_grid_rejects_zero_levels() {
    let err = HyperGrid::from_config(&GridConfig::Regular { levels: 0 }).unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)), "got {:?}", err);
}

#[test]
fn finalize_injects_selected_values() {
    let (workflow, _, _) = setup();
    let best = Hyperparams {
        hidden_units: 7,
        epochs: 33,
        penalty: 0.25,
    };
    let finalized = finalize_workflow(&workflow, &best);
    assert_eq!(finalized.spec.hyperparams(), best);
    assert_eq!(finalized.spec.learning_rate, workflow.spec.learning_rate);
    assert_eq!(finalized.recipe, workflow.recipe);
}

// ---------------------------------------------------------------------------
// per-fold preprocessing
// ---------------------------------------------------------------------------

#[test]
fn fold_metric_matches_fit_on_analysis_rows_only() {
    let (workflow, train, folds) = setup();
    let grid = small_grid();
    let result = tune_grid(&workflow, &train, &folds, &grid, None).unwrap();

    let config = 1;
    let fold = &folds[2];
    let metric = result
        .metrics
        .iter()
        .find(|m| m.config == config && m.fold == fold.id)
        .unwrap();

    let analysis = train.select_rows(&fold.analysis);
    let assessment = train.select_rows(&fold.assessment);
    let fitted = finalize_workflow(&workflow, &grid[config])
        .fit(&analysis)
        .unwrap();
    let rebuilt = evaluate(&fitted, &assessment, "segment").unwrap();
    assert_eq!(rebuilt.accuracy, metric.accuracy);

    // normalization parameters come from the analysis rows, not all of train
    let stats = &fitted.recipe().column_stats()[0];
    assert_eq!(stats.name, "age");
    let (analysis_mean, analysis_sd) =
        mean_sd(analysis.column("age").unwrap().as_numeric().unwrap()).unwrap();
    let (train_mean, _) = mean_sd(train.column("age").unwrap().as_numeric().unwrap()).unwrap();
    assert!((stats.mean - analysis_mean).abs() < 1e-12);
    assert!((stats.sd - analysis_sd).abs() < 1e-12);
    assert!((stats.mean - train_mean).abs() > 1e-9);
}
