//! Accuracy metric and held-out evaluation of fitted workflows.
use crate::data_handling::Dataset;
use crate::error::{PipelineError, Result};
use crate::splitting::Split;
use crate::workflow::{FittedWorkflow, Workflow};

/// Accuracy plus the predictions it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub accuracy: f64,
    pub predictions: Vec<String>,
}

/// Result of fitting on the training set and scoring the test set.
#[derive(Debug)]
pub struct LastFit {
    pub fitted: FittedWorkflow,
    pub evaluation: Evaluation,
}

/// Fraction of positions where `estimate` equals `truth`.
pub fn accuracy<T: PartialEq>(truth: &[T], estimate: &[T]) -> Result<f64> {
    if truth.len() != estimate.len() {
        return Err(PipelineError::Schema(format!(
            "truth has {} values but estimate has {}",
            truth.len(),
            estimate.len()
        )));
    }
    if truth.is_empty() {
        return Err(PipelineError::InsufficientData(
            "accuracy of zero predictions is undefined".to_string(),
        ));
    }
    let correct = truth.iter().zip(estimate).filter(|(t, e)| t == e).count();
    Ok(correct as f64 / truth.len() as f64)
}

/// Predict every row of `data` with `fitted` and score against the column
/// named by `truth`.
///
/// The truth field is resolved against `data` at call time, so any
/// categorical column can serve as ground truth.
pub fn evaluate(fitted: &FittedWorkflow, data: &Dataset, truth: impl AsRef<str>) -> Result<Evaluation> {
    let truth = data.labels(truth.as_ref())?;
    let predictions = fitted.predict(data)?;
    let accuracy = accuracy(truth, predictions.as_slice())?;
    Ok(Evaluation {
        accuracy,
        predictions,
    })
}

/// Fit `workflow` on the training part of `split` and evaluate it on the
/// test part.
pub fn last_fit(workflow: &Workflow, split: &Split, truth: impl AsRef<str>) -> Result<LastFit> {
    let fitted = workflow.fit(&split.train)?;
    let evaluation = evaluate(&fitted, &split.test, truth)?;
    log::info!(
        "Test accuracy: {:.4} on {} rows",
        evaluation.accuracy,
        split.test.nrows()
    );
    Ok(LastFit { fitted, evaluation })
}
