use crate::error::Result;
use crate::math::Array2;

/// Uniform fit/predict contract for multi-class classifiers.
///
/// Labels are class indices in `0..n_classes`; the caller owns the mapping
/// from indices to level names.
pub trait ClassifierModel: Send + Sync {
    /// Fit the model on rows of `x` with class indices `y`.
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<()>;

    /// Class probabilities, shape (n_samples, n_classes); each row sums to 1.
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>>;

    /// Most probable class per row; ties go to the lower class index.
    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .rows()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .fold(0usize, |best, (i, &p)| if p > row[best] { i } else { best })
            })
            .collect())
    }

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}

impl std::fmt::Debug for dyn ClassifierModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierModel")
            .field("name", &self.name())
            .finish()
    }
}
