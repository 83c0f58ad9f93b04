use plotly::common::Mode;
use plotly::layout::{Axis, Layout};
use plotly::{Plot, Scatter};

use crate::tuning::TuneResult;

/// Line plot of mean cross-validation accuracy against hidden units, one
/// trace per (epochs, penalty) pair.
///
/// # Arguments
///
/// * `result` - Output of [`crate::tuning::tune_grid`]
/// * `title` - The title of the plot
///
/// # Returns
///
/// The plotly figure, or an error message when `result` holds no metrics.
pub fn plot_tuning_accuracy(result: &TuneResult, title: &str) -> Result<Plot, String> {
    let summary = result.collect_metrics();
    if summary.is_empty() {
        return Err("No tuning results to plot".to_string());
    }

    // group by (epochs, penalty) keeping first-seen order
    let mut series: Vec<((usize, f64), Vec<usize>, Vec<f64>)> = Vec::new();
    for s in &summary {
        let key = (s.params.epochs, s.params.penalty);
        let pos = match series.iter().position(|(k, _, _)| *k == key) {
            Some(pos) => pos,
            None => {
                series.push((key, Vec::new(), Vec::new()));
                series.len() - 1
            }
        };
        series[pos].1.push(s.params.hidden_units);
        series[pos].2.push(s.mean);
    }

    let mut plot = Plot::new();
    for ((epochs, penalty), hidden, mean) in series {
        let label = format!("epochs={}, penalty={:.1e}", epochs, penalty);
        let trace = Scatter::new(hidden, mean)
            .mode(Mode::LinesMarkers)
            .name(label.as_str());
        plot.add_trace(trace);
    }

    let layout = Layout::new()
        .title(title)
        .x_axis(Axis::new().title("Hidden units"))
        .y_axis(Axis::new().title("Mean CV accuracy"));
    plot.set_layout(layout);

    Ok(plot)
}
