//! Run the full segment pipeline on a survey CSV.
//!
//! Usage: `cargo run --example segment_pipeline -- [survey.csv] [config.json]`
//!
//! Without a CSV path a synthetic survey is written to the temp directory
//! first. The tuning plot is written next to the input as
//! `tuning_accuracy.html`.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::LevelFilter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use segment_classifiers::config::{load_pipeline_config, GridConfig, PipelineConfig};
use segment_classifiers::pipeline::run_pipeline;
use segment_classifiers::report::plots::plot_tuning_accuracy;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("SEGMENT_LOG", "info"))
        .init();

    let mut args = std::env::args().skip(1);
    let data_path = args.next().map(PathBuf::from);
    let config = match args.next() {
        Some(path) => load_pipeline_config(&path)
            .with_context(|| format!("Failed to load config: {}", path))?,
        None => PipelineConfig {
            tuning: segment_classifiers::config::TuningConfig {
                folds: 5,
                seed: 7,
                grid: GridConfig::Explicit {
                    hidden_units: vec![2, 5, 8],
                    epochs: vec![50, 200],
                    penalty: vec![0.0, 0.01, 0.1],
                },
            },
            ..PipelineConfig::default()
        },
    };

    let data_path = match data_path {
        Some(p) => p,
        None => {
            let p = std::env::temp_dir().join("segment_survey.csv");
            write_synthetic_survey(&p, 300, 2024)?;
            log::info!("Wrote synthetic survey to {}", p.display());
            p
        }
    };

    let report = run_pipeline(&data_path, &config).context("Pipeline failed")?;

    println!("Top combinations by mean CV accuracy:");
    for s in report.tuning.show_best(5) {
        println!(
            "  hidden_units={:>2} epochs={:>4} penalty={:<8.1e} mean={:.4} se={:.4} (n={})",
            s.params.hidden_units, s.params.epochs, s.params.penalty, s.mean, s.std_err, s.n
        );
    }
    println!("Selected: {:?}", report.best);
    println!("Test accuracy: {:.4}", report.test_accuracy());

    let plot = plot_tuning_accuracy(&report.tuning, "Cross-validated accuracy")
        .map_err(anyhow::Error::msg)?;
    let html = data_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("tuning_accuracy.html");
    plot.write_html(&html);
    println!("Tuning plot: {}", html.display());

    Ok(())
}

/// Survey with segment-dependent attitudes, a few demographics and the raw
/// status codes 1 / 3 / 4.
fn write_synthetic_survey(path: &Path, n: usize, seed: u64) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    wtr.write_record([
        "id",
        "status",
        "age",
        "income",
        "brand_affinity",
        "price_sensitivity",
        "visits",
        "gender",
        "region",
    ])?;

    let regions = ["north", "south", "east", "west"];
    for id in 0..n {
        let (code, shift) = match id % 3 {
            0 => (1, 1.5),
            1 => (3, 0.0),
            _ => (4, -1.5),
        };
        let age = 40.0 + 8.0 * shift + rng.gen_range(-12.0..12.0);
        let income = 55.0 + 10.0 * shift + rng.gen_range(-20.0..20.0);
        let affinity = 3.0 + shift + rng.gen_range(-1.0..1.0);
        let price = 3.0 - shift + rng.gen_range(-1.0..1.0);
        let visits: u32 = rng.gen_range(0..10);
        let gender = if rng.gen_bool(0.5) { "female" } else { "male" };
        let region = regions[rng.gen_range(0..regions.len())];
        wtr.write_record([
            id.to_string(),
            code.to_string(),
            format!("{:.1}", age),
            format!("{:.1}", income),
            format!("{:.2}", affinity),
            format!("{:.2}", price),
            visits.to_string(),
            gender.to_string(),
            region.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
