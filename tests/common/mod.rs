//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use segment_classifiers::data_handling::{Column, Dataset};

pub const SEGMENTS: [&str; 3] = ["own", "shopping", "considering"];
pub const CODES: [i64; 3] = [1, 3, 4];

/// Segment of row `i`: own / shopping / considering in turn, so 100 rows
/// give 34 / 33 / 33.
pub fn segment_of(i: usize) -> usize {
    i % 3
}

/// Projected survey with `n` rows: five numeric predictors whose means
/// depend on the segment, a two-level `gender` and a constant `region`.
pub fn survey(n: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut age = Vec::with_capacity(n);
    let mut income = Vec::with_capacity(n);
    let mut affinity = Vec::with_capacity(n);
    let mut price = Vec::with_capacity(n);
    let mut visits = Vec::with_capacity(n);
    let mut gender = Vec::with_capacity(n);
    let mut region = Vec::with_capacity(n);
    let mut segment = Vec::with_capacity(n);

    for i in 0..n {
        let s = segment_of(i);
        let shift = [3.0, 0.0, -3.0][s];
        age.push(40.0 + 4.0 * shift + rng.gen_range(-2.0..2.0));
        income.push(50.0 + 5.0 * shift + rng.gen_range(-3.0..3.0));
        affinity.push(shift + rng.gen_range(-0.5..0.5));
        price.push(-shift + rng.gen_range(-0.5..0.5));
        visits.push(rng.gen_range(0..8) as f64);
        gender.push(if rng.gen_bool(0.5) { "female" } else { "male" }.to_string());
        region.push("north".to_string());
        segment.push(SEGMENTS[s].to_string());
    }

    Dataset::new(vec![
        Column::numeric("age", age),
        Column::numeric("income", income),
        Column::numeric("brand_affinity", affinity),
        Column::numeric("price_sensitivity", price),
        Column::numeric("visits", visits),
        Column::categorical("gender", gender),
        Column::categorical("region", region),
        Column::categorical("segment", segment),
    ])
    .unwrap()
}

/// The 100-row survey used throughout the tests.
pub fn standard_survey() -> Dataset {
    survey(100, 42)
}

/// Raw survey text in the on-disk layout: an `id` column, the integer
/// `status` code and the predictors in a shuffled column order.
pub fn survey_csv(n: usize) -> String {
    let mut out = String::from(
        "id,region,status,age,gender,income,brand_affinity,price_sensitivity,visits,notes\n",
    );
    for i in 0..n {
        let s = segment_of(i);
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},free text\n",
            i,
            ["north", "south"][i % 2],
            CODES[s],
            30 + i % 40,
            ["female", "male"][(i / 2) % 2],
            40.0 + i as f64 * 0.5,
            1.0 + s as f64,
            5.0 - s as f64,
            i % 7,
        ));
    }
    out
}

/// Count of rows of `data` labelled `label` in `field`.
pub fn count_label(data: &Dataset, field: &str, label: &str) -> usize {
    data.labels(field)
        .unwrap()
        .iter()
        .filter(|l| l.as_str() == label)
        .count()
}
