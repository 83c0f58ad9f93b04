//! Survey CSV reader.
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::config::LoaderConfig;
use crate::data_handling::{Column, Dataset};
use crate::error::{PipelineError, Result};

/// Read a survey file from disk.
pub fn read_survey_csv<P: AsRef<Path>>(path: P, config: &LoaderConfig) -> Result<Dataset> {
    let file = File::open(&path).map_err(|e| {
        PipelineError::DataAccess(format!(
            "failed to open survey file {}: {}",
            path.as_ref().display(),
            e
        ))
    })?;
    log::info!("Loading survey data from {}", path.as_ref().display());
    read_survey(file, config)
}

/// Read survey rows from any reader, derive the label and project the
/// configured columns (numeric, then categorical, then the label).
pub fn read_survey<R: Read>(reader: R, config: &LoaderConfig) -> Result<Dataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(true)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| PipelineError::DataAccess(format!("failed to read header row: {}", e)))?
        .clone();

    let label_idx = find_column(&headers, &config.label_source)?;
    let numeric_idx = config
        .numeric
        .iter()
        .map(|name| find_column(&headers, name))
        .collect::<Result<Vec<_>>>()?;
    let categorical_idx = config
        .categorical
        .iter()
        .map(|name| find_column(&headers, name))
        .collect::<Result<Vec<_>>>()?;

    let mut numeric: Vec<Vec<f64>> = vec![Vec::new(); numeric_idx.len()];
    let mut categorical: Vec<Vec<String>> = vec![Vec::new(); categorical_idx.len()];
    let mut labels = Vec::new();

    for (row_idx, result) in rdr.records().enumerate() {
        let line = row_idx + 1;
        let record = result
            .map_err(|e| PipelineError::DataAccess(format!("failed to read row {}: {}", line, e)))?;

        labels.push(map_label(field(&record, label_idx, line)?, config, line)?);

        for (slot, &idx) in numeric_idx.iter().enumerate() {
            let raw = field(&record, idx, line)?;
            let value = raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    PipelineError::Schema(format!(
                        "row {}: column '{}' value '{}' is not a finite number",
                        line, config.numeric[slot], raw
                    ))
                })?;
            numeric[slot].push(value);
        }

        for (slot, &idx) in categorical_idx.iter().enumerate() {
            let raw = field(&record, idx, line)?;
            if raw.is_empty() {
                return Err(PipelineError::Schema(format!(
                    "row {}: column '{}' is empty",
                    line, config.categorical[slot]
                )));
            }
            categorical[slot].push(raw.to_string());
        }
    }

    let mut columns = Vec::with_capacity(numeric.len() + categorical.len() + 1);
    for (name, values) in config.numeric.iter().zip(numeric) {
        columns.push(Column::numeric(name.clone(), values));
    }
    for (name, values) in config.categorical.iter().zip(categorical) {
        columns.push(Column::categorical(name.clone(), values));
    }
    columns.push(Column::categorical(config.label_name.clone(), labels));

    let dataset = Dataset::new(columns)?;
    log::debug!(
        "Loaded {} rows with {} projected columns",
        dataset.nrows(),
        dataset.ncols()
    );
    Ok(dataset)
}

fn find_column(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| PipelineError::Schema(format!("missing expected column '{}'", name)))
}

fn field<'a>(record: &'a StringRecord, idx: usize, line: usize) -> Result<&'a str> {
    record
        .get(idx)
        .map(str::trim)
        .ok_or_else(|| PipelineError::Schema(format!("row {} is missing field {}", line, idx + 1)))
}

fn map_label(raw: &str, config: &LoaderConfig, line: usize) -> Result<String> {
    // codes exported as `1.0` are accepted, `1.5` is not
    let code = raw
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64)
        .map(|v| v as i64)
        .ok_or_else(|| {
            PipelineError::Schema(format!(
                "row {}: label '{}' in '{}' is not an integer code",
                line, raw, config.label_source
            ))
        })?;
    config.label_codes.get(&code).cloned().ok_or_else(|| {
        PipelineError::Schema(format!(
            "row {}: unmapped label code {} in '{}'",
            line, code, config.label_source
        ))
    })
}
