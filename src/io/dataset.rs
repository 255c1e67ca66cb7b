//! Stage CSV read/write.
//!
//! Every stage writes its output as a semicolon-delimited CSV so the pipeline
//! can be resumed (or inspected) at any point:
//!
//! - cleaning stages exchange typed `Application` rows (serde-backed)
//! - feature stages exchange `FeatureFrame`s (dynamic numeric columns)

use std::fs::File;
use std::path::Path;

use crate::domain::{Application, FeatureFrame};
use crate::error::AppError;
use crate::io::ingest::STAGE_DELIMITER;

/// Write applications to a stage CSV.
pub fn write_applications(path: &Path, apps: &[Application]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create '{}': {e}", path.display())))?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(STAGE_DELIMITER)
        .from_writer(file);

    for app in apps {
        writer
            .serialize(app)
            .map_err(|e| AppError::io(format!("Failed to write '{}': {e}", path.display())))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to flush '{}': {e}", path.display())))?;
    Ok(())
}

/// Read applications from a stage CSV.
pub fn read_applications(path: &Path) -> Result<Vec<Application>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open '{}': {e}", path.display())))?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(STAGE_DELIMITER)
        .from_reader(file);

    let mut apps = Vec::new();
    for (idx, result) in reader.deserialize::<Application>().enumerate() {
        let app = result.map_err(|e| {
            AppError::io(format!(
                "Invalid application row {} in '{}': {e}",
                idx + 2,
                path.display()
            ))
        })?;
        apps.push(app);
    }
    Ok(apps)
}

/// Write a feature frame to a stage CSV.
pub fn write_frame(path: &Path, frame: &FeatureFrame) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create '{}': {e}", path.display())))?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(STAGE_DELIMITER)
        .from_writer(file);

    writer
        .write_record(&frame.columns)
        .map_err(|e| AppError::io(format!("Failed to write '{}': {e}", path.display())))?;

    for row in &frame.rows {
        let record: Vec<String> = row.iter().map(|v| format_value(*v)).collect();
        writer
            .write_record(&record)
            .map_err(|e| AppError::io(format!("Failed to write '{}': {e}", path.display())))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to flush '{}': {e}", path.display())))?;
    Ok(())
}

/// Read a feature frame from a stage CSV.
pub fn read_frame(path: &Path) -> Result<FeatureFrame, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open '{}': {e}", path.display())))?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(STAGE_DELIMITER)
        .from_reader(file);

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::io(format!("Failed to read headers of '{}': {e}", path.display())))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut frame = FeatureFrame::new(columns.clone());
    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            AppError::io(format!(
                "Invalid row {} in '{}': {e}",
                idx + 2,
                path.display()
            ))
        })?;
        let mut row = Vec::with_capacity(frame.n_cols());
        for (col, field) in columns.iter().zip(record.iter()) {
            let v: f64 = field.trim().parse().map_err(|_| {
                AppError::io(format!(
                    "Invalid numeric value '{field}' in column `{col}` of '{}' (row {}).",
                    path.display(),
                    idx + 2
                ))
            })?;
            row.push(v);
        }
        frame.push_row(row)?;
    }
    Ok(frame)
}

/// Integral values print without a trailing `.0` so one-hot columns stay tidy.
fn format_value(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_formatting() {
        assert_eq!(format_value(1.0), "1");
        assert_eq!(format_value(0.0), "0");
        assert_eq!(format_value(-2.0), "-2");
        assert_eq!(format_value(1.25), "1.25");
    }
}
