//! JSON artifact read/write (scalers, models, metrics).
//!
//! Artifacts are the "portable" outputs of a run: pretty-printed JSON with a
//! serde schema owned by the producing module. This module only concentrates
//! the file handling so error messages stay uniform.

use std::fs::File;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Write a pretty-printed JSON artifact. `what` names the artifact in errors.
pub fn write_json<T: Serialize>(path: &Path, value: &T, what: &str) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::io(format!(
                    "Failed to create directory '{}': {e}",
                    parent.display()
                ))
            })?;
        }
    }
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create {what} '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, value)
        .map_err(|e| AppError::io(format!("Failed to write {what} '{}': {e}", path.display())))?;
    Ok(())
}

/// Read a JSON artifact.
pub fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open {what} '{}': {e}", path.display())))?;
    serde_json::from_reader(file)
        .map_err(|e| AppError::io(format!("Invalid {what} '{}': {e}", path.display())))
}
