//! Input parsing for the CLI — fence definition files and sample logs.
//!
//! Fence files are a JSON array of definitions. Sample logs are JSON
//! lines, one position per line, each with an optional `deviceId`.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use geofence_core::{Geofence, PositionSample};

#[derive(Debug, Error)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One line of a sample log. Lines without a `deviceId` belong to the
/// device named on the command line.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleLine {
    pub device_id: Option<String>,
    #[serde(flatten)]
    pub sample: PositionSample,
}

/// Load a fence file. Definitions are parsed, not validated; callers
/// report validation per fence so one bad entry names itself.
pub fn load_fences(path: &Path) -> Result<Vec<Geofence>, InputError> {
    let text = std::fs::read_to_string(path)?;
    let fences: Vec<Geofence> = serde_json::from_str(&text)?;
    Ok(fences)
}

/// Parse one sample-log line. Blank lines and `#` comments yield `None`.
pub fn parse_sample_line(line: &str) -> Option<Result<SampleLine, serde_json::Error>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    Some(serde_json::from_str(trimmed))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
