use std::fs;
use std::path::Path;

use crate::matcher::MatchTable;
use crate::report::{ReportError, RunSummary};

pub fn write_summary_json(path: &Path, summary: &RunSummary) -> Result<(), ReportError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_string_pretty(summary)?;
    fs::write(path, body)?;
    tracing::info!(path = %path.display(), "wrote summary JSON");
    Ok(())
}

pub fn write_match_json(path: &Path, table: &MatchTable) -> Result<(), ReportError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_string_pretty(table)?;
    fs::write(path, body)?;
    tracing::info!(path = %path.display(), "wrote match JSON");
    Ok(())
}
