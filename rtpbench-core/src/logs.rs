use std::path::{Path, PathBuf};

use crate::client::ClientRun;
use crate::error::Result;

#[must_use]
pub fn client_log_path(dir: &Path, client_id: u32) -> PathBuf {
    dir.join(format!("client-{client_id}.log"))
}

/// Writes each client's captured output to `<dir>/client-<id>.log`.
///
/// Failed clients are written too; their output is only kept for diagnostics.
pub async fn write_client_logs(dir: &Path, runs: &[&ClientRun]) -> Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(dir).await?;

    let mut written = Vec::with_capacity(runs.len());
    for run in runs {
        let path = client_log_path(dir, run.client_id);
        let mut text = run.output.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        tokio::fs::write(&path, text).await?;
        written.push(path);
    }

    Ok(written)
}

/// Reads a captured log back as lines, replacing invalid UTF-8.
pub async fn read_log_lines(path: &Path) -> Result<Vec<String>> {
    let bytes = tokio::fs::read(path).await?;
    Ok(String::from_utf8_lossy(&bytes)
        .lines()
        .map(str::to_string)
        .collect())
}
