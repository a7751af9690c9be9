//! Copies the analyzer and its companion files next to the target artifact.
//!
//! The analyzer has to run from the artifact's directory so the runtime can
//! resolve the artifact's own dependencies.

use crate::error::{DgmlError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Analyzer executable name.
pub const ANALYZER_EXE: &str = "efpt.exe";

/// Files shipped with the analyzer, executable first.
pub const DEFAULT_PAYLOAD: &[&str] = &[
    ANALYZER_EXE,
    "efpt.exe.config",
    "Microsoft.EntityFrameworkCore.Design.dll",
];

/// Copy `files` from `from_dir` into `to_dir`, overwriting existing copies.
///
/// Returns the destination paths in the order given.
pub fn deploy_analyzer<S>(from_dir: &Path, to_dir: &Path, files: &[S]) -> Result<Vec<PathBuf>>
where
    S: AsRef<str>,
{
    if !to_dir.is_dir() {
        return Err(DgmlError::Deploy {
            file: to_dir.display().to_string(),
            reason: "target directory does not exist".to_string(),
        });
    }

    let mut copied = Vec::with_capacity(files.len());
    for name in files {
        let name = name.as_ref();
        let from = from_dir.join(name);
        let to = to_dir.join(name);

        std::fs::copy(&from, &to).map_err(|e| DgmlError::Deploy {
            file: from.display().to_string(),
            reason: e.to_string(),
        })?;
        debug!(from = %from.display(), to = %to.display(), "Copied analyzer file");
        copied.push(to);
    }

    info!(count = copied.len(), target = %to_dir.display(), "Deployed analyzer");
    Ok(copied)
}
