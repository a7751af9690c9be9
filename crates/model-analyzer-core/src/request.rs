//! Analysis request: which artifact to analyze and with which executable.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A single analyzer invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Path of the built artifact (assembly) to analyze.
    pub artifact_path: PathBuf,

    /// Path of the analyzer executable.
    pub executable_path: PathBuf,

    /// Working directory for the analyzer process.
    pub working_dir: PathBuf,
}

impl AnalysisRequest {
    /// Create a request; the working directory defaults to the executable's directory.
    ///
    /// A relative executable path with a directory component is made absolute
    /// against the current directory, since the child resolves it only after
    /// changing into the working directory. Bare names are left for `PATH`.
    pub fn new(executable_path: impl Into<PathBuf>, artifact_path: impl Into<PathBuf>) -> Self {
        let executable_path = executable_path.into();
        let executable_path = if has_dir_component(&executable_path) {
            absolute(executable_path)
        } else {
            executable_path
        };
        let working_dir = parent_or_current(&executable_path);
        Self {
            artifact_path: artifact_path.into(),
            executable_path,
            working_dir,
        }
    }

    /// Create a request for an analyzer deployed next to the artifact.
    pub fn beside_artifact(artifact_path: impl Into<PathBuf>, executable_name: &str) -> Self {
        let artifact_path = absolute(artifact_path.into());
        let executable_path = parent_or_current(&artifact_path).join(executable_name);
        Self::new(executable_path, artifact_path)
    }

    /// Override the working directory.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    /// Directory containing the artifact.
    pub fn artifact_dir(&self) -> PathBuf {
        parent_or_current(&self.artifact_path)
    }

    /// The single argument passed to the analyzer.
    pub fn argument(&self) -> &Path {
        &self.artifact_path
    }

    /// Human-readable command line, quoting the argument when it has spaces.
    pub fn command_line(&self) -> String {
        let arg = self.artifact_path.to_string_lossy();
        if arg.contains(' ') {
            format!("{} \"{}\"", self.executable_path.display(), arg)
        } else {
            format!("{} {}", self.executable_path.display(), arg)
        }
    }
}

/// Resolve `path` against the current directory; unchanged if that fails.
pub(crate) fn absolute(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    std::path::absolute(&path).unwrap_or(path)
}

fn has_dir_component(path: &Path) -> bool {
    path.parent().is_some_and(|p| !p.as_os_str().is_empty())
}

fn parent_or_current(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
