//! Pipeline configuration.
//!
//! Defaults come from `MODEL_ANALYZER_*` environment variables so the binary
//! and embedding callers share the same knobs.

use crate::deploy::{ANALYZER_EXE, DEFAULT_PAYLOAD};
use crate::error::{DgmlError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default analyzer timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Settings for one pipeline instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Explicit analyzer path. When unset, the analyzer is expected next to
    /// the artifact (after deployment from `payload_dir`).
    pub analyzer_path: Option<PathBuf>,

    /// Analyzer timeout in seconds (0 = no timeout).
    pub timeout_secs: u64,

    /// Directory the `.dgml` files are written to.
    pub output_dir: PathBuf,

    /// Directory holding the analyzer payload to deploy next to the artifact.
    pub payload_dir: Option<PathBuf>,

    /// Payload file names, executable first.
    pub payload_files: Vec<String>,

    /// Custom template file; the embedded template is used when unset.
    pub template_path: Option<PathBuf>,

    /// Prefix emitted files with a UTF-8 BOM. Off unless
    /// `MODEL_ANALYZER_WRITE_BOM` is set; see [`crate::EmitOptions`].
    pub write_bom: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        AnalyzerConfig {
            analyzer_path: std::env::var("MODEL_ANALYZER_EXE").ok().map(PathBuf::from),
            timeout_secs: std::env::var("MODEL_ANALYZER_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            output_dir: std::env::var("MODEL_ANALYZER_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir()),
            payload_dir: std::env::var("MODEL_ANALYZER_PAYLOAD_DIR").ok().map(PathBuf::from),
            payload_files: DEFAULT_PAYLOAD.iter().map(|f| f.to_string()).collect(),
            template_path: std::env::var("MODEL_ANALYZER_TEMPLATE").ok().map(PathBuf::from),
            write_bom: std::env::var("MODEL_ANALYZER_WRITE_BOM")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }
}

impl AnalyzerConfig {
    /// Configuration from environment variables.
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Configuration writing to `output_dir`, everything else from the environment.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        AnalyzerConfig {
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_analyzer(mut self, path: impl Into<PathBuf>) -> Self {
        self.analyzer_path = Some(path.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_payload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.payload_dir = Some(dir.into());
        self
    }

    pub fn with_template(mut self, path: impl Into<PathBuf>) -> Self {
        self.template_path = Some(path.into());
        self
    }

    pub fn with_bom(mut self, write_bom: bool) -> Self {
        self.write_bom = write_bom;
        self
    }

    /// Name of the analyzer executable inside the payload.
    pub fn analyzer_name(&self) -> &str {
        self.payload_files
            .first()
            .map(String::as_str)
            .unwrap_or(ANALYZER_EXE)
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(DgmlError::Config("output directory must not be empty".to_string()));
        }
        if self.payload_dir.is_some() && self.payload_files.is_empty() {
            return Err(DgmlError::Config(
                "payload directory set but no payload files listed".to_string(),
            ));
        }
        if self.payload_files.iter().any(|f| f.trim().is_empty()) {
            return Err(DgmlError::Config("payload file names must not be blank".to_string()));
        }
        Ok(())
    }
}
