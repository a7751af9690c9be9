//! Error taxonomy for the DGML pipeline.

/// Ways the analyzer output can fail to match the two-marker grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("context block {index} ({context:?}) is missing its DebugView marker")]
    MissingDebugView { index: usize, context: String },

    #[error("context block {index} ({context:?}) has more than one DebugView marker")]
    DuplicateDebugView { index: usize, context: String },
}

/// Pipeline errors, one variant per failure kind surfaced to callers.
#[derive(Debug, thiserror::Error)]
pub enum DgmlError {
    #[error("failed to launch analyzer {path}: {reason}")]
    Launch { path: String, reason: String },

    #[error("analyzer timed out after {limit_secs}s")]
    Timeout { limit_secs: u64 },

    #[error("analyzer reported an error: {0}")]
    Analysis(String),

    #[error("malformed analyzer output: {0}")]
    Parse(#[from] ParseError),

    #[error("rendering diagram for {context} failed: {reason}")]
    Render { context: String, reason: String },

    #[error("writing {path} failed: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("template unavailable: {0}")]
    Template(String),

    #[error("deploying analyzer file {file} failed: {reason}")]
    Deploy { file: String, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DgmlError {
    /// Stable discriminant used in structured logs and JSON reports.
    pub fn kind(&self) -> &'static str {
        match self {
            DgmlError::Launch { .. } => "launch",
            DgmlError::Timeout { .. } => "timeout",
            DgmlError::Analysis(_) => "analysis",
            DgmlError::Parse(_) => "parse",
            DgmlError::Render { .. } => "render",
            DgmlError::Write { .. } => "write",
            DgmlError::Template(_) => "template",
            DgmlError::Deploy { .. } => "deploy",
            DgmlError::Config(_) => "config",
            DgmlError::Io(_) => "io",
        }
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, DgmlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_converts() {
        let err: DgmlError = ParseError::MissingDebugView {
            index: 2,
            context: "Blogging".to_string(),
        }
        .into();
        assert_eq!(err.kind(), "parse");
        assert!(err.to_string().contains("Blogging"));
        assert!(err.to_string().contains("missing its DebugView"));
    }

    #[test]
    fn test_analysis_error_display() {
        let err = DgmlError::Analysis("boom".to_string());
        assert_eq!(err.to_string(), "analyzer reported an error: boom");
        assert_eq!(err.kind(), "analysis");
    }

    #[test]
    fn test_write_error_keeps_source() {
        let err = DgmlError::Write {
            path: "/tmp/x.dgml".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("/tmp/x.dgml"));
    }
}
