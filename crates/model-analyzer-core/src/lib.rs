//! Model Analyzer Core
//!
//! Runs the external model analyzer against a built assembly, splits its
//! output into one record per DbContext and renders each record into a
//! DGML diagram.
//!
//! ## Flow
//!
//! artifact path → [`ProcessRunner`] → raw text → [`extract`] →
//! [`ModelRecord`]s → [`emit`] (through a [`DiagramRenderer`]) → `.dgml` files
//!
//! [`DgmlPipeline`] wires the steps together and adds analyzer deployment,
//! template loading and status notifications.

pub mod config;
pub mod deploy;
pub mod emit;
pub mod error;
pub mod extract;
pub mod notify;
pub mod pipeline;
pub mod render;
pub mod request;
pub mod runner;
pub mod sources;
pub mod telemetry;

pub use config::AnalyzerConfig;
pub use deploy::{deploy_analyzer, ANALYZER_EXE, DEFAULT_PAYLOAD};
pub use emit::{diagram_path, emit, emit_with_options, DiagramArtifact, EmitOptions};
pub use error::{DgmlError, ParseError, Result};
pub use extract::{extract, ModelRecord};
pub use notify::{Notifier, RecordingNotifier, TracingNotifier};
pub use pipeline::{DgmlPipeline, GenerationReport};
pub use render::{entity_types, DiagramRenderer, HandlebarsRenderer};
pub use request::AnalysisRequest;
pub use runner::{check_analysis, ProcessRunner, RawOutput, ERROR_PREFIX};
pub use sources::{
    write_readme, EmbeddedReadme, EmbeddedTemplate, FileSource, ReadmeSource, StaticSource,
    TemplateSource,
};
pub use telemetry::{init_tracing, LogFormat};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
