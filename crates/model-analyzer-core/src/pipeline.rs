//! End-to-end DGML generation: deploy, analyze, extract, render, write.

use crate::config::AnalyzerConfig;
use crate::deploy::deploy_analyzer;
use crate::emit::{emit_with_options, DiagramArtifact, EmitOptions};
use crate::error::Result;
use crate::extract::extract;
use crate::notify::{Notifier, TracingNotifier};
use crate::render::{DiagramRenderer, HandlebarsRenderer};
use crate::request::{absolute, AnalysisRequest};
use crate::runner::{check_analysis, ProcessRunner};
use crate::sources::{EmbeddedTemplate, FileSource, TemplateSource};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Outcome of a successful generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Written diagrams in context order.
    pub artifacts: Vec<DiagramArtifact>,

    /// Analyzer exit code; `None` when the output was supplied directly.
    pub exit_code: Option<i32>,

    /// Total duration in milliseconds.
    pub duration_ms: u64,
}

impl GenerationReport {
    pub fn diagram_count(&self) -> usize {
        self.artifacts.len()
    }
}

/// DGML generation pipeline.
///
/// Holds its collaborators (renderer, template source, notifier) so hosts
/// can swap any of them without touching the flow.
pub struct DgmlPipeline {
    config: AnalyzerConfig,
    renderer: Box<dyn DiagramRenderer + Send + Sync>,
    template: Box<dyn TemplateSource + Send + Sync>,
    notifier: Arc<dyn Notifier>,
}

impl DgmlPipeline {
    /// Pipeline with the Handlebars renderer, tracing notifier and the
    /// configured (or embedded) template.
    pub fn new(config: AnalyzerConfig) -> Self {
        let template: Box<dyn TemplateSource + Send + Sync> = match &config.template_path {
            Some(path) => Box::new(FileSource::new(path)),
            None => Box::new(EmbeddedTemplate),
        };

        Self {
            config,
            renderer: Box::new(HandlebarsRenderer::new()),
            template,
            notifier: Arc::new(TracingNotifier),
        }
    }

    pub fn with_renderer<R>(mut self, renderer: R) -> Self
    where
        R: DiagramRenderer + Send + Sync + 'static,
    {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn with_template_source<T>(mut self, template: T) -> Self
    where
        T: TemplateSource + Send + Sync + 'static,
    {
        self.template = Box::new(template);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// The analyzer invocation used for `artifact`.
    pub fn request_for(&self, artifact: &Path) -> AnalysisRequest {
        let artifact = absolute(artifact.to_path_buf());
        match &self.config.analyzer_path {
            Some(exe) => AnalysisRequest::new(exe, artifact),
            None => AnalysisRequest::beside_artifact(artifact, self.config.analyzer_name()),
        }
    }

    /// Analyze `artifact` and write one diagram per discovered context.
    pub async fn generate(&self, artifact: &Path) -> Result<GenerationReport> {
        let result = self.generate_inner(artifact).await;
        self.report_outcome(&result);
        result
    }

    /// Extract and emit from analyzer output captured elsewhere.
    pub fn generate_from_output(&self, raw_text: &str) -> Result<GenerationReport> {
        let start = Instant::now();
        let result = check_analysis(raw_text.to_string())
            .and_then(|text| self.emit_text(&text))
            .map(|artifacts| GenerationReport {
                artifacts,
                exit_code: None,
                duration_ms: start.elapsed().as_millis() as u64,
            });
        self.report_outcome(&result);
        result
    }

    async fn generate_inner(&self, artifact: &Path) -> Result<GenerationReport> {
        self.config.validate()?;
        let start = Instant::now();
        let request = self.request_for(artifact);

        if let Some(payload_dir) = &self.config.payload_dir {
            self.notifier.status("Deploying model analyzer");
            deploy_analyzer(
                payload_dir,
                &request.artifact_dir(),
                self.config.payload_files.as_slice(),
            )?;
        }

        self.notifier.status(&format!("Analyzing {}", artifact.display()));
        let raw = ProcessRunner::new(self.config.timeout_secs).run(&request).await?;
        let exit_code = raw.exit_code;
        let text = raw.into_analysis()?;

        let artifacts = self.emit_text(&text)?;

        Ok(GenerationReport {
            artifacts,
            exit_code: Some(exit_code),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn emit_text(&self, text: &str) -> Result<Vec<DiagramArtifact>> {
        let records = extract(text)?;
        info!(contexts = records.len(), "Extracted model records");
        if records.is_empty() {
            warn!("Analyzer output contained no DbContext blocks");
        }

        let template = self.template.template()?;
        self.notifier.status(&format!("Generating {} diagram(s)", records.len()));

        let options = EmitOptions {
            write_bom: self.config.write_bom,
        };
        emit_with_options(
            &records,
            &template,
            &self.config.output_dir,
            self.renderer.as_ref(),
            &options,
        )
    }

    fn report_outcome(&self, result: &Result<GenerationReport>) {
        match result {
            Ok(report) => {
                info!(
                    diagrams = report.diagram_count(),
                    duration_ms = report.duration_ms,
                    "DGML generation finished"
                );
                self.notifier
                    .status(&format!("Generated {} diagram(s)", report.diagram_count()));
            }
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "DGML generation failed");
                self.notifier.status(&format!("Diagram generation failed: {}", e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DgmlError;
    use crate::notify::RecordingNotifier;
    use crate::sources::StaticSource;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn pipeline(out: &Path) -> (DgmlPipeline, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let pipeline = DgmlPipeline::new(AnalyzerConfig::new(out))
            .with_template_source(StaticSource("{{context_name}}={{debug_view}}".to_string()))
            .with_notifier(notifier.clone());
        (pipeline, notifier)
    }

    #[test]
    fn test_generate_from_output_writes_diagrams() {
        let dir = tempdir().unwrap();
        let (pipeline, notifier) = pipeline(dir.path());

        let raw = "DbContext:\nCtxA\nDebugView:\nviewA\nDbContext:\nCtxB\nDebugView:\nviewB\n";
        let report = pipeline.generate_from_output(raw).unwrap();

        assert_eq!(report.diagram_count(), 2);
        assert_eq!(report.exit_code, None);
        assert_eq!(report.artifacts[0].path, dir.path().join("CtxA.dgml"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("CtxB.dgml")).unwrap(),
            "CtxB=viewB"
        );
        assert_eq!(
            notifier.messages().last().map(String::as_str),
            Some("Generated 2 diagram(s)")
        );
    }

    #[test]
    fn test_generate_from_output_error_sentinel() {
        let dir = tempdir().unwrap();
        let (pipeline, notifier) = pipeline(dir.path());

        let err = pipeline.generate_from_output("Error:boom").unwrap_err();
        assert!(matches!(err, DgmlError::Analysis(ref m) if m == "boom"));
        assert!(notifier.messages()[0].starts_with("Diagram generation failed"));
    }

    #[test]
    fn test_generate_from_output_parse_error() {
        let dir = tempdir().unwrap();
        let (pipeline, _) = pipeline(dir.path());

        let err = pipeline
            .generate_from_output("DbContext:\nCtx\nno view\n")
            .unwrap_err();
        assert_eq!(err.kind(), "parse");
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_custom_renderer() {
        let dir = tempdir().unwrap();
        let (pipeline, _) = pipeline(dir.path());
        let pipeline = pipeline.with_renderer(
            |name: &str, _body: &str, _t: &str| -> std::result::Result<String, String> {
                Ok(format!("<DirectedGraph Title=\"{name}\" />"))
            },
        );

        pipeline
            .generate_from_output("DbContext:\nCtx\nDebugView:\nv\n")
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("Ctx.dgml")).unwrap(),
            "<DirectedGraph Title=\"Ctx\" />"
        );
    }

    #[test]
    fn test_request_for_uses_configured_analyzer() {
        let config = AnalyzerConfig::new("/tmp").with_analyzer("/tools/efpt");
        let pipeline = DgmlPipeline::new(config);
        let request = pipeline.request_for(Path::new("/app/bin/App.dll"));
        assert_eq!(request.executable_path, PathBuf::from("/tools/efpt"));
        assert_eq!(request.working_dir, PathBuf::from("/tools"));
    }

    #[test]
    fn test_request_for_defaults_beside_artifact() {
        let mut config = AnalyzerConfig::new("/tmp");
        config.analyzer_path = None;
        let pipeline = DgmlPipeline::new(config);
        let request = pipeline.request_for(Path::new("/app/bin/App.dll"));
        assert_eq!(request.executable_path, PathBuf::from("/app/bin/efpt.exe"));
    }

    #[tokio::test]
    async fn test_generate_missing_analyzer_is_launch_error() {
        let dir = tempdir().unwrap();
        let config = AnalyzerConfig::new(dir.path()).with_analyzer(dir.path().join("missing-analyzer"));
        let pipeline = DgmlPipeline::new(config);

        let err = pipeline
            .generate(&dir.path().join("App.dll"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "launch");
    }
}
