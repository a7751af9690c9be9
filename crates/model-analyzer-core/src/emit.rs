//! Writes one rendered `.dgml` file per model record.

use crate::error::{DgmlError, Result};
use crate::extract::ModelRecord;
use crate::render::DiagramRenderer;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File extension of emitted diagrams.
pub const DGML_EXTENSION: &str = "dgml";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A diagram written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramArtifact {
    /// Context the diagram was rendered from.
    pub context_name: String,

    /// Destination file.
    pub path: PathBuf,

    /// Bytes written, including the BOM when enabled.
    pub bytes_written: usize,
}

/// Output options for [`emit_with_options`].
///
/// The BOM is off by default, a deliberate departure from the Visual Studio
/// extension that produced these diagrams before, which always wrote UTF-8
/// with a BOM. Visual Studio reads DGML either way; enable `write_bom` for
/// byte-identical files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitOptions {
    /// Prefix each file with a UTF-8 byte-order mark.
    pub write_bom: bool,
}

/// Render and write every record with default options.
pub fn emit<R>(
    records: &[ModelRecord],
    template: &str,
    output_dir: &Path,
    renderer: &R,
) -> Result<Vec<DiagramArtifact>>
where
    R: DiagramRenderer + ?Sized,
{
    emit_with_options(records, template, output_dir, renderer, &EmitOptions::default())
}

/// Render and write every record to `output_dir/<context>.dgml`.
///
/// Existing files are overwritten, including ones written earlier in the same
/// batch when two context names sanitise to the same file name (logged as a
/// warning). The first render or write failure aborts the batch; files
/// written before it are left in place.
pub fn emit_with_options<R>(
    records: &[ModelRecord],
    template: &str,
    output_dir: &Path,
    renderer: &R,
    options: &EmitOptions,
) -> Result<Vec<DiagramArtifact>>
where
    R: DiagramRenderer + ?Sized,
{
    std::fs::create_dir_all(output_dir).map_err(|source| DgmlError::Write {
        path: output_dir.display().to_string(),
        source,
    })?;

    let mut artifacts = Vec::with_capacity(records.len());
    let mut written = HashSet::with_capacity(records.len());

    for record in records {
        let text = renderer
            .render(&record.context_name, &record.debug_view, template)
            .map_err(|reason| DgmlError::Render {
                context: record.context_name.clone(),
                reason,
            })?;

        let path = diagram_path(output_dir, &record.context_name);
        if !written.insert(path.clone()) {
            warn!(
                context = %record.context_name,
                path = %path.display(),
                "Diagram path already written in this batch, overwriting"
            );
        }
        let bytes_written = write_text(&path, &text, options.write_bom)?;

        info!(context = %record.context_name, path = %path.display(), "Wrote diagram");
        artifacts.push(DiagramArtifact {
            context_name: record.context_name.clone(),
            path,
            bytes_written,
        });
    }

    Ok(artifacts)
}

/// Destination of the diagram for `context_name` inside `output_dir`.
pub fn diagram_path(output_dir: &Path, context_name: &str) -> PathBuf {
    output_dir.join(format!("{}.{}", file_stem(context_name), DGML_EXTENSION))
}

/// Make a context name safe to use as a file stem.
fn file_stem(context_name: &str) -> String {
    let stem: String = context_name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let stem = stem.trim_end_matches(['.', ' ']).trim_start();
    if stem.is_empty() {
        "context".to_string()
    } else {
        stem.to_string()
    }
}

fn write_text(path: &Path, text: &str, bom: bool) -> Result<usize> {
    let mut bytes = Vec::with_capacity(text.len() + UTF8_BOM.len());
    if bom {
        bytes.extend_from_slice(UTF8_BOM);
    }
    bytes.extend_from_slice(text.as_bytes());

    std::fs::write(path, &bytes).map_err(|source| DgmlError::Write {
        path: path.display().to_string(),
        source,
    })?;
    debug!(bytes = bytes.len(), "Diagram bytes written");
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn echo_renderer(name: &str, body: &str, template: &str) -> std::result::Result<String, String> {
        Ok(format!("{template}|{name}|{body}"))
    }

    #[test]
    fn test_emit_writes_one_file_per_record() {
        let dir = tempdir().unwrap();
        let records = vec![
            ModelRecord::new("CtxA", "viewA"),
            ModelRecord::new("CtxB", "viewB"),
        ];

        let artifacts = emit(&records, "T", dir.path(), &echo_renderer).unwrap();

        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[0].path, dir.path().join("CtxA.dgml"));
        assert_eq!(artifacts[1].path, dir.path().join("CtxB.dgml"));
        assert_eq!(
            std::fs::read_to_string(&artifacts[0].path).unwrap(),
            "T|CtxA|viewA"
        );
        assert_eq!(artifacts[1].bytes_written, "T|CtxB|viewB".len());
    }

    #[test]
    fn test_emit_overwrites_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Ctx.dgml");
        std::fs::write(&path, "stale content that is longer").unwrap();

        emit(&[ModelRecord::new("Ctx", "v")], "T", dir.path(), &echo_renderer).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "T|Ctx|v");
    }

    #[test]
    fn test_emit_with_bom() {
        let dir = tempdir().unwrap();
        let options = EmitOptions { write_bom: true };
        let artifacts = emit_with_options(
            &[ModelRecord::new("Ctx", "v")],
            "T",
            dir.path(),
            &echo_renderer,
            &options,
        )
        .unwrap();

        let bytes = std::fs::read(&artifacts[0].path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        assert_eq!(artifacts[0].bytes_written, bytes.len());
    }

    #[test]
    fn test_render_failure_keeps_earlier_files() {
        let dir = tempdir().unwrap();
        let records = vec![
            ModelRecord::new("Good", "ok"),
            ModelRecord::new("Bad", "fail"),
            ModelRecord::new("Never", "ok"),
        ];
        let renderer = |name: &str, body: &str, _t: &str| -> std::result::Result<String, String> {
            if body == "fail" {
                Err("template blew up".to_string())
            } else {
                Ok(name.to_string())
            }
        };

        let err = emit(&records, "", dir.path(), &renderer).unwrap_err();
        match err {
            DgmlError::Render { context, reason } => {
                assert_eq!(context, "Bad");
                assert_eq!(reason, "template blew up");
            }
            other => panic!("expected render error, got {:?}", other),
        }
        assert!(dir.path().join("Good.dgml").exists());
        assert!(!dir.path().join("Never.dgml").exists());
    }

    #[test]
    fn test_colliding_file_names_keep_last_record() {
        let dir = tempdir().unwrap();
        let records = vec![ModelRecord::new("A:B", "first"), ModelRecord::new("A_B", "second")];

        let artifacts = emit(&records, "T", dir.path(), &echo_renderer).unwrap();

        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[0].path, artifacts[1].path);
        assert_eq!(artifacts[0].context_name, "A:B");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("A_B.dgml")).unwrap(),
            "T|A_B|second"
        );
    }

    #[test]
    fn test_bom_off_by_default() {
        let dir = tempdir().unwrap();
        let artifacts = emit(&[ModelRecord::new("Ctx", "v")], "T", dir.path(), &echo_renderer).unwrap();
        let bytes = std::fs::read(&artifacts[0].path).unwrap();
        assert!(!bytes.starts_with(UTF8_BOM));
    }

    #[test]
    fn test_creates_output_dir() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        emit(&[ModelRecord::new("Ctx", "v")], "", &nested, &echo_renderer).unwrap();
        assert!(nested.join("Ctx.dgml").exists());
    }

    #[test]
    fn test_file_stem_sanitised() {
        assert_eq!(file_stem("My.App.BloggingContext"), "My.App.BloggingContext");
        assert_eq!(file_stem("Ns/Ctx<T>"), "Ns_Ctx_T_");
        assert_eq!(file_stem("Ctx. "), "Ctx");
        assert_eq!(file_stem("   "), "context");
        assert_eq!(file_stem(""), "context");
    }
}
