//! Providers for the diagram template and the readme text.

use crate::error::{DgmlError, Result};
use std::path::{Path, PathBuf};

const DEFAULT_TEMPLATE: &str = include_str!("../templates/default.dgml.hbs");
const DEFAULT_README: &str = include_str!("../templates/readme.txt");

/// Supplies the diagram template text.
pub trait TemplateSource {
    fn template(&self) -> Result<String>;
}

/// Supplies the readme text shown to users.
pub trait ReadmeSource {
    fn readme(&self) -> Result<String>;
}

/// The template compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedTemplate;

impl TemplateSource for EmbeddedTemplate {
    fn template(&self) -> Result<String> {
        Ok(DEFAULT_TEMPLATE.to_string())
    }
}

/// The readme compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedReadme;

impl ReadmeSource for EmbeddedReadme {
    fn readme(&self) -> Result<String> {
        Ok(DEFAULT_README.to_string())
    }
}

/// Text read from a file on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<String> {
        std::fs::read_to_string(&self.path)
            .map_err(|e| DgmlError::Template(format!("{}: {}", self.path.display(), e)))
    }
}

impl TemplateSource for FileSource {
    fn template(&self) -> Result<String> {
        self.read()
    }
}

impl ReadmeSource for FileSource {
    fn readme(&self) -> Result<String> {
        self.read()
    }
}

/// Fixed text, mostly for tests and embedding callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticSource(pub String);

impl TemplateSource for StaticSource {
    fn template(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

impl ReadmeSource for StaticSource {
    fn readme(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Write the readme to `path` as UTF-8 and return the path.
pub fn write_readme<S>(source: &S, path: &Path) -> Result<PathBuf>
where
    S: ReadmeSource + ?Sized,
{
    let text = source.readme()?;
    std::fs::write(path, text).map_err(|source| DgmlError::Write {
        path: path.display().to_string(),
        source,
    })?;
    Ok(path.to_path_buf())
}
