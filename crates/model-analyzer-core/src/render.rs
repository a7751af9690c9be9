//! Diagram rendering.
//!
//! The pipeline only knows the [`DiagramRenderer`] seam. [`HandlebarsRenderer`]
//! is the stock adapter: it hands the record to a Handlebars template together
//! with the entity types listed in the debug view.

use chrono::Utc;
use handlebars::Handlebars;
use regex::Regex;
use serde_json::json;
use std::sync::OnceLock;

/// Turns one model record into diagram text.
pub trait DiagramRenderer {
    /// Render `debug_view` of `context_name` through `template`.
    ///
    /// Errors are reported as a human-readable reason.
    fn render(
        &self,
        context_name: &str,
        debug_view: &str,
        template: &str,
    ) -> std::result::Result<String, String>;
}

impl<F> DiagramRenderer for F
where
    F: Fn(&str, &str, &str) -> std::result::Result<String, String>,
{
    fn render(
        &self,
        context_name: &str,
        debug_view: &str,
        template: &str,
    ) -> std::result::Result<String, String> {
        self(context_name, debug_view, template)
    }
}

/// Handlebars-backed renderer.
///
/// Template context: `context_name`, `debug_view`, `entities` (array of
/// entity type names) and `generated_at` (RFC 3339 timestamp).
#[derive(Debug, Clone)]
pub struct HandlebarsRenderer {
    strict: bool,
}

impl Default for HandlebarsRenderer {
    fn default() -> Self {
        Self { strict: true }
    }
}

impl HandlebarsRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow templates to reference variables that are not in the context.
    pub fn lenient(mut self) -> Self {
        self.strict = false;
        self
    }
}

impl DiagramRenderer for HandlebarsRenderer {
    fn render(
        &self,
        context_name: &str,
        debug_view: &str,
        template: &str,
    ) -> std::result::Result<String, String> {
        let mut hb = Handlebars::new();
        hb.set_strict_mode(self.strict);

        let ctx = json!({
            "context_name": context_name,
            "debug_view": debug_view,
            "entities": entity_types(debug_view),
            "generated_at": Utc::now().to_rfc3339(),
        });

        hb.render_template(template, &ctx).map_err(|e| e.to_string())
    }
}

/// Entity type names declared in a debug view, in order of appearance.
pub fn entity_types(debug_view: &str) -> Vec<String> {
    static ENTITY_RE: OnceLock<Regex> = OnceLock::new();
    let re = ENTITY_RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*EntityType:\s*(\S+)").expect("entity type pattern is valid")
    });

    re.captures_iter(debug_view)
        .map(|c| c[1].to_string())
        .collect()
}
