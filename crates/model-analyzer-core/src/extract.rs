//! Splits analyzer output into one record per DbContext.
//!
//! The analyzer prints, per discovered context:
//!
//! ```text
//! DbContext:
//! <context name>
//! DebugView:
//! <debug view text>
//! ```

use crate::error::ParseError;
use serde::{Deserialize, Serialize};

/// Marker opening a context block.
pub const CONTEXT_MARKER: &str = "DbContext:\n";

/// Marker separating the context name from its debug view.
pub const DEBUG_VIEW_MARKER: &str = "DebugView:\n";

/// One discovered model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub context_name: String,
    pub debug_view: String,
}

impl ModelRecord {
    pub fn new(context_name: impl Into<String>, debug_view: impl Into<String>) -> Self {
        Self {
            context_name: context_name.into(),
            debug_view: debug_view.into(),
        }
    }
}

/// Parse raw analyzer output into records, in source order.
///
/// CRLF line endings are normalised first. Empty segments between context
/// markers are skipped, as is a blank preamble before the first marker.
/// Every other segment, including a blank one, must hold exactly one debug
/// view marker or the whole batch fails.
pub fn extract(raw_text: &str) -> Result<Vec<ModelRecord>, ParseError> {
    let text = raw_text.replace("\r\n", "\n");

    text.split(CONTEXT_MARKER)
        .enumerate()
        .filter(|(position, segment)| {
            !segment.is_empty() && !(*position == 0 && segment.trim().is_empty())
        })
        .map(|(_, segment)| segment)
        .enumerate()
        .map(|(index, segment)| parse_segment(index, segment))
        .collect()
}

fn parse_segment(index: usize, segment: &str) -> Result<ModelRecord, ParseError> {
    let parts: Vec<&str> = segment.split(DEBUG_VIEW_MARKER).collect();
    match parts.as_slice() {
        [name, view] => Ok(ModelRecord::new(name.trim(), view.trim())),
        [name] => Err(ParseError::MissingDebugView {
            index,
            context: first_line(name),
        }),
        [name, ..] => Err(ParseError::DuplicateDebugView {
            index,
            context: first_line(name),
        }),
        [] => unreachable!("split always yields at least one part"),
    }
}

fn first_line(text: &str) -> String {
    text.trim().lines().next().unwrap_or_default().to_string()
}
