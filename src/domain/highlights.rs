//! View of the producer's highlight documents.
//!
//! The highlight extractor writes JSON of the form
//! `{video_key, transcript_key, timestamp, model_id, highlights}` where
//! `highlights` has been observed as both plain text and structured
//! JSON, depending on the model revision. Parsing is lenient: any field
//! may be missing, and a body that is not this shape at all degrades to
//! a raw preview instead of an error.

use serde::Deserialize;
use serde_json::Value;

/// Parsed highlight document.
#[derive(Debug, Clone, Deserialize)]
pub struct HighlightsDocument {
    #[serde(default)]
    pub video_key: Option<String>,

    #[serde(default)]
    pub transcript_key: Option<String>,

    /// Producer-side generation time (ISO 8601 string, taken verbatim)
    #[serde(default)]
    pub timestamp: Option<String>,

    #[serde(default)]
    pub model_id: Option<String>,

    #[serde(default)]
    pub highlights: Option<Value>,
}

impl HighlightsDocument {
    /// Parse a document body; `None` when the body is not JSON at all.
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    /// The highlight content as displayable text.
    pub fn highlight_text(&self) -> Option<String> {
        match &self.highlights {
            Some(Value::String(text)) => Some(text.trim().to_string()),
            Some(other) => serde_json::to_string_pretty(other).ok(),
            None => None,
        }
    }
}

/// Best-effort rendering of a fetched artifact body.
///
/// Falls back to the raw body (truncated) when the document does not
/// parse or carries no highlight content.
pub fn render_preview(raw: &str, max_raw_chars: usize) -> String {
    if let Some(text) = HighlightsDocument::parse(raw).and_then(|d| d.highlight_text()) {
        return text;
    }

    let trimmed = raw.trim();
    let mut preview: String = trimmed.chars().take(max_raw_chars).collect();
    if trimmed.chars().count() > max_raw_chars {
        preview.push_str("...");
    }
    preview
}
