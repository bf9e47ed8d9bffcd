use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::ExtractionError;
use crate::types::{non_empty, MetadataResult};

/// `-format` argument handed to `identify`.
///
/// Reads IPTC record 2 datasets 25 (keywords), 105 (headline), 5 (object
/// name) and 120 (caption). Empty datasets expand to nothing, so the labels
/// are the only reliable separators.
pub const IDENTIFY_FORMAT: &str =
    "Keywords %[IPTC:2:25] Headline %[IPTC:2:105] Title %[IPTC:2:05] Caption %[IPTC:2:120]";

const KEYWORDS_LABEL: &str = "Keywords";
const MARKERS: [&str; 3] = [" Headline", " Title", " Caption"];

/// IPTC keywords come back joined with `;`.
const KEYWORD_SEPARATOR: char = ';';

/// Parse tool output produced with [`IDENTIFY_FORMAT`].
///
/// Labels are matched positionally: each marker is searched for after the
/// previous one. A value that itself contains the next label ends early.
pub fn parse_tool_output(output: &str) -> Result<MetadataResult, ExtractionError> {
    let output = output.trim_end_matches(['\r', '\n']);
    let mut rest = output.strip_prefix(KEYWORDS_LABEL).ok_or_else(|| {
        ExtractionError::ToolOutput(format!("expected output to start with {KEYWORDS_LABEL:?}"))
    })?;

    let mut values = Vec::with_capacity(MARKERS.len() + 1);
    for marker in MARKERS {
        let at = rest.find(marker).ok_or_else(|| {
            ExtractionError::ToolOutput(format!("label {:?} not found", marker.trim_start()))
        })?;
        values.push(&rest[..at]);
        rest = &rest[at + marker.len()..];
    }
    values.push(rest);

    let [keywords, headline, title, caption] = [values[0], values[1], values[2], values[3]];

    let mut raw = BTreeMap::new();
    for (label, value) in [
        (KEYWORDS_LABEL, keywords),
        ("Headline", headline),
        ("Title", title),
        ("Caption", caption),
    ] {
        if let Some(text) = non_empty(value) {
            raw.insert(label.to_string(), Value::String(text));
        }
    }

    Ok(MetadataResult {
        title: non_empty(title),
        description: None,
        headline: non_empty(headline),
        caption_abstract: non_empty(caption),
        keywords: keywords
            .split(KEYWORD_SEPARATOR)
            .filter_map(non_empty)
            .collect(),
        raw,
    })
}
