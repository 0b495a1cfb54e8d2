// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Best-effort JSON extraction from model replies.
//!
//! Models asked for raw JSON still occasionally wrap the object in markdown
//! code fences or stray prose. Parsing is tolerant: direct parse first,
//! then a fence-stripping retry, then a tagged fallback carrying the raw
//! reply. Never an error.

use chatsight_core::AnalysisOutcome;

/// Error string stored on unparseable replies.
const PARSE_FAILURE: &str = "Failed to parse JSON";

/// Extract a JSON value from a model reply.
///
/// 1. Direct `serde_json` parse of the trimmed reply.
/// 2. On failure, strip markdown code-fence markers and retry once.
/// 3. On repeated failure, return [`AnalysisOutcome::Unparsed`] carrying
///    the original text.
pub fn extract_json(reply: &str) -> AnalysisOutcome {
    let trimmed = reply.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return AnalysisOutcome::Parsed(value);
    }

    let cleaned = strip_code_fences(trimmed);
    if let Ok(value) = serde_json::from_str(cleaned) {
        return AnalysisOutcome::Parsed(value);
    }

    AnalysisOutcome::Unparsed {
        raw: reply.to_string(),
        error: PARSE_FAILURE.to_string(),
    }
}

/// Strip a surrounding markdown code fence (``` or ```json), if present.
fn strip_code_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json", "JSON", ...) up to the first newline.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}
