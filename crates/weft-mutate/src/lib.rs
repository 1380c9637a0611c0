use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use weft_core::Strategy;

/// Comment line prepended by `comment-insert` when the file has no leading
/// comment yet.
const HEADER_COMMENT: &str = "// auto-maintained";

/// Suffix appended to an existing leading comment by `comment-insert`.
const UPDATED_SUFFIX: &str = " // updated";

/// Marker field inserted by `structured-field-touch`.
const MARKER_KEY: &str = "_touched";
const MARKER_VALUE: &str = "weft";

/// Apply one strategy to raw bytes. Pure: returns the new bytes and whether
/// they differ from the input. Content is handled as text; non-UTF-8 input
/// comes back unchanged, so binary files fall through to the next target.
pub fn apply(strategy: Strategy, input: &[u8]) -> (Vec<u8>, bool) {
    let Ok(text) = std::str::from_utf8(input) else {
        return (input.to_vec(), false);
    };
    let output = match strategy {
        Strategy::CommentInsert => comment_insert(text),
        Strategy::WhitespaceNormalize => whitespace_normalize(text),
        Strategy::StructuredFieldTouch => structured_field_touch(text),
        Strategy::TrailingNewlineEnsure => trailing_newline_ensure(text),
    };
    let changed = output.as_bytes() != input;
    (output.into_bytes(), changed)
}

/// Apply one strategy to one file, persisting the result when it changed.
///
/// A missing file reports `Ok(false)` without error: callers hold a fallback
/// chain and treat a no-op as "try the next target". On `false` no write
/// happens.
pub fn mutate_file(path: &Path, strategy: Strategy) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    let input = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let (output, changed) = apply(strategy, &input);
    if changed {
        fs::write(path, output).with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(changed)
}

/// Last-resort guaranteed change: append a blank line to `path`.
/// Always a byte-level change when the file exists; `Ok(false)` when absent.
pub fn append_blank_line(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    let mut bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    bytes.push(b'\n');
    fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    Ok(true)
}

/// Prepend a comment line, or suffix an existing leading comment.
///
/// NOT idempotent by design: every application must yield a visible diff, so
/// repeated runs keep extending the leading comment.
fn comment_insert(text: &str) -> String {
    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
    match lines.first() {
        Some(first) if first.starts_with("//") || first.starts_with('#') => {
            lines[0] = format!("{}{UPDATED_SUFFIX}", first.trim_end());
        }
        _ => lines.insert(0, HEADER_COMMENT.to_string()),
    }
    lines.join("\n")
}

/// Collapse runs of more than two consecutive blank lines to exactly two,
/// appending a trailing newline when the collapsing changed anything.
fn whitespace_normalize(text: &str) -> String {
    let mut out = text.to_string();
    while out.contains("\n\n\n") {
        out = out.replace("\n\n\n", "\n\n");
    }
    if out != text {
        out.push('\n');
    }
    out
}

/// Insert the marker field into a JSON document, once. A document that
/// already carries the marker comes back untouched, so the strategy is
/// idempotent after the first application. Parse failures fall back to a
/// content-agnostic trim of trailing whitespace.
fn structured_field_touch(text: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(serde_json::Value::Object(mut map)) => {
            if map.contains_key(MARKER_KEY) {
                return text.to_string();
            }
            map.insert(
                MARKER_KEY.to_string(),
                serde_json::Value::String(MARKER_VALUE.to_string()),
            );
            let mut out = serde_json::to_string_pretty(&map).unwrap_or_else(|_| text.to_string());
            out.push('\n');
            out
        }
        _ => {
            let trimmed = text.trim_end();
            format!("{trimmed}\n")
        }
    }
}

/// Append a trailing newline if absent.
fn trailing_newline_ensure(text: &str) -> String {
    if text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{text}\n")
    }
}
