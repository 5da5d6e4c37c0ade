//! Recovering validated payloads from model text.
//!
//! Models are asked for bare JSON but still wrap it in markdown fences or
//! add a sentence of preamble. Extraction tries, in order:
//! 1. a fenced code block (with or without a language tag)
//! 2. the first balanced `{ ... }` or `[ ... ]`
//!
//! Parsing never substitutes defaults: a missing required field is a
//! [`SanitizeErrorKind::Shape`] error.

use regex::Regex;
use serde::de::DeserializeOwned;
use shotlist_core::ScriptBundle;
use shotlist_error::{SanitizeError, SanitizeErrorKind};
use std::sync::LazyLock;
use tracing::{debug, error};

static FENCE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)(?:```|$)").ok());

/// Remove a surrounding markdown fence, if any.
///
/// Text without a fence is returned trimmed. An unterminated fence keeps
/// everything after the opening line.
///
/// # Examples
///
/// ```
/// use shotlist_pipeline::strip_fences;
///
/// assert_eq!(strip_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
/// assert_eq!(strip_fences("  {\"a\": 1} "), "{\"a\": 1}");
/// ```
pub fn strip_fences(raw: &str) -> &str {
    FENCE
        .as_ref()
        .and_then(|fence| fence.captures(raw))
        .and_then(|captures| captures.get(1))
        .map(|body| body.as_str().trim())
        .unwrap_or_else(|| raw.trim())
}

/// Locate the JSON payload inside raw model text.
///
/// # Errors
///
/// Returns [`SanitizeErrorKind::NoPayload`] if the text contains no object
/// or array.
pub fn extract_json(raw: &str) -> Result<&str, SanitizeError> {
    let stripped = strip_fences(raw);

    let brace = stripped.find('{');
    let bracket = stripped.find('[');
    let (first, second) = match (brace, bracket) {
        (Some(b), Some(k)) if k < b => (('[', ']'), ('{', '}')),
        _ => (('{', '}'), ('[', ']')),
    };

    balanced(stripped, first.0, first.1)
        .or_else(|| balanced(stripped, second.0, second.1))
        .ok_or_else(|| {
            error!(response_length = raw.len(), "No JSON found in model response");
            SanitizeError::new(SanitizeErrorKind::NoPayload(raw.len()))
        })
}

/// First span from `open` to its matching `close`, skipping string contents.
fn balanced(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Extract and parse a payload into `T`.
///
/// # Errors
///
/// - [`SanitizeErrorKind::NoPayload`] if no JSON is present
/// - [`SanitizeErrorKind::Parse`] if the JSON is syntactically broken
/// - [`SanitizeErrorKind::Shape`] if a required field is missing or mistyped
///
/// # Examples
///
/// ```
/// use serde::Deserialize;
/// use shotlist_pipeline::sanitize;
///
/// #[derive(Debug, Deserialize, PartialEq)]
/// struct Reply {
///     title: String,
/// }
///
/// let reply: Reply = sanitize("Sure!\n```json\n{\"title\": \"Rain\"}\n```").unwrap();
/// assert_eq!(reply.title, "Rain");
/// assert!(sanitize::<Reply>("{\"name\": \"Rain\"}").is_err());
/// ```
pub fn sanitize<T>(raw: &str) -> Result<T, SanitizeError>
where
    T: DeserializeOwned,
{
    let payload = extract_json(raw)?;

    serde_json::from_str(payload).map_err(|e| {
        let preview: String = payload.chars().take(100).collect();
        error!(error = %e, json_preview = %preview, "Payload parsing failed");
        let kind = match e.classify() {
            serde_json::error::Category::Data => SanitizeErrorKind::Shape(e.to_string()),
            _ => SanitizeErrorKind::Parse(e.to_string()),
        };
        SanitizeError::new(kind)
    })
}

/// Extract, parse and check a payload with a domain rule.
///
/// # Errors
///
/// As [`sanitize`], plus [`SanitizeErrorKind::Invalid`] when `check`
/// rejects the parsed value.
pub fn sanitize_with<T, C>(raw: &str, check: C) -> Result<T, SanitizeError>
where
    T: DeserializeOwned,
    C: FnOnce(&T) -> Result<(), String>,
{
    let value = sanitize(raw)?;
    check(&value).map_err(|reason| {
        error!(%reason, "Payload failed validation");
        SanitizeError::new(SanitizeErrorKind::Invalid(reason))
    })?;
    Ok(value)
}

/// Check a generated script against the requested shot count and the
/// group partition.
///
/// # Errors
///
/// Returns [`SanitizeErrorKind::Invalid`] on a count mismatch or a bad
/// partition.
pub fn check_script(bundle: &ScriptBundle, shot_count: usize) -> Result<(), SanitizeError> {
    if bundle.script.len() != shot_count {
        return Err(SanitizeError::new(SanitizeErrorKind::Invalid(format!(
            "expected {} shots, received {}",
            shot_count,
            bundle.script.len()
        ))));
    }
    bundle
        .validate()
        .map_err(|e| SanitizeError::new(SanitizeErrorKind::Invalid(e.kind.to_string())))?;
    debug!(shots = shot_count, groups = bundle.groups.len(), "Generated script accepted");
    Ok(())
}
