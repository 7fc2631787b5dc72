//! Extraction of structured deck data from free-text model replies.
//!
//! Replies are asked to contain only JSON but frequently arrive wrapped in a
//! fenced code block with a language tag. Extraction strips the fence, parses
//! the payload and validates its shape, filling optional fields with
//! defaults. A deck with any invalid slide is rejected as a whole.

use crate::error::{ExtractionError, SchemaLocation};
use crate::types::{Color, DeckSpec, SlidePatch, SlideSpec, Theme, DEFAULT_STYLE, DEFAULT_TOPIC};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// Maximum number of reply characters kept in a malformed-payload error.
pub const DIAGNOSTIC_PREFIX_CHARS: usize = 500;

const FENCE: &str = "```";

/// Leading language tag of a fenced block, e.g. `json` or `json5`.
static LANGUAGE_TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_+.-]*").unwrap());

/// Extract a full deck from a model reply.
pub fn extract_deck(raw: &str) -> Result<DeckSpec, ExtractionError> {
    let value = parse_payload(raw)?;
    deck_from_value(&value)
}

/// Parse a persisted deck snapshot. Applies the same validation as replies.
pub fn parse_deck(json: &str) -> Result<DeckSpec, ExtractionError> {
    extract_deck(json)
}

/// Extract a partial slide from an enhancement reply.
pub fn extract_slide_patch(raw: &str) -> Result<SlidePatch, ExtractionError> {
    let value = parse_payload(raw)?;
    let object = value.as_object().ok_or_else(|| violation(SchemaLocation::Root, "expected a JSON object"))?;

    Ok(SlidePatch {
        title: optional_string(object, "title", SchemaLocation::Root)?,
        content: optional_string_list(object, "content", SchemaLocation::Root)?,
        image_prompt: optional_string(object, "image_prompt", SchemaLocation::Root)?,
    })
}

/// Remove a surrounding code fence and its language tag.
///
/// Text without a leading fence is returned trimmed and otherwise untouched.
pub fn strip_code_fence(raw: &str) -> &str {
    let text = raw.trim();
    if !text.starts_with(FENCE) {
        return text;
    }

    // First segment after the opening fence, up to the closing one if any.
    let segment = text.split(FENCE).nth(1).unwrap_or_default();
    let segment = match LANGUAGE_TAG_REGEX.find(segment) {
        Some(tag) => &segment[tag.end()..],
        None => segment,
    };
    segment.trim()
}

/// Strip the fence and parse JSON, keeping only a bounded prefix on failure.
fn parse_payload(raw: &str) -> Result<Value, ExtractionError> {
    let payload = strip_code_fence(raw);
    serde_json::from_str(payload).map_err(|e| ExtractionError::MalformedPayload {
        reason: e.to_string(),
        prefix: diagnostic_prefix(raw),
    })
}

/// The first [`DIAGNOSTIC_PREFIX_CHARS`] characters of a reply.
fn diagnostic_prefix(raw: &str) -> String {
    raw.chars().take(DIAGNOSTIC_PREFIX_CHARS).collect()
}

fn deck_from_value(value: &Value) -> Result<DeckSpec, ExtractionError> {
    let root = SchemaLocation::Root;
    let object = value
        .as_object()
        .ok_or_else(|| violation(root, "expected a JSON object at the top level"))?;

    let topic = optional_string(object, "topic", root)?
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_TOPIC.to_string());

    let theme = match object.get("design_theme") {
        None | Some(Value::Null) => Theme::default(),
        Some(Value::Object(theme)) => theme_from_object(theme)?,
        Some(_) => return Err(violation(root, "`design_theme` must be an object")),
    };

    let slides = match object.get("slides") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(index, item)| slide_from_value(index, item))
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(violation(root, "`slides` must be an array")),
    };

    log::debug!("Extracted deck '{}' with {} slides", topic, slides.len());

    Ok(DeckSpec {
        topic,
        theme,
        slides,
    })
}

fn theme_from_object(theme: &Map<String, Value>) -> Result<Theme, ExtractionError> {
    let root = SchemaLocation::Root;
    let color = |key: &str, fallback: Color| -> Result<Color, ExtractionError> {
        match optional_string(theme, key, root)? {
            None => Ok(fallback),
            Some(text) => Ok(Color::parse(&text).unwrap_or_else(|| {
                log::warn!("Ignoring unparseable {} {:?}, using {}", key, text, fallback);
                fallback
            })),
        }
    };

    Ok(Theme {
        primary_color: color("primary_color", Color::DEFAULT_PRIMARY)?,
        secondary_color: color("secondary_color", Color::DEFAULT_SECONDARY)?,
        accent_color: color("accent_color", Color::DEFAULT_ACCENT)?,
        style: optional_string(theme, "style", root)?.unwrap_or_else(|| DEFAULT_STYLE.to_string()),
    })
}

fn slide_from_value(index: usize, value: &Value) -> Result<SlideSpec, ExtractionError> {
    let location = SchemaLocation::Slide(index);
    let object = value
        .as_object()
        .ok_or_else(|| violation(location, "expected a JSON object"))?;

    let title = optional_string(object, "title", location)?
        .ok_or_else(|| violation(location, "missing string field `title`"))?;

    Ok(SlideSpec {
        title,
        content: optional_string_list(object, "content", location)?.unwrap_or_default(),
        image_prompt: optional_string(object, "image_prompt", location)?,
    })
}

/// Read an optional string field. `null` counts as absent.
fn optional_string(
    object: &Map<String, Value>,
    key: &str,
    location: SchemaLocation,
) -> Result<Option<String>, ExtractionError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(violation(location, format!("`{}` must be a string", key))),
    }
}

/// Read an optional array of strings. `null` counts as absent.
fn optional_string_list(
    object: &Map<String, Value>,
    key: &str,
    location: SchemaLocation,
) -> Result<Option<Vec<String>>, ExtractionError> {
    let items = match object.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(violation(location, format!("`{}` must be an array of strings", key))),
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::String(s) => Ok(s.clone()),
            _ => Err(violation(location, format!("`{}[{}]` must be a string", key, i))),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn violation(location: SchemaLocation, reason: impl Into<String>) -> ExtractionError {
    ExtractionError::SchemaViolation {
        location,
        reason: reason.into(),
    }
}
