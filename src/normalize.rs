use serde_json::Value;
use tracing::warn;

use crate::{generator::GenerateError, models::GeneratedRecord};

// Below this the listing is still accepted, only logged.
pub const MIN_TAGS: usize = 10;

/// Removes leading/trailing markdown code fences (```` ```json ````, bare ```` ``` ````)
/// until none remain. Backticks inside the payload are left alone.
pub fn strip_fences(text: &str) -> &str {
    let mut s = text.trim();
    loop {
        let before = s;
        if let Some(rest) = strip_opening_fence(s) {
            s = rest.trim_start();
        }
        if let Some(rest) = s.strip_suffix("```") {
            s = rest.trim_end();
        }
        if s == before {
            return s;
        }
    }
}

fn strip_opening_fence(s: &str) -> Option<&str> {
    let rest = s.strip_prefix("```")?;
    match rest.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => Some(&rest[4..]),
        _ => Some(rest),
    }
}

pub fn parse_json(text: &str) -> Result<Value, GenerateError> {
    serde_json::from_str(strip_fences(text))
        .map_err(|e| GenerateError::Parse(format!("generated text is not valid JSON: {e}")))
}

pub fn parse_record(text: &str) -> Result<GeneratedRecord, GenerateError> {
    let value = parse_json(text)?;
    let record: GeneratedRecord = serde_json::from_value(value)
        .map_err(|e| GenerateError::Schema(e.to_string()))?;

    let tag_count = record.tag_list().len();
    if tag_count < MIN_TAGS {
        warn!("⚠️ Generated listing '{}' has only {} tags", record.base_name, tag_count);
    }
    Ok(record)
}
