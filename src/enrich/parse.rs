//! Result parser: raw service text to structured enrichment fields
//!
//! Parsing never fails a record. Output that cannot be fully interpreted is
//! degraded: whatever fields can be recovered are kept, the rest stay blank.
//! The degrade is an explicit `ParseOutcome` variant so callers can count it.

use super::types::{EnrichmentFields, EnrichmentResult};
use serde_json::{Map, Value};

/// Why a response could not be fully interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAnomaly {
    /// Nothing resembling a JSON object was found
    NoJsonObject,
    /// A JSON object was found but carried none of the expected keys
    NoKnownFields,
    /// The response was empty or whitespace
    EmptyResponse,
}

impl std::fmt::Display for ParseAnomaly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoJsonObject => write!(f, "no JSON object in response"),
            Self::NoKnownFields => write!(f, "JSON object has no summary/hypotheses/methods/findings keys"),
            Self::EmptyResponse => write!(f, "empty response"),
        }
    }
}

/// The parser's verdict on one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// A JSON object with at least one known field was found
    Structured(EnrichmentFields),
    /// Partial or no recovery; missing fields are blank
    Degraded {
        fields: EnrichmentFields,
        anomaly: ParseAnomaly,
    },
}

impl ParseOutcome {
    pub fn fields(&self) -> &EnrichmentFields {
        match self {
            Self::Structured(fields) => fields,
            Self::Degraded { fields, .. } => fields,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

impl From<ParseOutcome> for EnrichmentResult {
    fn from(outcome: ParseOutcome) -> Self {
        match outcome {
            ParseOutcome::Structured(fields) => EnrichmentResult::Success(fields),
            ParseOutcome::Degraded { fields, .. } => EnrichmentResult::Success(fields),
        }
    }
}

/// Accepted key spellings per field, most preferred first. Compared
/// case-insensitively.
const SUMMARY_KEYS: &[&str] = &["summary"];
const HYPOTHESES_KEYS: &[&str] = &["hypotheses", "hypothesis"];
const METHODS_KEYS: &[&str] = &["methods", "method", "methodology"];
const FINDINGS_KEYS: &[&str] = &["findings", "finding", "results", "result"];

/// Interpret raw service output as enrichment fields.
pub fn parse_response(raw: &str) -> ParseOutcome {
    if raw.trim().is_empty() {
        return ParseOutcome::Degraded {
            fields: EnrichmentFields::new(),
            anomaly: ParseAnomaly::EmptyResponse,
        };
    }

    match extract_json(raw) {
        Some(Value::Object(map)) => {
            let fields = fields_from_object(&map);
            if fields.is_empty() {
                ParseOutcome::Degraded {
                    fields,
                    anomaly: ParseAnomaly::NoKnownFields,
                }
            } else {
                ParseOutcome::Structured(fields)
            }
        }
        _ => ParseOutcome::Degraded {
            fields: fields_from_labeled_lines(raw),
            anomaly: ParseAnomaly::NoJsonObject,
        },
    }
}

/// Shorthand for `parse_response(raw).into()`.
pub fn parse(raw: &str) -> EnrichmentResult {
    parse_response(raw).into()
}

/// Find the JSON object in a chat answer.
///
/// Tried in order: the whole answer, the first fenced block (any language
/// tag, including none), then the span from the first `{` to the last `}`.
/// Only objects count; a bare array or string is treated as no JSON.
fn extract_json(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    let as_object = |candidate: &str| {
        serde_json::from_str::<Value>(candidate.trim())
            .ok()
            .filter(Value::is_object)
    };

    as_object(trimmed)
        .or_else(|| fenced_block(trimmed).and_then(as_object))
        .or_else(|| {
            let start = trimmed.find('{')?;
            let end = trimmed.rfind('}')?;
            (start < end).then(|| &trimmed[start..=end]).and_then(as_object)
        })
}

/// Body of the first ``` fence, skipping the language tag on its opening line.
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_ticks = &text[open + 3..];
    let body_start = after_ticks.find('\n')? + 1;
    let body = &after_ticks[body_start..];
    body.find("```").map(|close| &body[..close])
}

/// Pick each field from the first accepted key, in priority order, that
/// carries usable text.
fn fields_from_object(map: &Map<String, Value>) -> EnrichmentFields {
    let lookup = |keys: &[&str]| {
        keys.iter().find_map(|key| {
            map.iter()
                .filter(|(k, _)| k.trim().eq_ignore_ascii_case(key))
                .find_map(|(_, v)| value_text(v))
        })
    };

    EnrichmentFields {
        summary: lookup(SUMMARY_KEYS),
        hypotheses: lookup(HYPOTHESES_KEYS),
        methods: lookup(METHODS_KEYS),
        findings: lookup(FINDINGS_KEYS),
    }
}

/// Flatten a JSON value into cell text. Null and empty values count as absent.
fn value_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(value_text)
            .collect::<Vec<_>>()
            .join("; "),
        Value::Object(_) => value.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

/// Recover `Label: text` lines from prose output.
fn fields_from_labeled_lines(raw: &str) -> EnrichmentFields {
    let mut fields = EnrichmentFields::new();

    for line in raw.lines() {
        let line = line.trim().trim_start_matches(['-', '*', '#']).trim();
        let Some((label, text)) = line.split_once(':') else {
            continue;
        };
        let label = label.trim().trim_matches('*').trim();
        let text = text.trim().trim_matches('*').trim();
        if text.is_empty() {
            continue;
        }

        let slot = if SUMMARY_KEYS.iter().any(|k| label.eq_ignore_ascii_case(k)) {
            &mut fields.summary
        } else if HYPOTHESES_KEYS.iter().any(|k| label.eq_ignore_ascii_case(k)) {
            &mut fields.hypotheses
        } else if METHODS_KEYS.iter().any(|k| label.eq_ignore_ascii_case(k)) {
            &mut fields.methods
        } else if FINDINGS_KEYS.iter().any(|k| label.eq_ignore_ascii_case(k)) {
            &mut fields.findings
        } else {
            continue;
        };

        if slot.is_none() {
            *slot = Some(text.to_string());
        }
    }

    fields
}
