//! Extraction and validation of the model's four-field answer.

use std::str::FromStr;

use serde_json::{Map, Value};
use shared::dto::{ModelAnswer, Priority};
use thiserror::Error;

use crate::fenced_json::parse_fenced_json;
use crate::prompt::{
    OFFICIAL_SUMMARY_FIELD, PRIORITY_FIELD, RECOMMENDATION_FIELD, SHORT_ANSWER_FIELD,
};

/// Spelling used by earlier prompt revisions.
const LEGACY_OFFICIAL_SUMMARY_FIELD: &str = "offisial_summary";

const CONTENT_TEXT_POINTER: &str = "/output/message/content/0/text";

#[derive(Debug, Error)]
pub enum AnswerError {
    #[error("response has no text at output.message.content[0].text")]
    MissingContent,
    #[error("answer text is not JSON: {0}")]
    NotJson(#[from] serde_json::Error),
    #[error("answer is not a JSON object")]
    NotAnObject,
    #[error("incomplete answer, missing: {}", .missing.join(", "))]
    Incomplete { missing: Vec<&'static str> },
    #[error("field {field} must be text, got {value}")]
    WrongType { field: &'static str, value: Value },
    #[error("suggested priority is not one of 1-4: {0}")]
    InvalidPriority(Value),
}

/// Text of the first content item of the model response.
pub fn answer_text(raw: &Value) -> Result<&str, AnswerError> {
    raw.pointer(CONTENT_TEXT_POINTER)
        .and_then(Value::as_str)
        .map(str::trim)
        .ok_or(AnswerError::MissingContent)
}

/// Turn a raw model response into a complete [`ModelAnswer`].
pub fn parse_answer(raw: &Value) -> Result<ModelAnswer, AnswerError> {
    let Value::Object(fields) = parse_fenced_json(answer_text(raw)?)? else {
        return Err(AnswerError::NotAnObject);
    };

    let summary_key = if is_present(fields.get(OFFICIAL_SUMMARY_FIELD)) {
        OFFICIAL_SUMMARY_FIELD
    } else {
        LEGACY_OFFICIAL_SUMMARY_FIELD
    };

    let missing: Vec<&'static str> = [
        (RECOMMENDATION_FIELD, RECOMMENDATION_FIELD),
        (SHORT_ANSWER_FIELD, SHORT_ANSWER_FIELD),
        (OFFICIAL_SUMMARY_FIELD, summary_key),
        (PRIORITY_FIELD, PRIORITY_FIELD),
    ]
    .into_iter()
    .filter(|(_, key)| !is_present(fields.get(*key)))
    .map(|(name, _)| name)
    .collect();
    if !missing.is_empty() {
        return Err(AnswerError::Incomplete { missing });
    }

    Ok(ModelAnswer {
        recommendation: text_field(&fields, RECOMMENDATION_FIELD, RECOMMENDATION_FIELD)?,
        short_answer: text_field(&fields, SHORT_ANSWER_FIELD, SHORT_ANSWER_FIELD)?,
        official_summary: text_field(&fields, summary_key, OFFICIAL_SUMMARY_FIELD)?,
        priority: priority(&fields[PRIORITY_FIELD])?,
    })
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

fn text_field(
    fields: &Map<String, Value>,
    key: &str,
    name: &'static str,
) -> Result<String, AnswerError> {
    match &fields[key] {
        Value::String(s) => Ok(s.clone()),
        other => Err(AnswerError::WrongType {
            field: name,
            value: other.clone(),
        }),
    }
}

fn priority(value: &Value) -> Result<Priority, AnswerError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().and_then(Priority::from_id),
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(id) => Priority::from_id(id),
                Err(_) => Priority::from_str(s).ok(),
            }
        }
        _ => None,
    };
    parsed.ok_or_else(|| AnswerError::InvalidPriority(value.clone()))
}
