//! Normalization of the question payload shapes served by the exam backend.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use serde_json::Value;

use exam_core::model::{Question, QuestionId, SubjectId};

use super::source::SourcedExam;
use crate::error::SourceError;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

impl RawId {
    fn parse(self) -> Result<QuestionId, SourceError> {
        match self {
            Self::Number(id) => Ok(QuestionId::new(id)),
            Self::Text(raw) => raw
                .parse()
                .map_err(|err| SourceError::Malformed(format!("question id {raw:?}: {err}"))),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOption {
    Text(String),
    Object {
        option_text: String,
        #[serde(default)]
        is_correct: bool,
    },
}

#[derive(Deserialize)]
struct RawQuestion {
    id: RawId,
    #[serde(alias = "text")]
    question: String,
    options: Vec<RawOption>,
    #[serde(default, alias = "correctOption", alias = "answer")]
    correct_option: Option<String>,
    #[serde(default, alias = "explanation")]
    explain: Option<String>,
}

impl RawQuestion {
    fn into_question(self) -> Result<Question, SourceError> {
        let id = self.id.parse()?;

        let mut flagged = None;
        let options: Vec<String> = self
            .options
            .into_iter()
            .map(|option| match option {
                RawOption::Text(text) => text,
                RawOption::Object {
                    option_text,
                    is_correct,
                } => {
                    if is_correct && flagged.is_none() {
                        flagged = Some(option_text.clone());
                    }
                    option_text
                }
            })
            .collect();

        let correct = self
            .correct_option
            .filter(|value| !value.trim().is_empty())
            .or(flagged)
            .ok_or_else(|| SourceError::Malformed(format!("question {id} has no correct option")))?;

        Question::new(
            id,
            sanitize_html(&self.question),
            options,
            correct,
            self.explain.as_deref().map(sanitize_html),
        )
        .map_err(|err| SourceError::Malformed(format!("question {id}: {err}")))
    }
}

/// Turn a response body into a validated question list.
///
/// Accepts a bare array, or an object carrying a `questions` (preferred) or
/// `results` array plus optional `name` and `duration_minutes`.
///
/// # Errors
///
/// Returns `SourceError::NotFound` for an empty list and
/// `SourceError::Malformed` when the shape is unknown or any entry lacks a
/// required field.
pub fn parse_exam(value: Value) -> Result<SourcedExam, SourceError> {
    let (name, duration_minutes, items) = match value {
        Value::Array(items) => (None, None, items),
        Value::Object(mut map) => {
            let name = map
                .get("name")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string);
            let duration_minutes = map
                .get("duration_minutes")
                .and_then(Value::as_u64)
                .and_then(|minutes| u32::try_from(minutes).ok());
            let items = match (map.remove("questions"), map.remove("results")) {
                (Some(Value::Array(items)), _) | (_, Some(Value::Array(items))) => items,
                _ => {
                    return Err(SourceError::Malformed(
                        "expected a `questions` or `results` array".into(),
                    ));
                }
            };
            (name, duration_minutes, items)
        }
        other => {
            return Err(SourceError::Malformed(format!(
                "expected an array or object, got {}",
                json_kind(&other)
            )));
        }
    };

    if items.is_empty() {
        return Err(SourceError::NotFound);
    }

    let questions = items
        .into_iter()
        .map(|item| {
            serde_json::from_value::<RawQuestion>(item)
                .map_err(|err| SourceError::Malformed(err.to_string()))?
                .into_question()
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SourcedExam {
        name,
        duration_minutes,
        questions,
    })
}

/// Find the display name of `subject_id` in a subject listing.
///
/// The listing is an array or an object with a `results` array; entries match
/// on their `id` whether it is a number or a string, and are named by `name`
/// or `title`.
#[must_use]
pub fn find_subject_name(listing: &Value, subject_id: SubjectId) -> Option<String> {
    let entries = match listing {
        Value::Array(entries) => entries,
        Value::Object(map) => map.get("results")?.as_array()?,
        _ => return None,
    };

    let wanted = subject_id.to_string();
    entries
        .iter()
        .find(|entry| match entry.get("id") {
            Some(Value::Number(id)) => id.to_string() == wanted,
            Some(Value::String(id)) => id.trim() == wanted,
            _ => false,
        })
        .and_then(|entry| {
            ["name", "title"]
                .iter()
                .filter_map(|field| entry.get(*field).and_then(Value::as_str))
                .map(str::trim)
                .find(|name| !name.is_empty())
                .map(str::to_string)
        })
}

/// Restrict question markup to a small inline/formatting subset.
#[must_use]
pub fn sanitize_html(html: &str) -> String {
    let tags: HashSet<&str> = [
        "p", "br", "em", "strong", "b", "i", "u", "sub", "sup", "code", "pre", "ul", "ol", "li",
        "span",
    ]
    .into_iter()
    .collect();

    ammonia::Builder::new()
        .tags(tags)
        .tag_attributes(HashMap::new())
        .clean(html)
        .to_string()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
