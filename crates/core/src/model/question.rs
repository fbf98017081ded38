use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── QUESTION TYPE ─────────────────────────────────────────────────────────────
//

/// Kind of question served by the trivia service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Tossup,
    Bonus,
}

impl QuestionType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tossup => "tossup",
            Self::Bonus => "bonus",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tossup" | "tossups" => Ok(Self::Tossup),
            "bonus" | "bonuses" => Ok(Self::Bonus),
            _ => Err(QuestionError::UnknownType(s.to_owned())),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("unknown question type: {0}")]
    UnknownType(String),
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A question record as served by the remote service.
///
/// The record is kept as an opaque JSON object so fields the client never
/// reads survive untouched. Accessors cover the fields the client needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Question(Map<String, Value>);

impl Question {
    #[must_use]
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    #[must_use]
    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    fn str_field(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    fn u64_field(&self, field: &str) -> Option<u64> {
        match self.0.get(field)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn str_list_field(&self, field: &str) -> Option<Vec<&str>> {
        self.0
            .get(field)?
            .as_array()
            .map(|items| items.iter().filter_map(Value::as_str).collect())
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.str_field("_id")
    }

    /// Tossup question text.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.str_field("question")
    }

    /// Tossup answerline.
    #[must_use]
    pub fn answer(&self) -> Option<&str> {
        self.str_field("answer")
    }

    #[must_use]
    pub fn formatted_answer(&self) -> Option<&str> {
        self.str_field("formatted_answer")
    }

    /// Bonus lead-in text.
    #[must_use]
    pub fn leadin(&self) -> Option<&str> {
        self.str_field("leadin")
    }

    /// Bonus part texts.
    #[must_use]
    pub fn parts(&self) -> Option<Vec<&str>> {
        self.str_list_field("parts")
    }

    /// Bonus answerlines, one per part.
    #[must_use]
    pub fn answers(&self) -> Option<Vec<&str>> {
        self.str_list_field("answers")
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.str_field("category")
    }

    #[must_use]
    pub fn subcategory(&self) -> Option<&str> {
        self.str_field("subcategory")
    }

    #[must_use]
    pub fn difficulty(&self) -> Option<u8> {
        self.u64_field("difficulty")
            .and_then(|value| u8::try_from(value).ok())
    }

    #[must_use]
    pub fn year(&self) -> Option<u16> {
        self.u64_field("year")
            .and_then(|value| u16::try_from(value).ok())
    }

    #[must_use]
    pub fn set_name(&self) -> Option<&str> {
        self.str_field("setName")
    }

    #[must_use]
    pub fn packet_number(&self) -> Option<u32> {
        self.u64_field("packetNumber")
            .and_then(|value| u32::try_from(value).ok())
    }

    #[must_use]
    pub fn question_number(&self) -> Option<u32> {
        self.u64_field("questionNumber")
            .and_then(|value| u32::try_from(value).ok())
    }

    /// Copy the formatted answer fields into the canonical answer fields.
    ///
    /// Tossups copy `formatted_answer` into `answer`; bonuses copy
    /// `formatted_answers` into `answers`. Records without the formatted
    /// field are left as they are.
    pub fn normalize(&mut self, question_type: QuestionType) {
        let (from, to) = match question_type {
            QuestionType::Tossup => ("formatted_answer", "answer"),
            QuestionType::Bonus => ("formatted_answers", "answers"),
        };
        if let Some(formatted) = self.0.get(from).cloned() {
            self.0.insert(to.to_owned(), formatted);
        }
    }
}

impl From<Map<String, Value>> for Question {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Normalize every question of a freshly fetched batch.
pub fn normalize_batch(batch: &mut [Question], question_type: QuestionType) {
    for question in batch {
        question.normalize(question_type);
    }
}
