use serde::{Deserialize, Serialize};
use std::fmt;

/// Verdict returned by the answer-checking service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Directive {
    Accept,
    Prompt,
    Reject,
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Accept => "accept",
            Self::Prompt => "prompt",
            Self::Reject => "reject",
        })
    }
}

/// Outcome of checking a given answer against an answerline.
///
/// On the wire this is the pair `[directive, directedPrompt]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(Directive, Option<String>)", into = "(Directive, Option<String>)")]
pub struct AnswerCheck {
    pub directive: Directive,
    pub directed_prompt: Option<String>,
}

impl AnswerCheck {
    #[must_use]
    pub fn new(directive: Directive, directed_prompt: Option<String>) -> Self {
        Self {
            directive,
            directed_prompt,
        }
    }

    #[must_use]
    pub fn is_accept(&self) -> bool {
        self.directive == Directive::Accept
    }
}

impl From<(Directive, Option<String>)> for AnswerCheck {
    fn from((directive, directed_prompt): (Directive, Option<String>)) -> Self {
        Self::new(directive, directed_prompt)
    }
}

impl From<AnswerCheck> for (Directive, Option<String>) {
    fn from(check: AnswerCheck) -> Self {
        (check.directive, check.directed_prompt)
    }
}
