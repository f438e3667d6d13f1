use std::fmt;

use crate::error::DriverError;

/// The text fields of the question currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    Vocabulary { question: String },
    Conjugation { verb: String, pronoun: String },
}

impl Prompt {
    /// Named fields, in display order.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        match self {
            Prompt::Vocabulary { question } => vec![("question", question.as_str())],
            Prompt::Conjugation { verb, pronoun } => {
                vec![("pronoun", pronoun.as_str()), ("verb", verb.as_str())]
            }
        }
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prompt::Vocabulary { question } => write!(f, "{question}"),
            Prompt::Conjugation { verb, pronoun } => write!(f, "{pronoun} / {verb}"),
        }
    }
}

/// Where the pacing loop reads questions from and sends answers to.
pub trait QuestionSource {
    fn prompt(&mut self) -> Result<Prompt, DriverError>;

    /// Clears the answer field, types `answer` and presses check.
    fn submit(&mut self, answer: &str) -> Result<(), DriverError>;
}

/// End-of-activity predicates used by auto-submit.
pub trait FinishLine {
    /// True once the activity shows its final score.
    fn is_finished(&mut self) -> Result<bool, DriverError>;

    /// Attempts to record the score; `Ok(false)` means "not yet".
    fn record_score(&mut self) -> Result<bool, DriverError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conjugation_fields_are_named() {
        let prompt = Prompt::Conjugation {
            verb: "comer".into(),
            pronoun: "yo".into(),
        };
        assert_eq!(prompt.fields(), vec![("pronoun", "yo"), ("verb", "comer")]);
        assert_eq!(prompt.to_string(), "yo / comer");
    }
}
