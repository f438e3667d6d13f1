use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::AutomationError;
use crate::pronoun::canonicalize;
use crate::question::Prompt;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ActivityKind {
    Vocabulary,
    Conjugation,
}

/// English prompt to Spanish answer, both trimmed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VocabularyKey {
    pairs: HashMap<String, String>,
}

impl VocabularyKey {
    pub fn new(pairs: HashMap<String, String>) -> Self {
        Self { pairs }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, prompt: &str) -> Option<&str> {
        self.pairs.get(prompt.trim()).map(String::as_str)
    }
}

impl FromIterator<(String, String)> for VocabularyKey {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

/// One verb's chart: forms keyed by the pronoun text printed in the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct VerbRecord {
    pub verb: String,
    pub forms: HashMap<String, String>,
}

impl VerbRecord {
    pub fn new(verb: &str, forms: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            verb: verb.to_lowercase(),
            forms: forms.into_iter().collect(),
        }
    }
}

/// Ground truth scraped from an activity's answer chart.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerKey {
    Vocabulary(VocabularyKey),
    Conjugation(Vec<VerbRecord>),
}

impl AnswerKey {
    pub fn kind(&self) -> ActivityKind {
        match self {
            AnswerKey::Vocabulary(_) => ActivityKind::Vocabulary,
            AnswerKey::Conjugation(_) => ActivityKind::Conjugation,
        }
    }

    /// Number of prompts (vocabulary) or verbs (conjugation) in the key.
    pub fn len(&self) -> usize {
        match self {
            AnswerKey::Vocabulary(key) => key.len(),
            AnswerKey::Conjugation(verbs) => verbs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up the correct answer for the prompt currently on screen.
    pub fn resolve(&self, prompt: &Prompt) -> Result<&str, AutomationError> {
        match (self, prompt) {
            (AnswerKey::Vocabulary(key), Prompt::Vocabulary { question }) => key
                .get(question)
                .ok_or_else(|| AutomationError::UnknownPrompt(question.clone())),
            (AnswerKey::Conjugation(verbs), Prompt::Conjugation { verb, pronoun }) => {
                resolve_conjugation(verbs, verb, pronoun)
            }
            (_, prompt) => Err(AutomationError::UnknownPrompt(prompt.to_string())),
        }
    }
}

fn resolve_conjugation<'a>(
    verbs: &'a [VerbRecord],
    verb: &str,
    subject: &str,
) -> Result<&'a str, AutomationError> {
    let verb = verb.trim().to_lowercase();
    let record = verbs
        .iter()
        .find(|r| r.verb == verb)
        .ok_or_else(|| AutomationError::UnknownPrompt(format!("{subject} / {verb}")))?;

    record
        .forms
        .get(&canonicalize(subject))
        .map(String::as_str)
        .ok_or_else(|| AutomationError::UnknownPrompt(format!("{subject} / {verb}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn forms(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(p, f)| (p.to_string(), f.to_string()))
            .collect()
    }

    fn hablar_and_comer() -> AnswerKey {
        AnswerKey::Conjugation(vec![
            VerbRecord::new(
                "HABLAR",
                forms(&[("yo", "hablo"), ("él", "habla"), ("nosotros", "hablamos"), ("ellos", "hablan")]),
            ),
            VerbRecord::new(
                "comer",
                forms(&[("yo", "como"), ("él", "come"), ("nosotros", "comemos"), ("ellos", "comen")]),
            ),
        ])
    }

    #[test]
    fn vocabulary_lookup_trims_prompt() {
        let key = AnswerKey::Vocabulary(
            [("dog".to_string(), "perro".to_string())].into_iter().collect(),
        );
        let prompt = Prompt::Vocabulary {
            question: " dog ".into(),
        };
        assert_eq!(key.resolve(&prompt).unwrap(), "perro");
        assert_eq!(key.kind(), ActivityKind::Vocabulary);
    }

    #[test]
    fn vocabulary_miss_is_unknown_prompt() {
        let key = AnswerKey::Vocabulary(VocabularyKey::default());
        let prompt = Prompt::Vocabulary {
            question: "cat".into(),
        };
        assert_matches!(key.resolve(&prompt), Err(AutomationError::UnknownPrompt(q)) if q == "cat");
    }

    #[test]
    fn conjugation_resolves_through_pronoun_canonicalization() {
        let key = hablar_and_comer();
        let ask = |verb: &str, pronoun: &str| {
            key.resolve(&Prompt::Conjugation {
                verb: verb.into(),
                pronoun: pronoun.into(),
            })
            .map(str::to_string)
        };

        assert_eq!(ask("hablar", "yo").unwrap(), "hablo");
        assert_eq!(ask("comer", "Juan y yo").unwrap(), "comemos");
        assert_eq!(ask("comer", "Juan y María").unwrap(), "comen");
        assert_eq!(ask("hablar", "María").unwrap(), "habla");
    }

    #[test]
    fn conjugation_unknown_verb_or_pronoun() {
        let key = hablar_and_comer();
        assert_matches!(
            key.resolve(&Prompt::Conjugation {
                verb: "vivir".into(),
                pronoun: "yo".into(),
            }),
            Err(AutomationError::UnknownPrompt(_))
        );
        assert_matches!(
            key.resolve(&Prompt::Conjugation {
                verb: "hablar".into(),
                pronoun: "vosotros".into(),
            }),
            Err(AutomationError::UnknownPrompt(_))
        );
    }

    #[test]
    fn mismatched_prompt_kind_is_unknown() {
        let key = hablar_and_comer();
        assert_matches!(
            key.resolve(&Prompt::Vocabulary {
                question: "dog".into(),
            }),
            Err(AutomationError::UnknownPrompt(_))
        );
    }
}
