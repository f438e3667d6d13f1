//! Reads an activity's answer chart into an [`AnswerKey`].
//!
//! Cell pairing is positional: the vocabulary table alternates English and
//! Spanish cells, and each verb block lists pronoun cells and conjugated
//! cells in parallel. Nothing checks that the ordinals line up, so a
//! malformed chart yields a wrong or partial key rather than an error.

use itertools::Itertools;
use tracing::debug;

use crate::answer_key::{ActivityKind, AnswerKey, VerbRecord, VocabularyKey};
use crate::driver::{BrowserDriver, Locator};
use crate::error::AutomationError;
use crate::site;

/// The driver must already be on the activity's chart page.
pub fn extract<D: BrowserDriver + ?Sized>(
    driver: &mut D,
    kind: ActivityKind,
) -> Result<AnswerKey, AutomationError> {
    let key = match kind {
        ActivityKind::Vocabulary => AnswerKey::Vocabulary(extract_vocabulary(driver)?),
        ActivityKind::Conjugation => AnswerKey::Conjugation(extract_conjugation(driver)?),
    };
    debug!(%kind, entries = key.len(), "answer key extracted");
    Ok(key)
}

pub fn extract_vocabulary<D: BrowserDriver + ?Sized>(
    driver: &mut D,
) -> Result<VocabularyKey, AutomationError> {
    let table = driver.find(&Locator::css(site::VOCAB_TABLE))?;
    let cells = driver.find_all_within(&table, &Locator::css(site::VOCAB_CELL))?;
    if cells.is_empty() {
        return Err(AutomationError::StructureMissing(format!(
            "{} {}",
            site::VOCAB_TABLE,
            site::VOCAB_CELL
        )));
    }
    let texts = texts_of(driver, &cells)?;
    Ok(pair_vocabulary_cells(&texts))
}

pub fn extract_conjugation<D: BrowserDriver + ?Sized>(
    driver: &mut D,
) -> Result<Vec<VerbRecord>, AutomationError> {
    let blocks = driver.find_all(&Locator::css(site::VERB_BLOCK))?;
    if blocks.is_empty() {
        return Err(AutomationError::StructureMissing(site::VERB_BLOCK.to_string()));
    }

    let mut verbs = Vec::with_capacity(blocks.len());
    for block in &blocks {
        let label = driver.find_within(block, &Locator::css(site::VERB_LABEL))?;
        let verb = driver.text(&label)?;
        let pronoun_cells = driver.find_all_within(block, &Locator::css(site::PRONOUN_CELL))?;
        let form_cells = driver.find_all_within(block, &Locator::css(site::CONJUGATED_CELL))?;
        let pronouns = texts_of(driver, &pronoun_cells)?;
        let forms = texts_of(driver, &form_cells)?;
        verbs.push(VerbRecord::new(verb.trim(), pronouns.into_iter().zip(forms)));
    }
    Ok(verbs)
}

/// Pairs alternating English/Spanish cells, dropping each cell's `N.`
/// ordinal. A trailing unpaired cell is ignored.
pub fn pair_vocabulary_cells<S: AsRef<str>>(cells: &[S]) -> VocabularyKey {
    cells
        .iter()
        .map(|c| strip_ordinal(c.as_ref()).to_string())
        .tuples::<(String, String)>()
        .collect()
}

/// `"12. perro "` becomes `"perro"`; text without a period is only trimmed.
pub fn strip_ordinal(cell: &str) -> &str {
    cell.split_once('.').map_or(cell, |(_, rest)| rest).trim()
}

fn texts_of<D: BrowserDriver + ?Sized>(
    driver: &mut D,
    elements: &[D::Element],
) -> Result<Vec<String>, AutomationError> {
    elements
        .iter()
        .map(|e| driver.text(e).map_err(AutomationError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_four_cells() {
        let key = pair_vocabulary_cells(&["1. dog", "1. perro", "2. cat", "2. gato"]);
        assert_eq!(key.len(), 2);
        assert_eq!(key.get("dog"), Some("perro"));
        assert_eq!(key.get("cat"), Some("gato"));
    }

    #[test]
    fn odd_trailing_cell_is_dropped() {
        let key = pair_vocabulary_cells(&["1. dog", "1. perro", "2. cat"]);
        assert_eq!(key.len(), 1);
        assert_eq!(key.get("cat"), None);
    }

    #[test]
    fn strip_ordinal_cases() {
        assert_eq!(strip_ordinal("3. the house"), "the house");
        assert_eq!(strip_ordinal("  casa  "), "casa");
        assert_eq!(strip_ordinal("10.la casa."), "la casa.");
    }
}
