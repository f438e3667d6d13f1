use include_dir::{include_dir, Dir};
use serde::Deserialize;

use crate::answer_key::ActivityKind;

static CHART_DIR: Dir = include_dir!("src/rehearsal/charts");

const BASE_URL: &str = "https://conjuguemos.com";

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct SampleVerb {
    pub verb: String,
    pub forms: Vec<(String, String)>,
}

/// One practice activity with its answer chart.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct SampleActivity {
    pub id: u32,
    pub name: String,
    pub kind: ActivityKind,
    #[serde(default)]
    pub vocabulary: Vec<(String, String)>,
    #[serde(default)]
    pub verbs: Vec<SampleVerb>,
}

impl SampleActivity {
    pub fn url(&self) -> String {
        match self.kind {
            ActivityKind::Vocabulary => format!("{BASE_URL}/vocabulary/{}", self.id),
            ActivityKind::Conjugation => format!("{BASE_URL}/verb/{}", self.id),
        }
    }

    pub fn chart_url(&self) -> String {
        match self.kind {
            ActivityKind::Vocabulary => format!("{BASE_URL}/vocabulary/vocab_chart/{}", self.id),
            ActivityKind::Conjugation => format!("{BASE_URL}/verb/verb_chart/{}", self.id),
        }
    }

    pub fn homework_url(&self) -> String {
        match self.kind {
            ActivityKind::Vocabulary => format!("{BASE_URL}/vocabulary/homework/{}", self.id),
            ActivityKind::Conjugation => format!("{BASE_URL}/verb/homework/{}", self.id),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Catalog {
    activities: Vec<SampleActivity>,
}

impl Catalog {
    pub fn new(activities: Vec<SampleActivity>) -> Self {
        Self { activities }
    }

    /// The practice charts bundled into the binary, ordered by id.
    pub fn embedded() -> Result<Self, serde_json::Error> {
        let mut activities = CHART_DIR
            .files()
            .filter(|f| f.path().extension().is_some_and(|e| e == "json"))
            .filter_map(|f| f.contents_utf8())
            .map(serde_json::from_str::<SampleActivity>)
            .collect::<Result<Vec<_>, _>>()?;
        activities.sort_by_key(|a| a.id);
        Ok(Self { activities })
    }

    pub fn activities(&self) -> &[SampleActivity] {
        &self.activities
    }

    pub fn first_of(&self, kind: ActivityKind) -> Option<&SampleActivity> {
        self.activities.iter().find(|a| a.kind == kind)
    }

    /// The activity whose activity, chart or homework page `url` is.
    pub fn by_url(&self, url: &str) -> Option<&SampleActivity> {
        self.activities
            .iter()
            .find(|a| a.url() == url || a.chart_url() == url || a.homework_url() == url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_catalog_has_both_kinds() {
        let catalog = Catalog::embedded().unwrap();
        let vocab = catalog.first_of(ActivityKind::Vocabulary).unwrap();
        let verbs = catalog.first_of(ActivityKind::Conjugation).unwrap();
        assert!(!vocab.vocabulary.is_empty());
        assert!(!verbs.verbs.is_empty());
        assert!(verbs.verbs.iter().all(|v| v.forms.len() == 6));
    }

    #[test]
    fn urls_resolve_back_to_activity() {
        let catalog = Catalog::embedded().unwrap();
        let activity = catalog.first_of(ActivityKind::Conjugation).unwrap();
        assert_eq!(catalog.by_url(&activity.url()), Some(activity));
        assert_eq!(catalog.by_url(&activity.chart_url()), Some(activity));
        assert_eq!(catalog.by_url(&activity.homework_url()), Some(activity));
        assert_eq!(catalog.by_url("https://conjuguemos.com/verb/0"), None);
    }
}
