use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::answer_key::ActivityKind;
use crate::config::ActivityConfig;
use crate::pacing::RunReport;

/// One finished run, as a row of the history log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub timestamp: DateTime<Local>,
    pub activity: String,
    pub kind: ActivityKind,
    pub minutes: u32,
    pub word_target: u32,
    pub target_percent: u32,
    pub answered: u32,
    pub correct: u32,
    pub percent: Option<u32>,
    pub auto_submitted: bool,
}

impl RunRecord {
    pub fn new(
        activity: &str,
        kind: ActivityKind,
        config: &ActivityConfig,
        report: &RunReport,
    ) -> Self {
        Self {
            timestamp: Local::now(),
            activity: activity.to_string(),
            kind,
            minutes: config.time_limit_minutes(),
            word_target: config.word_target(),
            target_percent: config.target_percent(),
            answered: report.questions_answered,
            correct: report.correct_answers,
            percent: report.percent_correct(),
            auto_submitted: report.score_recorded,
        }
    }
}

/// Append-only CSV log of runs.
#[derive(Debug, Clone)]
pub struct RunHistory {
    path: PathBuf,
}

impl RunHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &RunRecord) -> Result<(), csv::Error> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // a new file starts with the header row
        let needs_header = !self.path.exists();
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;
        Ok(())
    }

    /// All runs, oldest first. A missing log is an empty history.
    pub fn load(&self) -> Result<Vec<RunRecord>, csv::Error> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        csv::Reader::from_path(&self.path)?
            .deserialize()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacing::RunEnd;
    use tempfile::TempDir;

    fn report(answered: u32, correct: u32) -> RunReport {
        RunReport {
            questions_answered: answered,
            correct_answers: correct,
            end: RunEnd::TimeUp,
            score_recorded: true,
        }
    }

    #[test]
    fn missing_log_is_empty() {
        let dir = TempDir::new().unwrap();
        let history = RunHistory::new(dir.path().join("runs.csv"));
        assert!(history.load().unwrap().is_empty());
    }

    #[test]
    fn appended_runs_load_in_order() {
        let dir = TempDir::new().unwrap();
        let history = RunHistory::new(dir.path().join("nested").join("runs.csv"));
        let config = ActivityConfig::new(5, 40, 80, 1.5, true);

        let first = RunRecord::new("La casa", ActivityKind::Vocabulary, &config, &report(10, 8));
        let second = RunRecord::new("Presente -ar", ActivityKind::Conjugation, &config, &report(0, 0));
        history.append(&first).unwrap();
        history.append(&second).unwrap();

        let loaded = history.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].activity, "La casa");
        assert_eq!(loaded[0].percent, Some(80));
        assert_eq!(loaded[0].minutes, 5);
        assert_eq!(loaded[1].kind, ActivityKind::Conjugation);
        assert_eq!(loaded[1].percent, None);
        assert!(loaded[1].auto_submitted);

        let text = std::fs::read_to_string(history.path()).unwrap();
        assert_eq!(text.matches("timestamp").count(), 1);
    }
}
