use std::sync::mpsc::Sender;

use serde::Serialize;

/// One tick's view of a run, emitted to the display side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    /// Seconds part of the time left (0-59).
    pub seconds_left: u32,
    pub minutes_left: u32,
    pub questions_answered: u32,
    pub correct_answers: u32,
    /// Floor of the realized percentage; `None` before the first answer.
    pub percent_correct: Option<u32>,
}

impl ProgressSnapshot {
    pub fn new(time_left_secs: u64, questions_answered: u32, correct_answers: u32) -> Self {
        let percent_correct = (questions_answered > 0)
            .then(|| (100 * u64::from(correct_answers) / u64::from(questions_answered)) as u32);
        Self {
            seconds_left: (time_left_secs % 60) as u32,
            minutes_left: (time_left_secs / 60) as u32,
            questions_answered,
            correct_answers,
            percent_correct,
        }
    }

    /// `m:ss`
    pub fn time_left(&self) -> String {
        format!("{}:{:02}", self.minutes_left, self.seconds_left)
    }

    /// `correct/answered`
    pub fn words(&self) -> String {
        format!("{}/{}", self.correct_answers, self.questions_answered)
    }

    pub fn percent(&self) -> String {
        self.percent_correct
            .map_or_else(|| "-".to_string(), |p| format!("{p}%"))
    }
}

/// Receives a snapshot on every pacing tick, in tick order.
pub trait ProgressSink {
    fn report(&mut self, snapshot: ProgressSnapshot);
}

/// Channel to a display task; a closed channel just drops snapshots.
impl ProgressSink for Sender<ProgressSnapshot> {
    fn report(&mut self, snapshot: ProgressSnapshot) {
        let _ = self.send(snapshot);
    }
}

impl ProgressSink for Vec<ProgressSnapshot> {
    fn report(&mut self, snapshot: ProgressSnapshot) {
        self.push(snapshot);
    }
}

/// Adapts a closure into a sink.
pub struct FnSink<F>(pub F);

impl<F: FnMut(ProgressSnapshot)> ProgressSink for FnSink<F> {
    fn report(&mut self, snapshot: ProgressSnapshot) {
        (self.0)(snapshot)
    }
}
