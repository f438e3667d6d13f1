//! The pacing loop: answers one question per `seconds_per_word`, choosing
//! between the true answer and a deliberate miss so the realized accuracy
//! stays at or under the target, and reports progress every tick until the
//! time limit passes.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::answer_key::AnswerKey;
use crate::config::ActivityConfig;
use crate::error::{AutomationError, DriverError};
use crate::finalize::{finalize, RetryPolicy};
use crate::progress::{ProgressSink, ProgressSnapshot};
use crate::question::{FinishLine, QuestionSource};
use crate::runtime::{Clock, FixedTicker, StopHandle, SystemClock, Ticker};

pub const TICK_RATE_MS: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    AnswerCorrectly,
    AnswerWrong,
}

/// Answers wrong when a correct answer now would put
/// `correct / (answered + 1)` above the target. The denominator counts the
/// question about to be answered, while the numerator does not yet.
pub fn decide(correct: u32, answered: u32, target_percent: u32) -> Decision {
    // correct / (answered + 1) > target / 100, in integers
    if u64::from(correct) * 100 > u64::from(target_percent) * (u64::from(answered) + 1) {
        Decision::AnswerWrong
    } else {
        Decision::AnswerCorrectly
    }
}

/// The sentinel submitted for a deliberate miss (1-based question number).
pub fn deliberate_wrong(question_index: u32) -> String {
    format!("wrong {}", question_index + 1)
}

/// Counters for one run. `correct_count <= question_index` always holds.
#[derive(Debug, Clone, PartialEq)]
pub struct RunState {
    question_index: u32,
    correct_count: u32,
    last_action: Option<Duration>,
    run_start: Duration,
}

impl RunState {
    pub fn new(run_start: Duration) -> Self {
        Self {
            question_index: 0,
            correct_count: 0,
            last_action: None,
            run_start,
        }
    }

    pub fn question_index(&self) -> u32 {
        self.question_index
    }

    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    fn eligible(&self, now: Duration, config: &ActivityConfig) -> bool {
        self.question_index < config.word_target()
            && self
                .last_action
                .map_or(true, |last| now.saturating_sub(last) >= config.answer_interval())
    }

    fn record(&mut self, correct: bool, now: Duration) {
        self.question_index += 1;
        if correct {
            self.correct_count += 1;
        }
        self.last_action = Some(now);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    /// The time limit passed.
    TimeUp,
    /// The stop handle was triggered.
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub questions_answered: u32,
    pub correct_answers: u32,
    pub end: RunEnd,
    pub score_recorded: bool,
}

impl RunReport {
    pub fn percent_correct(&self) -> Option<u32> {
        ProgressSnapshot::new(0, self.questions_answered, self.correct_answers).percent_correct
    }
}

pub struct Controller<C: Clock = SystemClock> {
    config: ActivityConfig,
    clock: C,
    ticker: FixedTicker,
    stop: StopHandle,
    retry: RetryPolicy,
}

impl Controller<SystemClock> {
    pub fn new(config: ActivityConfig) -> Self {
        Self::with_clock(config, SystemClock::new())
    }
}

impl<C: Clock> Controller<C> {
    pub fn with_clock(config: ActivityConfig, clock: C) -> Self {
        Self {
            config,
            clock,
            ticker: FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
            stop: StopHandle::new(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_ticker(mut self, ticker: FixedTicker) -> Self {
        self.ticker = ticker;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    pub fn config(&self) -> &ActivityConfig {
        &self.config
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Runs the pacing loop, then records the score when auto-submit is on.
    pub fn run<Q, S>(
        &self,
        key: &AnswerKey,
        source: &mut Q,
        sink: &mut S,
    ) -> Result<RunReport, AutomationError>
    where
        Q: QuestionSource + FinishLine + ?Sized,
        S: ProgressSink + ?Sized,
    {
        let mut report = self.start(key, source, sink)?;
        if self.config.auto_submit() && report.end == RunEnd::TimeUp {
            finalize(source, &self.clock, &self.retry)?;
            report.score_recorded = true;
        }
        Ok(report)
    }

    /// Runs the pacing loop until the time limit passes or the stop handle
    /// fires.
    pub fn start<Q, S>(
        &self,
        key: &AnswerKey,
        source: &mut Q,
        sink: &mut S,
    ) -> Result<RunReport, AutomationError>
    where
        Q: QuestionSource + ?Sized,
        S: ProgressSink + ?Sized,
    {
        match source.prompt() {
            Err(err) if !err.is_transient() => return Err(err.into()),
            _ => {}
        }

        let mut state = RunState::new(self.clock.now());
        info!(
            kind = %key.kind(),
            minutes = self.config.time_limit_minutes(),
            words = self.config.word_target(),
            percent = self.config.target_percent(),
            "pacing started"
        );

        let end = loop {
            if self.stop.is_stopped() {
                break RunEnd::Stopped;
            }
            let now = self.clock.now();

            match self.act(key, source, &mut state, now) {
                Ok(()) => {}
                Err(err) if err.is_transient() => {
                    debug!(%err, "transient interaction failure, retrying");
                    // a drill page that locks up at the end must not outlive the timer
                    if now.saturating_sub(state.run_start) > self.config.time_limit() {
                        break RunEnd::TimeUp;
                    }
                    self.clock.sleep(self.ticker.interval());
                    continue;
                }
                Err(err) => return Err(err.into()),
            }

            let elapsed = now.saturating_sub(state.run_start);
            if elapsed > self.config.time_limit() {
                break RunEnd::TimeUp;
            }
            let time_left = self.config.time_limit().as_secs() - elapsed.as_secs();
            sink.report(ProgressSnapshot::new(
                time_left,
                state.question_index,
                state.correct_count,
            ));

            self.clock.sleep(self.ticker.interval());
        };

        info!(
            answered = state.question_index,
            correct = state.correct_count,
            ?end,
            "pacing finished"
        );
        Ok(RunReport {
            questions_answered: state.question_index,
            correct_answers: state.correct_count,
            end,
            score_recorded: false,
        })
    }

    fn act<Q: QuestionSource + ?Sized>(
        &self,
        key: &AnswerKey,
        source: &mut Q,
        state: &mut RunState,
        now: Duration,
    ) -> Result<(), DriverError> {
        if !state.eligible(now, &self.config) {
            return Ok(());
        }

        let decision = decide(
            state.correct_count,
            state.question_index,
            self.config.target_percent(),
        );
        let (answer, correct) = match decision {
            Decision::AnswerWrong => (deliberate_wrong(state.question_index), false),
            Decision::AnswerCorrectly => {
                let prompt = source.prompt()?;
                match key.resolve(&prompt) {
                    Ok(answer) => (answer.to_string(), true),
                    Err(err) => {
                        warn!(%err, "answering with a miss instead");
                        (deliberate_wrong(state.question_index), false)
                    }
                }
            }
        };

        source.submit(&answer)?;
        state.record(correct, now);
        debug!(
            question = state.question_index,
            correct, "answer submitted"
        );
        Ok(())
    }
}
