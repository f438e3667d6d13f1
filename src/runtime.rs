use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::KeyEvent;

use crate::error::AutomationError;
use crate::pacing::RunReport;
use crate::progress::ProgressSnapshot;

/// Monotonic time plus the ability to wait on it.
pub trait Clock: Send {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;

    fn sleep(&self, duration: Duration);
}

/// Wall clock measured from construction.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration)
    }
}

/// Clock that only moves when told to. Sleeping advances it instantly,
/// so timed loops run to completion without waiting. Clones share time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    micros: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, duration: Duration) {
        self.micros
            .fetch_add(duration.as_micros() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_micros(self.micros.load(Ordering::SeqCst))
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Cooperative early-abort flag, checked once per pacing tick.
#[derive(Clone, Debug, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Events consumed by the display loop.
#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Progress(ProgressSnapshot),
    Finished(Result<RunReport, AutomationError>),
    Tick,
    /// Every sender is gone; nothing more will arrive.
    Closed,
}

/// Runner that hands the display loop one event at a time, `Tick` when
/// nothing arrived within the ticker's interval, or `Closed` once every
/// sender has been dropped.
pub struct Runner<T: Ticker> {
    events: Receiver<AppEvent>,
    ticker: T,
}

impl<T: Ticker> Runner<T> {
    pub fn new(events: Receiver<AppEvent>, ticker: T) -> Self {
        Self { events, ticker }
    }

    pub fn step(&self) -> AppEvent {
        match self.events.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => AppEvent::Tick,
            Err(RecvTimeoutError::Disconnected) => AppEvent::Closed,
        }
    }

    /// The outcome still queued by a worker that has already exited. `None`
    /// means it exited without reporting one.
    pub fn take_finished(&self) -> Option<Result<RunReport, AutomationError>> {
        self.drain().into_iter().find_map(|ev| match ev {
            AppEvent::Finished(result) => Some(result),
            _ => None,
        })
    }

    /// Everything already queued, without waiting.
    pub fn drain(&self) -> Vec<AppEvent> {
        self.events.try_iter().collect()
    }
}
