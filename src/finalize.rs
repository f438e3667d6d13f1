//! Auto-submit after the clock runs out: wait for the activity to show its
//! score, then press "Record Score". Both waits are bounded.

use std::time::Duration;

use tracing::{debug, info};

use crate::error::{AutomationError, DriverError};
use crate::question::FinishLine;
use crate::runtime::Clock;

/// Bounded attempts with exponential backoff between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 40,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Delay after the given zero-based failed attempt.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }
}

pub fn finalize<F, C>(finish: &mut F, clock: &C, policy: &RetryPolicy) -> Result<(), AutomationError>
where
    F: FinishLine + ?Sized,
    C: Clock + ?Sized,
{
    let waited = poll_until("the final score", clock, policy, || finish.is_finished())?;
    debug!(attempts = waited, "activity finished");
    let tried = poll_until("score submission", clock, policy, || finish.record_score())?;
    info!(attempts = tried, "score recorded");
    Ok(())
}

/// Calls `check` until it reports true. Transient driver errors count as
/// "not yet"; anything else ends the wait.
fn poll_until<C, P>(
    stage: &'static str,
    clock: &C,
    policy: &RetryPolicy,
    mut check: P,
) -> Result<u32, AutomationError>
where
    C: Clock + ?Sized,
    P: FnMut() -> Result<bool, DriverError>,
{
    for attempt in 0..policy.max_attempts {
        match check() {
            Ok(true) => return Ok(attempt + 1),
            Ok(false) => {}
            Err(err) if err.is_transient() => debug!(%err, stage, "transient failure"),
            Err(err) => return Err(err.into()),
        }
        if attempt + 1 < policy.max_attempts {
            clock.sleep(policy.delay(attempt));
        }
    }
    Err(AutomationError::FinalizeExhausted {
        stage,
        attempts: policy.max_attempts,
    })
}
