use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::error::SessionError;
use crate::runtime::SystemClock;
use crate::shell::Navigator;

/// The steps of an automation session, each run on its own worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Phase {
    Login,
    LoadAnswerKey,
    PrepareHomework,
    Automate,
}

/// Admits one phase at a time. Entering while another phase holds the
/// gate is rejected rather than queued.
#[derive(Debug, Clone, Default)]
pub struct PhaseGate {
    in_flight: Arc<Mutex<Option<Phase>>>,
}

impl PhaseGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self, phase: Phase) -> Result<PhaseGuard, SessionError> {
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = *slot {
            warn!(%phase, %current, "phase rejected, another is in flight");
            return Err(SessionError::Busy(current));
        }
        *slot = Some(phase);
        Ok(PhaseGuard {
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    pub fn current(&self) -> Option<Phase> {
        *self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the gate when dropped, including when the worker panics.
#[derive(Debug)]
pub struct PhaseGuard {
    in_flight: Arc<Mutex<Option<Phase>>>,
}

impl Drop for PhaseGuard {
    fn drop(&mut self) {
        *self.in_flight.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[derive(Debug)]
pub struct PhaseHandle<T> {
    phase: Phase,
    handle: JoinHandle<T>,
}

impl<T> PhaseHandle<T> {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn join(self) -> Result<T, SessionError> {
        self.handle.join().map_err(|_| SessionError::WorkerPanicked)
    }
}

/// Owns the navigator and hands it to one phase worker at a time.
pub struct Session<D, C = SystemClock> {
    navigator: Arc<Mutex<Navigator<D, C>>>,
    gate: PhaseGate,
}

impl<D, C> Session<D, C>
where
    D: Send + 'static,
    C: Send + 'static,
{
    pub fn new(navigator: Navigator<D, C>) -> Self {
        Self {
            navigator: Arc::new(Mutex::new(navigator)),
            gate: PhaseGate::new(),
        }
    }

    pub fn current_phase(&self) -> Option<Phase> {
        self.gate.current()
    }

    /// Runs `work` against the navigator on a worker thread. Fails with
    /// [`SessionError::Busy`] while an earlier phase is still running.
    pub fn spawn_phase<T, F>(&self, phase: Phase, work: F) -> Result<PhaseHandle<T>, SessionError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Navigator<D, C>) -> T + Send + 'static,
    {
        let guard = self.gate.enter(phase)?;
        let navigator = Arc::clone(&self.navigator);
        debug!(%phase, "phase started");
        let handle = thread::spawn(move || {
            let _guard = guard;
            let mut navigator = navigator.lock().unwrap_or_else(PoisonError::into_inner);
            work(&mut navigator)
        });
        Ok(PhaseHandle { phase, handle })
    }

    /// Runs `work` on the calling thread, under the same gate.
    pub fn run_phase<T>(
        &self,
        phase: Phase,
        work: impl FnOnce(&mut Navigator<D, C>) -> T,
    ) -> Result<T, SessionError> {
        let _guard = self.gate.enter(phase)?;
        let mut navigator = self.navigator.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(work(&mut navigator))
    }
}
