use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use log::trace;

use crate::error::{Error, Result};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Dispatched,
    Published,
}

#[derive(Debug)]
struct State {
    generation: u64,
    phase: Phase,
}

/// Tracks one generation at a time from dispatch to publish.
///
/// Workers count units down on an atomic; only the worker that brings it to
/// zero takes the lock, so the consumer is woken exactly once per generation.
#[derive(Debug)]
pub struct FrameBarrier {
    state: Mutex<State>,
    published: Condvar,
    outstanding: AtomicUsize,
}

impl FrameBarrier {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                generation: 0,
                phase: Phase::Idle,
            }),
            published: Condvar::new(),
            outstanding: AtomicUsize::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Open a new generation of `units` work units.
    pub fn begin(&self, units: usize) -> Result<u64> {
        if units == 0 {
            return Err(Error::invalid_argument("cannot dispatch an empty generation"));
        }
        let mut state = self.lock();
        if state.phase == Phase::Dispatched {
            return Err(Error::invalid_state(format!(
                "generation {} has not drained",
                state.generation
            )));
        }
        state.generation += 1;
        state.phase = Phase::Dispatched;
        self.outstanding.store(units, Ordering::Release);
        Ok(state.generation)
    }

    /// Returns true for the caller that finished the last unit.
    pub fn complete_unit(&self) -> bool {
        self.outstanding.fetch_sub(1, Ordering::AcqRel) == 1
    }

    /// Run `on_publish` and wake the consumer, unless `generation` was
    /// cancelled in the meantime.
    pub fn publish<F: FnOnce()>(&self, generation: u64, on_publish: F) -> bool {
        let mut state = self.lock();
        if state.generation != generation || state.phase != Phase::Dispatched {
            trace!("dropping stale generation {}", generation);
            return false;
        }
        on_publish();
        state.phase = Phase::Published;
        self.published.notify_all();
        true
    }

    /// Block until `generation` publishes, then return to idle.
    pub fn wait(&self, generation: u64) -> Result<()> {
        let mut state = self.lock();
        loop {
            if state.generation != generation {
                return Err(Error::invalid_state(format!(
                    "generation {} was superseded by {}",
                    generation, state.generation
                )));
            }
            match state.phase {
                Phase::Published => {
                    state.phase = Phase::Idle;
                    return Ok(());
                }
                Phase::Idle => {
                    return Err(Error::invalid_state(format!(
                        "generation {} is not in flight",
                        generation
                    )));
                }
                Phase::Dispatched => {
                    state = self
                        .published
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
    }

    /// Like [`wait`](Self::wait) but never blocks. Ok(false) while the
    /// generation is still being computed.
    pub fn poll(&self, generation: u64) -> Result<bool> {
        let mut state = self.lock();
        if state.generation != generation {
            return Err(Error::invalid_state(format!(
                "generation {} was superseded by {}",
                generation, state.generation
            )));
        }
        match state.phase {
            Phase::Published => {
                state.phase = Phase::Idle;
                Ok(true)
            }
            Phase::Dispatched => Ok(false),
            Phase::Idle => Err(Error::invalid_state(format!(
                "generation {} is not in flight",
                generation
            ))),
        }
    }

    /// Abandon whatever is in flight. Late completions are ignored.
    pub fn cancel(&self) {
        let mut state = self.lock();
        state.phase = Phase::Idle;
        self.outstanding.store(0, Ordering::Release);
        self.published.notify_all();
    }
}
