//! Handoff of a finished estimate pair from the secondary acquisition to the
//! primary
//!
//! One [`PeerHandoff`] serves one pair of acquisitions. The secondary writes it
//! once through a [`PublishGuard`]; the primary takes the payload once. The
//! state moves `Idle -> SecondaryRunning -> SecondaryReady -> Consumed`, or to
//! `Failed` when the secondary gives up (or unwinds) before publishing, so the
//! primary is never left waiting on a peer that will not arrive.

use crate::spectrum::EstimatePair;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;

/// Externally visible handoff state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffPhase {
    Idle,
    SecondaryRunning,
    SecondaryReady,
    Failed,
    Consumed,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HandoffError {
    #[error("peer acquisition failed: {0}")]
    PeerFailed(String),

    #[error("peer acquisition not ready after {0:?}")]
    TimedOut(Duration),

    #[error("peer estimate already consumed")]
    AlreadyConsumed,
}

enum HandoffState {
    Idle,
    SecondaryRunning,
    SecondaryReady(EstimatePair),
    Failed(String),
    Consumed,
}

impl HandoffState {
    fn is_pending(&self) -> bool {
        matches!(self, HandoffState::Idle | HandoffState::SecondaryRunning)
    }

    fn phase(&self) -> HandoffPhase {
        match self {
            HandoffState::Idle => HandoffPhase::Idle,
            HandoffState::SecondaryRunning => HandoffPhase::SecondaryRunning,
            HandoffState::SecondaryReady(_) => HandoffPhase::SecondaryReady,
            HandoffState::Failed(_) => HandoffPhase::Failed,
            HandoffState::Consumed => HandoffPhase::Consumed,
        }
    }
}

/// Single-writer, single-reader cell guarded by a mutex/condition pair
pub struct PeerHandoff {
    state: Mutex<HandoffState>,
    ready: Condvar,
}

impl Default for PeerHandoff {
    fn default() -> Self {
        Self::new()
    }
}

impl PeerHandoff {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HandoffState::Idle),
            ready: Condvar::new(),
        }
    }

    // The state is a plain enum; a panic elsewhere cannot leave it half-written
    fn lock(&self) -> MutexGuard<'_, HandoffState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn phase(&self) -> HandoffPhase {
        self.lock().phase()
    }

    /// Whether nothing has been published or failed yet
    pub fn is_pending(&self) -> bool {
        self.lock().is_pending()
    }

    /// Mark the secondary as running and hand it the write side
    pub fn begin(&self) -> PublishGuard<'_> {
        {
            let mut state = self.lock();
            if matches!(*state, HandoffState::Idle) {
                *state = HandoffState::SecondaryRunning;
            }
        }
        PublishGuard {
            handoff: self,
            settled: false,
        }
    }

    fn settle(&self, next: HandoffState) {
        let mut state = self.lock();
        if state.is_pending() {
            *state = next;
        }
        drop(state);
        self.ready.notify_all();
    }

    /// Block until the secondary publishes or fails, then take its estimate
    ///
    /// # Arguments
    /// * `timeout` - Upper bound on the wait; `None` waits indefinitely
    pub fn wait_for_peer(&self, timeout: Option<Duration>) -> Result<EstimatePair, HandoffError> {
        let guard = self.lock();
        let mut state = match timeout {
            Some(limit) => {
                let (state, _) = self
                    .ready
                    .wait_timeout_while(guard, limit, |s| s.is_pending())
                    .unwrap_or_else(PoisonError::into_inner);
                if state.is_pending() {
                    return Err(HandoffError::TimedOut(limit));
                }
                state
            }
            None => self
                .ready
                .wait_while(guard, |s| s.is_pending())
                .unwrap_or_else(PoisonError::into_inner),
        };

        match std::mem::replace(&mut *state, HandoffState::Consumed) {
            HandoffState::SecondaryReady(pair) => Ok(pair),
            HandoffState::Failed(reason) => {
                *state = HandoffState::Failed(reason.clone());
                Err(HandoffError::PeerFailed(reason))
            }
            HandoffState::Consumed => Err(HandoffError::AlreadyConsumed),
            // Excluded by the wait predicate
            pending @ (HandoffState::Idle | HandoffState::SecondaryRunning) => {
                *state = pending;
                Err(HandoffError::TimedOut(timeout.unwrap_or_default()))
            }
        }
    }
}

/// Write side of a [`PeerHandoff`], held by the secondary pipeline
///
/// Dropping it without publishing fails the handoff.
pub struct PublishGuard<'a> {
    handoff: &'a PeerHandoff,
    settled: bool,
}

impl PublishGuard<'_> {
    /// Store the estimate pair and wake the primary
    pub fn publish(mut self, pair: EstimatePair) {
        self.settled = true;
        self.handoff.settle(HandoffState::SecondaryReady(pair));
    }

    /// Record why no estimate will arrive and wake the primary
    pub fn fail(mut self, reason: impl Into<String>) {
        self.settled = true;
        self.handoff.settle(HandoffState::Failed(reason.into()));
    }
}

impl Drop for PublishGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.handoff.settle(HandoffState::Failed(
                "secondary acquisition exited without publishing".to_string(),
            ));
        }
    }
}
