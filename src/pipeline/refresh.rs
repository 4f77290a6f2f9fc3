//! Single-flight coordination for access-token refresh.
//!
//! DESIGN
//! ======
//! One mutex-guarded struct holds the `refreshing` flag and the ordered
//! wait-list. The first caller to [`RefreshGate::begin`] becomes the leader
//! and receives a [`RefreshLease`]; everyone arriving while the lease is
//! live is queued as a [`RefreshWaiter`]. Settling the lease clears the flag
//! and delivers the same outcome to every waiter in arrival order.
//!
//! The lock is never held across an `.await`. A lease dropped without being
//! settled (leader cancelled mid-refresh) settles itself with
//! [`RefreshError::Abandoned`], so waiters cannot hang and the flag cannot
//! stay stuck.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

use crate::error::RefreshError;

pub type RefreshOutcome = Result<(), RefreshError>;

#[derive(Default)]
struct GateState {
    refreshing: bool,
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

#[derive(Clone, Default)]
pub struct RefreshGate {
    inner: Arc<Mutex<GateState>>,
}

pub enum RefreshTicket {
    /// Caller must perform the refresh and settle the lease.
    Leader(RefreshLease),
    /// A refresh is already running; await its outcome.
    Waiter(RefreshWaiter),
}

pub struct RefreshWaiter {
    rx: oneshot::Receiver<RefreshOutcome>,
}

impl RefreshWaiter {
    /// Wait for the in-flight refresh to settle.
    ///
    /// # Errors
    ///
    /// Returns the refresh error shared by every waiter of that refresh.
    pub async fn wait(self) -> RefreshOutcome {
        self.rx.await.unwrap_or(Err(RefreshError::Abandoned))
    }
}

pub struct RefreshLease {
    gate: RefreshGate,
    settled: bool,
}

impl RefreshLease {
    /// Clear the refreshing flag and wake all queued waiters.
    ///
    /// Returns how many waiters were woken.
    pub fn settle(mut self, outcome: &RefreshOutcome) -> usize {
        self.settled = true;
        self.gate.release(outcome)
    }
}

impl Drop for RefreshLease {
    fn drop(&mut self) {
        if !self.settled {
            let woken = self.gate.release(&Err(RefreshError::Abandoned));
            tracing::warn!(woken, "refresh lease dropped unsettled");
        }
    }
}

impl RefreshGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn begin(&self) -> RefreshTicket {
        let mut state = self.lock();
        if state.refreshing {
            let (tx, rx) = oneshot::channel();
            state.waiters.push(tx);
            tracing::debug!(queued = state.waiters.len(), "request queued behind refresh");
            return RefreshTicket::Waiter(RefreshWaiter { rx });
        }
        state.refreshing = true;
        RefreshTicket::Leader(RefreshLease {
            gate: self.clone(),
            settled: false,
        })
    }

    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.lock().refreshing
    }

    #[must_use]
    pub fn queued(&self) -> usize {
        self.lock().waiters.len()
    }

    fn release(&self, outcome: &RefreshOutcome) -> usize {
        let waiters = {
            let mut state = self.lock();
            state.refreshing = false;
            std::mem::take(&mut state.waiters)
        };
        let count = waiters.len();
        for tx in waiters {
            // A waiter whose caller went away simply misses the outcome.
            let _ = tx.send(outcome.clone());
        }
        count
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "refresh_test.rs"]
mod tests;
