//! Single-flight refresh coordination.
//!
//! The coordinator owns the `refreshing` flag and the FIFO queue of callers
//! that hit a session-expiry while a refresh was already in flight. It never
//! performs I/O itself: the gateway asks it for admission, runs the refresh
//! when it is told to lead, and hands the refresh outcome to every queued
//! caller when the refresh settles. Each caller then replays its own request.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use tokio::sync::oneshot;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::credential::Credential;
use crate::models::request::RequestDescriptor;

/// A caller deferred behind an in-flight refresh.
///
/// Settled exactly once, with either the refreshed credential or the refresh
/// error.
#[derive(Debug)]
pub struct PendingRequest {
    pub request_id: Uuid,
    pub path: String,
    reply: oneshot::Sender<Result<Credential>>,
}

impl PendingRequest {
    /// Deliver the refresh outcome to the waiting caller.
    ///
    /// A caller that stopped waiting is ignored.
    pub fn settle(self, outcome: Result<Credential>) {
        if self.reply.send(outcome).is_err() {
            debug!(request_id = %self.request_id, "Queued caller went away before settlement");
        }
    }
}

/// Answer to [`RefreshCoordinator::request_or_enqueue`].
#[derive(Debug)]
pub enum Admission {
    /// No refresh was running: the caller now owns the refresh episode and
    /// must end it with [`RefreshCoordinator::on_refresh_settled`].
    Lead,
    /// A refresh is running: wait here for its outcome, then replay.
    Queued(oneshot::Receiver<Result<Credential>>),
}

#[derive(Debug, Default)]
struct RefreshState {
    refreshing: bool,
    queue: VecDeque<PendingRequest>,
}

/// Refresh state machine: `Idle` or `Refreshing`.
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    /// Create an idle coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Either start a refresh episode or join the one in flight.
    pub fn request_or_enqueue(&self, request: &RequestDescriptor) -> Admission {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.refreshing {
            state.refreshing = true;
            debug!(request_id = %request.id, "Leading token refresh");
            return Admission::Lead;
        }
        let (reply, rx) = oneshot::channel();
        debug!(
            request_id = %request.id,
            position = state.queue.len(),
            "Refresh in flight; queuing request"
        );
        state.queue.push_back(PendingRequest {
            request_id: request.id,
            path: request.path.clone(),
            reply,
        });
        Admission::Queued(rx)
    }

    /// End the refresh episode: return to `Idle` and hand back every queued
    /// request in arrival order.
    pub fn on_refresh_settled(&self) -> Vec<PendingRequest> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.refreshing = false;
        state.queue.drain(..).collect()
    }

    /// Whether a refresh episode is in flight.
    pub fn is_refreshing(&self) -> bool {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).refreshing
    }

    /// Number of requests waiting on the current refresh.
    pub fn pending_len(&self) -> usize {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).queue.len()
    }

    /// Guard for a leader's episode. If dropped without [`SettleGuard::settle`]
    /// (the leading future was cancelled), the episode ends and every queued
    /// caller is rejected with [`Error::RefreshAborted`].
    pub fn settle_guard(&self) -> SettleGuard<'_> {
        SettleGuard {
            coordinator: self,
            armed: true,
        }
    }
}

/// See [`RefreshCoordinator::settle_guard`].
#[derive(Debug)]
pub struct SettleGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    armed: bool,
}

impl SettleGuard<'_> {
    /// End the episode normally and take the queue.
    pub fn settle(mut self) -> Vec<PendingRequest> {
        self.armed = false;
        self.coordinator.on_refresh_settled()
    }
}

impl Drop for SettleGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let pending = self.coordinator.on_refresh_settled();
        warn!(pending = pending.len(), "Token refresh abandoned before it settled");
        for p in pending {
            p.settle(Err(Error::RefreshAborted));
        }
    }
}
