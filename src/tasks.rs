use crate::error::{GatewayError, StoreError};
use crate::gateway::CallGateway;
use crate::store::OrderStore;
use crate::vapi_types::success_evaluation;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FollowUpState {
    /// Waiting out the delay; can still be cancelled.
    Armed,
    /// Talking to the provider / database.
    Fired,
}

#[derive(Debug, PartialEq, Eq)]
pub enum FollowUpOutcome {
    Recorded(String),
    NoEvaluation,
}

#[derive(Debug, Error)]
pub enum FollowUpError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

struct PendingFollowUp {
    token: u64,
    order_id: i32,
    state: FollowUpState,
    handle: JoinHandle<()>,
}

struct Inner {
    gateway: Arc<dyn CallGateway>,
    orders: Arc<dyn OrderStore>,
    delay: Duration,
    next_token: AtomicU64,
    // call id => pending follow-up
    pending: Mutex<HashMap<String, PendingFollowUp>>,
}

/// In-memory registry of delayed, one-shot call outcome checks.  Nothing is persisted: a
/// follow-up still armed when the process exits is dropped.
#[derive(Clone)]
pub struct FollowUpScheduler {
    inner: Arc<Inner>,
}

impl FollowUpScheduler {
    pub fn new(
        gateway: Arc<dyn CallGateway>,
        orders: Arc<dyn OrderStore>,
        delay: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                gateway,
                orders,
                delay,
                next_token: AtomicU64::new(0),
                pending: Mutex::new(HashMap::new()),
            }),
        }
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<String, PendingFollowUp>> {
        // The map is only touched by short, non-panicking critical sections.
        self.inner
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Schedule the outcome check for `call_id`.  Arming a call that is already armed replaces
    /// the earlier timer.
    pub fn arm(&self, call_id: &str, order_id: i32) {
        let token = self.inner.next_token.fetch_add(1, Ordering::Relaxed);
        let mut pending = self.pending();
        let handle = tokio::spawn(follow_up_task(
            self.clone(),
            call_id.to_string(),
            order_id,
            token,
        ));
        let previous = pending.insert(
            call_id.to_string(),
            PendingFollowUp {
                token,
                order_id,
                state: FollowUpState::Armed,
                handle,
            },
        );
        if let Some(previous) = previous {
            warn!(call_id, "re-arming follow-up; dropping the earlier one");
            previous.handle.abort();
        }
        debug!(call_id, order_id, delay=?self.inner.delay, "follow-up armed");
    }

    #[cfg(test)]
    pub fn state(&self, call_id: &str) -> Option<FollowUpState> {
        self.pending().get(call_id).map(|p| p.state)
    }

    #[cfg(test)]
    pub fn pending_count(&self) -> usize {
        self.pending().len()
    }

    /// Cancel a follow-up that has not fired yet.  Returns false if nothing was cancelled.
    pub fn cancel(&self, call_id: &str) -> bool {
        let mut pending = self.pending();
        match pending.get(call_id) {
            Some(p) if p.state == FollowUpState::Armed => {
                if let Some(p) = pending.remove(call_id) {
                    p.handle.abort();
                }
                info!(call_id, "follow-up cancelled");
                true
            }
            _ => false,
        }
    }

    /// Cancel every armed follow-up belonging to `order_id`.
    pub fn cancel_for_order(&self, order_id: i32) -> usize {
        let call_ids: Vec<String> = self
            .pending()
            .iter()
            .filter(|(_, p)| p.order_id == order_id)
            .map(|(call_id, _)| call_id.clone())
            .collect();
        let cancelled = call_ids
            .iter()
            .filter(|call_id| self.cancel(call_id))
            .count();
        if cancelled > 0 {
            info!(order_id, cancelled, "cancelled follow-ups for order");
        }
        cancelled
    }

    /// Abort everything still registered.  Returns how many follow-ups were dropped.
    pub fn shutdown(&self) -> usize {
        let drained: Vec<(String, PendingFollowUp)> = self.pending().drain().collect();
        for (call_id, p) in &drained {
            debug!(call_id, order_id = p.order_id, "dropping follow-up at shutdown");
            p.handle.abort();
        }
        drained.len()
    }

    /// Marks the entry fired; false if it has been cancelled or replaced meanwhile.
    fn mark_fired(&self, call_id: &str, token: u64) -> bool {
        match self.pending().get_mut(call_id) {
            Some(p) if p.token == token => {
                p.state = FollowUpState::Fired;
                true
            }
            _ => false,
        }
    }

    fn finish(&self, call_id: &str, token: u64) {
        let mut pending = self.pending();
        if pending.get(call_id).map(|p| p.token) == Some(token) {
            pending.remove(call_id);
        }
    }

    /// Ask the provider how the call went and record the evaluation on the order.
    pub async fn check_outcome(
        &self,
        call_id: &str,
        order_id: i32,
    ) -> Result<FollowUpOutcome, FollowUpError> {
        let details = self.inner.gateway.fetch_details(call_id).await?;
        match success_evaluation(&details) {
            Some(evaluation) => {
                let updated = self
                    .inner
                    .orders
                    .set_success_evaluation(order_id, &evaluation)
                    .await?;
                if !updated {
                    warn!(call_id, order_id, "order no longer exists; evaluation not stored");
                }
                Ok(FollowUpOutcome::Recorded(evaluation))
            }
            None => Ok(FollowUpOutcome::NoEvaluation),
        }
    }
}

/// Task that waits out the follow-up delay and then checks the call outcome exactly once.
async fn follow_up_task(scheduler: FollowUpScheduler, call_id: String, order_id: i32, token: u64) {
    sleep(scheduler.inner.delay).await;
    if !scheduler.mark_fired(&call_id, token) {
        return;
    }
    info!(call_id=%call_id, order_id, "fetching call details for follow-up");
    match scheduler.check_outcome(&call_id, order_id).await {
        Ok(FollowUpOutcome::Recorded(evaluation)) => {
            info!(
                call_id=%call_id,
                order_id,
                success_evaluation=%evaluation,
                "updated order with success evaluation"
            );
        }
        Ok(FollowUpOutcome::NoEvaluation) => {
            info!(call_id=%call_id, order_id, "no success evaluation available yet");
        }
        Err(e) => {
            error!(call_id=%call_id, order_id, error=%e, "follow-up failed");
        }
    }
    scheduler.finish(&call_id, token);
}
