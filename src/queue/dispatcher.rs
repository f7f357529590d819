//! Single-consumer drain loop.
//!
//! # States
//! ```text
//! Idle ──enqueue──▶ Draining ──queue empty──▶ Idle
//!                     │  ▲
//!                     ▼  │ inter-request delay
//!               execute one entry
//! ```
//!
//! # Design Decisions
//! - Every enqueue tries to start the loop; a compare-and-swap on `draining`
//!   lets only one loop exist at a time
//! - One queued request in flight at any instant
//! - Each request runs in its own task so a panicking transport settles only
//!   that request and the loop keeps draining
//! - After the loop sees an empty queue it clears the flag and looks again,
//!   so an enqueue racing with shutdown of the loop is never stranded

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::RequestError;
use crate::observability::metrics;
use crate::queue::entry::{QueueEntry, Settlement};
use crate::queue::pending::RequestQueue;
use crate::queue::request::{Request, RequestId};
use crate::resilience::retries::RetryPolicy;
use crate::transport::Transport;

/// Observable dispatcher state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Idle,
    Draining,
}

struct Inner {
    queue: Mutex<RequestQueue>,
    draining: AtomicBool,
    closed: AtomicBool,
    in_flight: Mutex<Option<RequestId>>,
    policy: RetryPolicy,
    inter_request_delay: Duration,
}

impl Inner {
    fn queue(&self) -> MutexGuard<'_, RequestQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_in_flight(&self, id: Option<RequestId>) {
        *self.in_flight.lock().unwrap_or_else(PoisonError::into_inner) = id;
    }

    fn next_entry(&self) -> Option<QueueEntry> {
        let mut queue = self.queue();
        let entry = queue.dequeue();
        metrics::record_queue_depth(queue.len());
        entry
    }
}

/// Drains the request queue through the retry policy.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl Dispatcher {
    pub fn new(policy: RetryPolicy, inter_request_delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                queue: Mutex::new(RequestQueue::new()),
                draining: AtomicBool::new(false),
                closed: AtomicBool::new(false),
                in_flight: Mutex::new(None),
                policy,
                inter_request_delay,
            }),
        }
    }

    /// Queue an entry and make sure a drain loop is running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn enqueue(&self, entry: QueueEntry) {
        let rejected = {
            let mut queue = self.inner.queue();
            // Checked under the lock so an entry cannot slip in after `close` drained.
            if self.is_closed() {
                Some(entry)
            } else {
                queue.enqueue(entry);
                metrics::record_queue_depth(queue.len());
                None
            }
        };

        match rejected {
            Some(entry) => entry.cancel("client is shut down"),
            None => self.start_draining(),
        }
    }

    /// Run an entry right away, outside the queue and its ordering.
    pub fn execute_now(&self, entry: QueueEntry) {
        if self.is_closed() {
            entry.cancel("client is shut down");
            return;
        }

        let policy = self.inner.policy.clone();
        tokio::spawn(async move {
            let settlement =
                run_isolated(policy, entry.request.clone(), Arc::clone(&entry.transport)).await;
            entry.settle(settlement);
        });
    }

    /// Withdraw a request that has not been dispatched yet.
    ///
    /// Returns `false` if it is in flight, already settled, or unknown.
    pub fn cancel(&self, id: RequestId) -> bool {
        let removed = {
            let mut queue = self.inner.queue();
            let removed = queue.remove(id);
            metrics::record_queue_depth(queue.len());
            removed
        };

        match removed {
            Some(entry) => {
                tracing::info!(request_id = %id, action = %entry.request.action, "Request cancelled before dispatch");
                entry.cancel("cancelled by caller");
                true
            }
            None => false,
        }
    }

    /// Stop accepting work and cancel everything still queued.
    ///
    /// The in-flight request, if any, runs to settlement.
    pub fn close(&self) {
        let pending = {
            let mut queue = self.inner.queue();
            if self.inner.closed.swap(true, Ordering::SeqCst) {
                return;
            }
            let pending = queue.drain_all();
            metrics::record_queue_depth(0);
            pending
        };

        tracing::info!(cancelled = pending.len(), "Dispatcher closed");
        for entry in pending {
            entry.cancel("client is shut down");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> DispatcherState {
        if self.inner.draining.load(Ordering::SeqCst) {
            DispatcherState::Draining
        } else {
            DispatcherState::Idle
        }
    }

    /// Request currently handed to the transport.
    pub fn in_flight(&self) -> Option<RequestId> {
        *self.inner.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn queue_len(&self) -> usize {
        self.inner.queue().len()
    }

    /// Queued ids in dispatch order.
    pub fn queued_ids(&self) -> Vec<RequestId> {
        self.inner.queue().ids()
    }

    fn start_draining(&self) {
        if self
            .inner
            .draining
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            tokio::spawn(drain(Arc::clone(&self.inner)));
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("state", &self.state())
            .field("queue_len", &self.queue_len())
            .field("in_flight", &self.in_flight())
            .field("closed", &self.is_closed())
            .finish()
    }
}

async fn drain(inner: Arc<Inner>) {
    tracing::debug!("Drain loop started");

    loop {
        let entry = match inner.next_entry() {
            Some(entry) => entry,
            None => {
                inner.draining.store(false, Ordering::SeqCst);
                // Re-check: an enqueue that saw `draining == true` relies on us.
                let resume = !inner.queue().is_empty()
                    && inner
                        .draining
                        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                        .is_ok();
                if resume {
                    continue;
                }
                break;
            }
        };

        dispatch(&inner, entry).await;
        tokio::time::sleep(inner.inter_request_delay).await;
    }

    tracing::debug!("Drain loop idle");
}

async fn dispatch(inner: &Inner, entry: QueueEntry) {
    let id = entry.id();
    inner.set_in_flight(Some(id));

    tracing::debug!(
        request_id = %id,
        action = %entry.request.action,
        priority = entry.request.priority.as_str(),
        transport = entry.transport.name(),
        "Dispatching request"
    );

    let settlement = run_isolated(
        inner.policy.clone(),
        entry.request.clone(),
        Arc::clone(&entry.transport),
    )
    .await;

    inner.set_in_flight(None);
    entry.settle(settlement);
}

/// Run the retry policy for one request in its own task.
///
/// A panic inside the transport settles only this request, as a Network error.
async fn run_isolated(
    policy: RetryPolicy,
    request: Request,
    transport: Arc<dyn Transport>,
) -> Settlement {
    let id = request.id;
    let handle = tokio::spawn(async move { policy.execute(&request, transport.as_ref()).await });

    match handle.await {
        Ok(settlement) => settlement,
        Err(e) => {
            tracing::error!(request_id = %id, error = %e, "Request task failed");
            Settlement {
                request_id: id,
                result: Err(RequestError::Network(format!("request task failed: {}", e))),
                attempts: Vec::new(),
            }
        }
    }
}
