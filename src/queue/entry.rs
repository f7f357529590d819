//! Queue entries and their settlement.
//!
//! A [`QueueEntry`] owns the only sender for its request's outcome, and
//! settling consumes the entry, so a request cannot be settled twice.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::{RequestError, RequestResult};
use crate::observability::metrics;
use crate::queue::request::{Request, RequestId};
use crate::resilience::retries::AttemptRecord;
use crate::transport::Transport;

/// Final outcome of one request.
#[derive(Debug)]
pub struct Settlement {
    pub request_id: RequestId,
    /// `data` from the response body on success (`Null` when absent).
    pub result: RequestResult<Value>,
    pub attempts: Vec<AttemptRecord>,
}

impl Settlement {
    pub fn cancelled(request_id: RequestId, reason: impl Into<String>) -> Self {
        Self {
            request_id,
            result: Err(RequestError::Cancelled(reason.into())),
            attempts: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Metrics label: `success` or the error kind.
    pub fn outcome(&self) -> &'static str {
        match &self.result {
            Ok(_) => "success",
            Err(e) => e.kind().as_str(),
        }
    }

    pub fn into_result(self) -> RequestResult<Value> {
        self.result
    }
}

/// A request waiting in (or taken from) the queue.
pub struct QueueEntry {
    pub request: Request,
    /// Transport chosen for this submission; fixed across retries.
    pub transport: Arc<dyn Transport>,
    resolver: oneshot::Sender<Settlement>,
}

impl QueueEntry {
    /// Create an entry and the ticket its caller waits on.
    pub fn new(request: Request, transport: Arc<dyn Transport>) -> (Self, Ticket) {
        let (tx, rx) = oneshot::channel();
        let ticket = Ticket { id: request.id, rx };
        (
            Self {
                request,
                transport,
                resolver: tx,
            },
            ticket,
        )
    }

    pub fn id(&self) -> RequestId {
        self.request.id
    }

    /// Deliver the outcome to the caller.
    pub fn settle(self, settlement: Settlement) {
        metrics::record_settled(settlement.outcome(), self.request.submitted_at);
        tracing::debug!(
            request_id = %self.request.id,
            action = %self.request.action,
            outcome = settlement.outcome(),
            attempts = settlement.attempts.len(),
            "Request settled"
        );
        if self.resolver.send(settlement).is_err() {
            tracing::debug!(request_id = %self.request.id, "Caller stopped waiting before settlement");
        }
    }

    /// Settle with a CancelledError without touching the transport.
    pub fn cancel(self, reason: &str) {
        let settlement = Settlement::cancelled(self.request.id, reason);
        self.settle(settlement);
    }
}

impl std::fmt::Debug for QueueEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueEntry")
            .field("id", &self.request.id)
            .field("action", &self.request.action)
            .field("priority", &self.request.priority)
            .field("sequence", &self.request.sequence)
            .field("transport", &self.transport.name())
            .finish()
    }
}

/// Handle a caller holds for one submitted request.
#[derive(Debug)]
pub struct Ticket {
    id: RequestId,
    rx: oneshot::Receiver<Settlement>,
}

impl Ticket {
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Wait for the settlement.
    pub async fn settled(self) -> Settlement {
        match self.rx.await {
            Ok(settlement) => settlement,
            // Only reachable if the entry was dropped without settling.
            Err(_) => Settlement::cancelled(self.id, "request dropped before settlement"),
        }
    }
}
