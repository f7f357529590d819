//! The client facade.
//!
//! # Responsibilities
//! - Resolve submission options against configured defaults
//! - Bind a transport to each submission via the fallback router
//! - Hand entries to the dispatcher (or run them immediately when bypassing)
//! - Expose cancellation, shutdown and dispatcher introspection
//!
//! # Design Decisions
//! - Explicitly constructed and cloned by callers; no global instance
//! - `submit` is `enqueue` + wait; `enqueue` hands out a `Ticket` so callers
//!   can cancel before dispatch

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;

use crate::config::{ClientConfig, RequestDefaults};
use crate::credentials::{CredentialProvider, SessionStore};
use crate::error::{RequestError, RequestResult};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::queue::{
    Dispatcher, DispatcherState, Payload, QueueEntry, Request, RequestId, RequestOptions, Ticket,
};
use crate::resilience::retries::RetryPolicy;
use crate::routing::FallbackRouter;
use crate::transport::{build_http_client, HttpTransport, LegacyFormTransport, Transport};

struct ClientInner {
    dispatcher: Dispatcher,
    router: FallbackRouter,
    credentials: Arc<CredentialProvider>,
    defaults: RequestDefaults,
}

/// Entry point for every backend call.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl ApiClient {
    /// Start building a client from configuration.
    pub fn builder(config: ClientConfig) -> ApiClientBuilder {
        ApiClientBuilder::new(config)
    }

    /// Submit and wait for the outcome.
    pub async fn submit(
        &self,
        action: impl Into<String>,
        payload: Payload,
        options: RequestOptions,
    ) -> RequestResult<Value> {
        self.enqueue(action, payload, options)?
            .settled()
            .await
            .into_result()
    }

    /// Submit and return a ticket for the eventual settlement.
    ///
    /// Must be called from within a tokio runtime.
    pub fn enqueue(
        &self,
        action: impl Into<String>,
        payload: Payload,
        options: RequestOptions,
    ) -> RequestResult<Ticket> {
        let inner = &self.inner;
        if inner.dispatcher.is_closed() {
            return Err(RequestError::Cancelled("client is shut down".into()));
        }

        let transport = inner.router.select()?;
        let request = Request::new(action, payload, &options, &inner.defaults);
        let bypass = options.enqueue == Some(false);

        metrics::record_submitted(request.priority.as_str());
        tracing::debug!(
            request_id = %request.id,
            action = %request.action,
            priority = request.priority.as_str(),
            transport = transport.name(),
            bypass,
            "Request submitted"
        );

        let (entry, ticket) = QueueEntry::new(request, transport);
        if bypass {
            inner.dispatcher.execute_now(entry);
        } else {
            inner.dispatcher.enqueue(entry);
        }
        Ok(ticket)
    }

    /// Withdraw a request still waiting in the queue.
    pub fn cancel(&self, id: RequestId) -> bool {
        self.inner.dispatcher.cancel(id)
    }

    /// Stop accepting submissions and cancel everything queued.
    pub fn close(&self) {
        self.inner.dispatcher.close();
    }

    /// Close this client when `shutdown` is triggered.
    pub fn attach_shutdown(&self, shutdown: &Shutdown) -> JoinHandle<()> {
        let mut rx = shutdown.subscribe();
        let client = self.clone();
        tokio::spawn(async move {
            // A closed channel also means nobody can trigger us any more.
            let _ = rx.recv().await;
            client.close();
        })
    }

    pub fn is_closed(&self) -> bool {
        self.inner.dispatcher.is_closed()
    }

    pub fn state(&self) -> DispatcherState {
        self.inner.dispatcher.state()
    }

    pub fn in_flight(&self) -> Option<RequestId> {
        self.inner.dispatcher.in_flight()
    }

    pub fn queue_len(&self) -> usize {
        self.inner.dispatcher.queue_len()
    }

    pub fn queued_ids(&self) -> Vec<RequestId> {
        self.inner.dispatcher.queued_ids()
    }

    /// Credential provider, e.g. to apply a reloaded token.
    pub fn credentials(&self) -> &Arc<CredentialProvider> {
        &self.inner.credentials
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("dispatcher", &self.inner.dispatcher)
            .field("router", &self.inner.router)
            .finish()
    }
}

/// Builder for [`ApiClient`].
///
/// Transports default to [`HttpTransport`] and [`LegacyFormTransport`] over
/// the configured endpoints.
pub struct ApiClientBuilder {
    config: ClientConfig,
    session: SessionStore,
    primary: Option<Arc<dyn Transport>>,
    legacy: Option<Arc<dyn Transport>>,
}

impl ApiClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            session: SessionStore::new(),
            primary: None,
            legacy: None,
        }
    }

    /// Share the host application's session store.
    pub fn session(mut self, session: SessionStore) -> Self {
        self.session = session;
        self
    }

    pub fn primary(mut self, transport: Arc<dyn Transport>) -> Self {
        self.primary = Some(transport);
        self
    }

    pub fn legacy(mut self, transport: Arc<dyn Transport>) -> Self {
        self.legacy = Some(transport);
        self
    }

    pub fn build(self) -> RequestResult<ApiClient> {
        let config = self.config;
        let transport_config = &config.transport;

        let (primary, legacy) = match (self.primary, self.legacy) {
            (Some(primary), Some(legacy)) => (primary, legacy),
            (primary, legacy) => {
                let http = build_http_client(Duration::from_millis(transport_config.connect_timeout_ms))?;
                let primary = primary.unwrap_or_else(|| {
                    Arc::new(HttpTransport::new(
                        http.clone(),
                        transport_config.endpoint.as_deref(),
                        transport_config.credential_header.as_str(),
                    )) as Arc<dyn Transport>
                });
                let legacy = legacy.unwrap_or_else(|| {
                    Arc::new(LegacyFormTransport::new(
                        http,
                        transport_config.legacy_endpoint.as_deref(),
                        transport_config.credential_header.as_str(),
                    )) as Arc<dyn Transport>
                });
                (primary, legacy)
            }
        };

        let credentials = Arc::new(CredentialProvider::new(&config.credentials, self.session));
        let policy = RetryPolicy::new(Arc::clone(&credentials), &config.requests);
        let dispatcher = Dispatcher::new(
            policy,
            Duration::from_millis(config.queue.inter_request_delay_ms),
        );
        let router = FallbackRouter::new(primary, legacy, transport_config.mode);

        tracing::info!(
            mode = ?router.mode(),
            inter_request_delay_ms = config.queue.inter_request_delay_ms,
            timeout_ms = config.requests.timeout_ms,
            max_retries = config.requests.max_retries,
            "Admin API client initialized"
        );

        Ok(ApiClient {
            inner: Arc::new(ClientInner {
                dispatcher,
                router,
                credentials,
                defaults: config.requests,
            }),
        })
    }
}
