//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use admin_client::config::ClientConfig;
use admin_client::credentials::{CredentialToken, TokenSource};
use admin_client::queue::Request;
use admin_client::transport::{ApiResponse, Transport};
use admin_client::{ApiClient, RequestResult, SessionStore};

/// One call observed by a [`ScriptedTransport`].
#[derive(Debug, Clone)]
pub struct Call {
    pub action: String,
    pub sequence: u64,
    pub token: String,
    pub source: TokenSource,
    pub at: Instant,
}

type Responder = dyn Fn(&Request, usize) -> RequestResult<ApiResponse> + Send + Sync;

/// In-process transport driven by a closure.
///
/// The closure gets the request and the zero-based index of the call across
/// the whole transport. Calls for a held action block until released.
pub struct ScriptedTransport {
    name: &'static str,
    available: bool,
    responder: Box<Responder>,
    calls: Mutex<Vec<Call>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl ScriptedTransport {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&Request, usize) -> RequestResult<ApiResponse> + Send + Sync + 'static,
    {
        Arc::new(Self {
            name: "scripted",
            available: true,
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
            gates: Mutex::new(HashMap::new()),
        })
    }

    /// Always succeeds, echoing the action as `data`.
    pub fn echo() -> Arc<Self> {
        Self::new(|req, _| Ok(ApiResponse::ok(serde_json::json!({ "action": req.action }))))
    }

    /// Not configured; the router must never pick it.
    pub fn unavailable(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            available: false,
            responder: Box::new(|_: &Request, _: usize| -> RequestResult<ApiResponse> {
                panic!("unavailable transport was called")
            }),
            calls: Mutex::new(Vec::new()),
            gates: Mutex::new(HashMap::new()),
        })
    }

    /// Block calls for `action` until [`ScriptedTransport::release`].
    pub fn hold(&self, action: &str) {
        self.gates
            .lock()
            .unwrap()
            .insert(action.to_string(), Arc::new(Semaphore::new(0)));
    }

    pub fn release(&self, action: &str) {
        if let Some(gate) = self.gates.lock().unwrap().get(action) {
            gate.add_permits(1);
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn actions(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.action).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Wait until at least `n` calls have been observed.
    pub async fn wait_for_calls(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.call_count() < n {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("transport calls did not arrive in time");
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn call(
        &self,
        request: &Request,
        token: &CredentialToken,
        _timeout: Duration,
    ) -> RequestResult<ApiResponse> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Call {
                action: request.action.clone(),
                sequence: request.sequence,
                token: token.value.clone(),
                source: token.source,
                at: Instant::now(),
            });
            calls.len() - 1
        };

        let gate = self.gates.lock().unwrap().get(&request.action).cloned();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }

        (self.responder)(request, index)
    }
}

/// Config with fast timings and a fixed token.
pub fn test_config() -> ClientConfig {
    let mut config = ClientConfig::default();
    config.queue.inter_request_delay_ms = 0;
    config.requests.timeout_ms = 2_000;
    config.requests.retry_delay_ms = 10;
    config.requests.max_retry_delay_ms = 100;
    config.credentials.token = Some("test-token".into());
    config.credentials.env_var = "ADMIN_CLIENT_TEST_UNSET_TOKEN".into();
    config
}

/// Client whose primary transport is `transport` and legacy is unavailable.
pub fn client_with(config: ClientConfig, transport: Arc<ScriptedTransport>) -> ApiClient {
    client_with_session(config, transport, SessionStore::new())
}

pub fn client_with_session(
    config: ClientConfig,
    transport: Arc<ScriptedTransport>,
    session: SessionStore,
) -> ApiClient {
    ApiClient::builder(config)
        .session(session)
        .primary(transport)
        .legacy(ScriptedTransport::unavailable("legacy"))
        .build()
        .unwrap()
}

/// Client with no proxy lookup, for talking to a local mock backend.
pub fn local_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// A raw HTTP request captured by the mock backend.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// Start a programmable mock backend on an ephemeral port.
///
/// Every request is parsed and handed to `f`, which returns status and body.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(CapturedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let Some(captured) = read_request(&mut socket).await else {
                            return;
                        };
                        let (status, body) = f(captured).await;
                        let response = format!(
                            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            reason(status),
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Mock backend that records every request and answers from `f`.
pub async fn start_recording_backend<F>(f: F) -> (SocketAddr, Arc<Mutex<Vec<CapturedRequest>>>)
where
    F: Fn(usize) -> (u16, String) + Send + Sync + 'static,
{
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();
    let addr = start_programmable_backend(move |req| {
        let index = {
            let mut log = log.lock().unwrap();
            log.push(req);
            log.len() - 1
        };
        let response = f(index);
        async move { response }
    })
    .await;
    (addr, seen)
}

async fn read_request(socket: &mut TcpStream) -> Option<CapturedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(CapturedRequest {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&body).to_string(),
    })
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        408 => "Request Timeout",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}
