//! Shared fakes for the integration suites.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use daily_gateway::{
    Credential, CredentialStore, Error, Gateway, GatewayResponse, MemoryStorage, Navigator,
    Notifier, RequestDescriptor, Result, SessionStore, Transport, TransportError,
    TransportResponse,
};
use serde_json::json;
use tokio::sync::Semaphore;

pub const REFRESH_PATH: &str = "/api/oauth/refresh";

pub fn envelope(code: i64, message: &str, data: serde_json::Value) -> TransportResponse {
    TransportResponse::json(&json!({"code": code, "message": message, "data": data}))
}

/// Server fake: requests bearing the accepted token succeed and echo their
/// path, every other request gets the session-expired code. The refresh call
/// blocks until the test releases it, as do calls matching a `hold`.
pub struct ScriptedTransport {
    log: Mutex<Vec<RequestDescriptor>>,
    refresh_calls: AtomicUsize,
    gate: Semaphore,
    held: Mutex<Vec<(String, String)>>,
    hold_gate: Semaphore,
    refresh_reply: Result<TransportResponse, TransportError>,
    accepted: Option<String>,
}

impl ScriptedTransport {
    /// Refresh answers with `T2`, which the server then accepts.
    pub fn refreshing_to_t2() -> Arc<Self> {
        Self::new(Ok(envelope(200, "ok", json!("T2"))), Some("Bearer T2"))
    }

    pub fn new(
        refresh_reply: Result<TransportResponse, TransportError>,
        accepted: Option<&str>,
    ) -> Arc<Self> {
        Arc::new(Self {
            log: Mutex::new(Vec::new()),
            refresh_calls: AtomicUsize::new(0),
            gate: Semaphore::new(0),
            held: Mutex::new(Vec::new()),
            hold_gate: Semaphore::new(0),
            refresh_reply,
            accepted: accepted.map(str::to_string),
        })
    }

    /// Let `n` refresh calls complete.
    pub fn release_refresh(&self, n: usize) {
        self.gate.add_permits(n);
    }

    /// Block calls to `path` bearing `bearer` until [`release_held`](Self::release_held).
    /// The call is logged before it blocks.
    pub fn hold(&self, path: &str, bearer: &str) {
        self.held
            .lock()
            .unwrap()
            .push((path.to_string(), bearer.to_string()));
    }

    /// Let `n` held calls answer.
    pub fn release_held(&self, n: usize) {
        self.hold_gate.add_permits(n);
    }

    /// Whether a call to `path` bearing `bearer` has been issued.
    pub fn saw(&self, path: &str, bearer: &str) -> bool {
        self.calls()
            .iter()
            .any(|(p, b)| p == path && b.as_deref() == Some(bearer))
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// `(path, bearer)` of every call, in issue order.
    pub fn calls(&self) -> Vec<(String, Option<String>)> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .map(|r| (r.path.clone(), bearer(r)))
            .collect()
    }

    /// Calls issued after the refresh call.
    pub fn replays(&self) -> Vec<(String, Option<String>)> {
        let calls = self.calls();
        let at = calls
            .iter()
            .position(|(p, _)| p == REFRESH_PATH)
            .expect("no refresh call");
        calls[at + 1..].to_vec()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &RequestDescriptor) -> Result<TransportResponse, TransportError> {
        self.log.lock().unwrap().push(request.clone());
        if request.path == REFRESH_PATH {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            self.gate.acquire().await.expect("gate closed").forget();
            return self.refresh_reply.clone();
        }
        let held = match bearer(request) {
            Some(b) => self
                .held
                .lock()
                .unwrap()
                .iter()
                .any(|(p, hb)| *p == request.path && *hb == b),
            None => false,
        };
        if held {
            self.hold_gate.acquire().await.expect("hold gate closed").forget();
        }
        if self.accepted.is_some() && bearer(request) == self.accepted {
            Ok(envelope(200, "ok", json!(request.path)))
        } else {
            Ok(envelope(410, "access token expired", json!(null)))
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub fn bearer(request: &RequestDescriptor) -> Option<String> {
    request
        .headers
        .get(reqwest::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[derive(Default)]
pub struct CountingNavigator {
    logins: AtomicUsize,
}

impl CountingNavigator {
    pub fn logins(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }
}

impl Navigator for CountingNavigator {
    fn goto_login(&self) -> Result<()> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn redirect(&self, _path: &str) {}
}

#[derive(Default)]
pub struct RecordingNotifier(Mutex<Vec<String>>);

impl RecordingNotifier {
    pub fn shown(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn show(&self, message: &str) {
        self.0.lock().unwrap().push(message.to_string());
    }
}

pub struct Fixture {
    pub transport: Arc<ScriptedTransport>,
    pub store: Arc<SessionStore>,
    pub navigator: Arc<CountingNavigator>,
    pub gateway: Arc<Gateway>,
}

/// Gateway over `transport`, logged in with `T1`.
pub fn fixture(transport: Arc<ScriptedTransport>) -> Fixture {
    let store = Arc::new(SessionStore::new(Arc::new(MemoryStorage::new())));
    store.set_credential(Credential::new("T1")).unwrap();
    let navigator = Arc::new(CountingNavigator::default());
    let gateway = Gateway::builder()
        .transport(transport.clone())
        .credential_store(store.clone())
        .navigator(navigator.clone())
        .notifier(Arc::new(RecordingNotifier::default()))
        .build()
        .unwrap();
    Fixture {
        transport,
        store,
        navigator,
        gateway: Arc::new(gateway),
    }
}

/// Spawn `execute(GET path)` on the gateway.
pub fn spawn_get(
    gateway: &Arc<Gateway>,
    path: &str,
) -> tokio::task::JoinHandle<Result<GatewayResponse>> {
    let gateway = gateway.clone();
    let request = RequestDescriptor::get(path);
    tokio::spawn(async move { gateway.execute(request).await })
}

/// Yield until `cond` holds; panics after a generous timeout.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition not reached");
}

pub fn is_refresh_failure(err: &Error) -> bool {
    matches!(err, Error::RefreshFailed(_))
}
