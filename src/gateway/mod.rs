//! The authenticated request gateway.
//!
//! Every call goes through the same pipeline:
//!
//! 1. [`interceptor::apply_credential`] stamps the current credential.
//! 2. The [`Transport`] sends the request.
//! 3. [`classify::classify`] sorts the result into an [`Outcome`].
//! 4. Session expiry is recovered through the [`RefreshCoordinator`]: one
//!    refresh call per episode. Overlapping callers are queued, woken in
//!    arrival order with the new credential, and each replays its own request.
//!
//! Terminal auth failures clear the session and signal the [`Navigator`];
//! HTTP, network and other failures surface a de-duplicated notification.

pub mod classify;
pub mod coordinator;
pub mod interceptor;
pub mod notify;
pub mod refresh;
mod response;

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::header::{AUTHORIZATION, HeaderName};
use tracing::{debug, info, warn};

use crate::auth::{CredentialStore, Navigator, SessionStore, TracingNavigator};
use crate::config::{
    Config, DEFAULT_LOGIN_PATH, DEFAULT_NOTIFY_COOLDOWN, DEFAULT_NOTIFY_SWEEP_THRESHOLD,
    DEFAULT_REFRESH_PATH, StatusCodes,
};
use crate::error::{Error, Result};
use crate::models::credential::Credential;
use crate::models::request::RequestDescriptor;
use crate::storage::MemoryStorage;
use crate::transport::{HttpTransport, Transport};

pub use classify::{Outcome, classify};
pub use coordinator::{Admission, PendingRequest, RefreshCoordinator};
pub use interceptor::apply_credential;
pub use notify::{NotificationCache, Notifier, TracingNotifier};
pub use refresh::RefreshClient;
pub use response::GatewayResponse;

/// Issues requests with automatic credential handling and refresh.
///
/// Share one instance (behind an `Arc`) across the application: the
/// single-flight guarantee holds per gateway.
pub struct Gateway {
    transport: Arc<dyn Transport>,
    refresher: RefreshClient,
    credentials: Arc<dyn CredentialStore>,
    navigator: Arc<dyn Navigator>,
    notifications: NotificationCache,
    coordinator: RefreshCoordinator,
    header: HeaderName,
    codes: StatusCodes,
    login_path: String,
}

impl Gateway {
    /// Start building a gateway.
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::new()
    }

    /// Issue `request` and return its response.
    ///
    /// Session expiry is recovered transparently (at most once per request);
    /// every other failure is returned as an [`Error`].
    pub async fn execute(&self, request: RequestDescriptor) -> Result<GatewayResponse> {
        self.dispatch(request, None).await
    }

    /// Number of requests waiting on the in-flight refresh.
    pub fn pending_refreshes(&self) -> usize {
        self.coordinator.pending_len()
    }

    /// Whether a refresh is in flight.
    pub fn is_refreshing(&self) -> bool {
        self.coordinator.is_refreshing()
    }

    /// The credential store this gateway reads and updates.
    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// The business codes this gateway classifies with.
    pub fn status_codes(&self) -> StatusCodes {
        self.codes
    }

    /// Send one attempt. `credential` overrides the store for replays so every
    /// replay carries the credential its refresh produced.
    fn dispatch(
        &self,
        mut request: RequestDescriptor,
        credential: Option<Credential>,
    ) -> BoxFuture<'_, Result<GatewayResponse>> {
        Box::pin(async move {
            let credential = credential.or_else(|| self.credentials.get_credential());
            apply_credential(&mut request, credential.as_ref(), &self.header);

            debug!(
                request_id = %request.id,
                method = %request.method,
                path = request.path.as_str(),
                retried = request.retried,
                "Dispatching request"
            );
            let result = self.transport.send(&request).await;

            match classify(&result, request.response_type, &self.codes) {
                Outcome::Ok => result
                    .map(|r| GatewayResponse::from_transport(r, request.response_type))
                    .map_err(|e| Error::Other(e.to_string())),
                Outcome::Unauthenticated { message } => {
                    warn!(request_id = %request.id, message = message.as_str(), "Not authenticated; ending session");
                    self.end_session();
                    Err(Error::Unauthenticated { message })
                }
                Outcome::SessionExpired => self.recover(request, credential).await,
                Outcome::Http { status, message } => {
                    self.notifications.notify(&message);
                    Err(Error::Http { status, message })
                }
                Outcome::Network { message } => {
                    self.notifications.notify(&message);
                    Err(Error::Network(message))
                }
                Outcome::Other { message } => {
                    self.notifications.notify(&message);
                    Err(Error::Other(message))
                }
            }
        })
    }

    /// Recover from a session expiry on a request sent with `stamped`.
    async fn recover(
        &self,
        mut request: RequestDescriptor,
        stamped: Option<Credential>,
    ) -> Result<GatewayResponse> {
        if request.retried {
            warn!(request_id = %request.id, "Session expired again after refresh; ending session");
            self.end_session();
            return Err(Error::SessionExpired);
        }
        request.retried = true;

        // A refresh that settled while this request was in flight already
        // produced a newer credential.
        if let Some(current) = self.credentials.get_credential().filter(|c| !c.is_empty()) {
            if stamped.as_ref() != Some(&current) {
                debug!(request_id = %request.id, "Credential changed since dispatch; replaying");
                return self.dispatch(request, Some(current)).await;
            }
        }

        match self.coordinator.request_or_enqueue(&request) {
            Admission::Lead => self.lead_refresh(request).await,
            Admission::Queued(outcome) => {
                let credential = outcome.await.unwrap_or(Err(Error::RefreshAborted))?;
                self.dispatch(request, Some(credential)).await
            }
        }
    }

    async fn lead_refresh(&self, request: RequestDescriptor) -> Result<GatewayResponse> {
        let guard = self.coordinator.settle_guard();
        let current = self.credentials.get_credential();

        match self.refresher.refresh(current.as_ref()).await {
            Ok(credential) => {
                if let Err(e) = self.credentials.set_credential(credential.clone()) {
                    warn!(error = %e, "Failed to persist refreshed credential");
                }
                let pending = guard.settle();
                info!(queued = pending.len(), "Resuming queued requests with refreshed credential");
                for p in pending {
                    p.settle(Ok(credential.clone()));
                }
                self.dispatch(request, Some(credential)).await
            }
            Err(err) => {
                warn!(error = %err, "Token refresh failed; ending session");
                self.end_session();
                let pending = guard.settle();
                for p in pending {
                    p.settle(Err(err.clone()));
                }
                Err(err)
            }
        }
    }

    /// Clear the credential and send the user to the login page.
    fn end_session(&self) {
        if let Err(e) = self.credentials.clear_credential() {
            warn!(error = %e, "Failed to clear credential");
        }
        if let Err(e) = self.navigator.goto_login() {
            warn!(error = %e, path = self.login_path.as_str(), "Navigation failed; redirecting");
            self.navigator.redirect(&self.login_path);
        }
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("transport", &self.transport.name())
            .field("refresher", &self.refresher)
            .field("header", &self.header)
            .field("codes", &self.codes)
            .field("login_path", &self.login_path)
            .field("coordinator", &self.coordinator)
            .finish()
    }
}

/// Builder for [`Gateway`].
///
/// Only the transport is required. Everything else defaults to: in-memory
/// [`SessionStore`], [`TracingNavigator`], [`TracingNotifier`], the
/// `Authorization` header and the default business codes.
pub struct GatewayBuilder {
    transport: Option<Arc<dyn Transport>>,
    refresh_transport: Option<Arc<dyn Transport>>,
    credentials: Option<Arc<dyn CredentialStore>>,
    navigator: Option<Arc<dyn Navigator>>,
    notifier: Option<Arc<dyn Notifier>>,
    header: HeaderName,
    codes: StatusCodes,
    refresh_path: String,
    login_path: String,
    notify_cooldown: Duration,
    notify_sweep_threshold: usize,
}

impl Default for GatewayBuilder {
    fn default() -> Self {
        Self {
            transport: None,
            refresh_transport: None,
            credentials: None,
            navigator: None,
            notifier: None,
            header: AUTHORIZATION,
            codes: StatusCodes::default(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            notify_cooldown: DEFAULT_NOTIFY_COOLDOWN,
            notify_sweep_threshold: DEFAULT_NOTIFY_SWEEP_THRESHOLD,
        }
    }
}

impl GatewayBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder preloaded from `config`, with an [`HttpTransport`] for `[api]`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = HttpTransport::from_config(&config.api)?;
        Ok(Self {
            transport: Some(Arc::new(transport)),
            header: config.auth.header()?,
            codes: config.codes,
            refresh_path: config.auth.refresh_path.clone(),
            login_path: config.auth.login_path.clone(),
            notify_cooldown: config.notifications.cooldown(),
            notify_sweep_threshold: config.notifications.sweep_threshold,
            ..Self::default()
        })
    }

    /// Transport for normal calls. Also used for refresh unless
    /// [`refresh_transport`](Self::refresh_transport) is set.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Separate transport for the refresh call.
    pub fn refresh_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.refresh_transport = Some(transport);
        self
    }

    pub fn credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.credentials = Some(store);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Header carrying `Bearer <token>`.
    pub fn header_name(mut self, header: HeaderName) -> Self {
        self.header = header;
        self
    }

    pub fn status_codes(mut self, codes: StatusCodes) -> Self {
        self.codes = codes;
        self
    }

    pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    /// Path used for the full redirect when navigation fails.
    pub fn login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    pub fn notification_settings(mut self, cooldown: Duration, sweep_threshold: usize) -> Self {
        self.notify_cooldown = cooldown;
        self.notify_sweep_threshold = sweep_threshold;
        self
    }

    pub fn build(self) -> Result<Gateway> {
        let transport = self
            .transport
            .ok_or_else(|| Error::Config("gateway transport is required".into()))?;
        let refresh_transport = self.refresh_transport.unwrap_or_else(|| transport.clone());
        let credentials = self.credentials.unwrap_or_else(|| {
            Arc::new(SessionStore::new(Arc::new(MemoryStorage::new())))
        });
        let navigator = self.navigator.unwrap_or_else(|| Arc::new(TracingNavigator));
        let notifier = self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier));

        let refresher = RefreshClient::new(refresh_transport, self.header.clone(), self.codes)
            .with_refresh_path(self.refresh_path);

        Ok(Gateway {
            transport,
            refresher,
            credentials,
            navigator,
            notifications: NotificationCache::with_settings(
                notifier,
                self.notify_cooldown,
                self.notify_sweep_threshold,
            ),
            coordinator: RefreshCoordinator::new(),
            header: self.header,
            codes: self.codes,
            login_path: self.login_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{TransportError, TransportResponse};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers each call by looking up the path; records every request.
    struct ByPath {
        seen: Mutex<Vec<RequestDescriptor>>,
        answer: fn(&RequestDescriptor) -> Result<TransportResponse, TransportError>,
    }

    #[async_trait]
    impl Transport for ByPath {
        async fn send(
            &self,
            request: &RequestDescriptor,
        ) -> Result<TransportResponse, TransportError> {
            self.seen.lock().unwrap().push(request.clone());
            (self.answer)(request)
        }
    }

    #[derive(Default)]
    struct CountingNavigator {
        logins: AtomicUsize,
        redirects: Mutex<Vec<String>>,
        fail: bool,
    }

    impl Navigator for CountingNavigator {
        fn goto_login(&self) -> Result<()> {
            self.logins.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(Error::Navigation("no router".into()))
            } else {
                Ok(())
            }
        }
        fn redirect(&self, path: &str) {
            self.redirects.lock().unwrap().push(path.to_string());
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl Notifier for Recorder {
        fn show(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    fn bearer(req: &RequestDescriptor) -> Option<String> {
        req.headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    fn envelope(code: i64, message: &str, data: serde_json::Value) -> TransportResponse {
        TransportResponse::json(&json!({"code": code, "message": message, "data": data}))
    }

    struct Harness {
        transport: Arc<ByPath>,
        store: Arc<SessionStore>,
        navigator: Arc<CountingNavigator>,
        notes: Arc<Recorder>,
        gateway: Gateway,
    }

    fn harness(
        answer: fn(&RequestDescriptor) -> Result<TransportResponse, TransportError>,
        navigator: CountingNavigator,
    ) -> Harness {
        let transport = Arc::new(ByPath {
            seen: Mutex::new(Vec::new()),
            answer,
        });
        let store = Arc::new(SessionStore::new(Arc::new(MemoryStorage::new())));
        store.set_credential(Credential::new("T1")).unwrap();
        let navigator = Arc::new(navigator);
        let notes = Arc::new(Recorder::default());
        let gateway = Gateway::builder()
            .transport(transport.clone())
            .credential_store(store.clone())
            .navigator(navigator.clone())
            .notifier(notes.clone())
            .build()
            .unwrap();
        Harness {
            transport,
            store,
            navigator,
            notes,
            gateway,
        }
    }

    #[tokio::test]
    async fn test_ok_response_passes_through_with_bearer() {
        let h = harness(|_| Ok(envelope(200, "ok", json!([1, 2]))), CountingNavigator::default());
        let resp = h.gateway.execute(RequestDescriptor::get("/api/item/today")).await.unwrap();
        let env = resp.envelope::<Vec<i32>>().unwrap();
        assert_eq!(env.data.unwrap(), vec![1, 2]);
        assert_eq!(bearer(&h.transport.seen.lock().unwrap()[0]).unwrap(), "Bearer T1");
    }

    #[tokio::test]
    async fn test_non_auth_business_code_is_returned() {
        let h = harness(|_| Ok(envelope(500, "bad item", json!(null))), CountingNavigator::default());
        let resp = h.gateway.execute(RequestDescriptor::get("/x")).await.unwrap();
        assert!(!resp.envelope::<serde_json::Value>().unwrap().is_success(200));
        assert!(h.notes.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unauthenticated_ends_session() {
        let h = harness(|_| Ok(envelope(401, "token invalid", json!(null))), CountingNavigator::default());
        let err = h.gateway.execute(RequestDescriptor::get("/x")).await.unwrap_err();
        assert_eq!(err, Error::Unauthenticated { message: "token invalid".into() });
        assert!(h.store.get_credential().is_none());
        assert_eq!(h.navigator.logins.load(Ordering::SeqCst), 1);
        // Unauthenticated is never retried.
        assert_eq!(h.transport.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_navigation_failure_falls_back_to_redirect() {
        let h = harness(
            |_| Ok(envelope(401, "", json!(null))),
            CountingNavigator {
                fail: true,
                ..Default::default()
            },
        );
        let err = h.gateway.execute(RequestDescriptor::get("/x")).await.unwrap_err();
        assert_eq!(err, Error::Unauthenticated { message: "Not logged in".into() });
        assert_eq!(*h.navigator.redirects.lock().unwrap(), vec!["/login".to_string()]);
    }

    #[tokio::test]
    async fn test_expired_then_refreshed_and_replayed() {
        let h = harness(
            |req| match (req.path.as_str(), bearer(req).as_deref()) {
                ("/api/oauth/refresh", _) => Ok(envelope(200, "ok", json!("T2"))),
                (_, Some("Bearer T2")) => Ok(envelope(200, "ok", json!("fresh"))),
                _ => Ok(envelope(410, "expired", json!(null))),
            },
            CountingNavigator::default(),
        );
        let resp = h.gateway.execute(RequestDescriptor::get("/a")).await.unwrap();
        assert_eq!(resp.envelope::<String>().unwrap().data.unwrap(), "fresh");
        assert_eq!(h.store.get_credential().unwrap().as_str(), "T2");

        let seen = h.transport.seen.lock().unwrap();
        let paths: Vec<_> = seen.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, ["/a", "/api/oauth/refresh", "/a"]);
        assert!(seen[2].retried);
        assert!(!h.gateway.is_refreshing());
    }

    #[tokio::test]
    async fn test_second_expiry_is_fatal() {
        let h = harness(
            |req| match req.path.as_str() {
                "/api/oauth/refresh" => Ok(envelope(200, "ok", json!("T2"))),
                _ => Ok(envelope(410, "expired", json!(null))),
            },
            CountingNavigator::default(),
        );
        let err = h.gateway.execute(RequestDescriptor::get("/a")).await.unwrap_err();
        assert_eq!(err, Error::SessionExpired);
        assert!(h.store.get_credential().is_none());
        assert_eq!(h.navigator.logins.load(Ordering::SeqCst), 1);
        // Original, one refresh, one replay; never a second refresh.
        assert_eq!(h.transport.seen.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_http_errors_notify_once_per_message() {
        let h = harness(
            |_| Err(TransportError::status(502, r#"{"code":502,"message":"gateway down"}"#)),
            CountingNavigator::default(),
        );
        for _ in 0..3 {
            let err = h.gateway.execute(RequestDescriptor::get("/x")).await.unwrap_err();
            assert_eq!(err, Error::Http { status: 502, message: "gateway down".into() });
        }
        assert_eq!(*h.notes.0.lock().unwrap(), vec!["gateway down".to_string()]);
        assert!(h.store.get_credential().is_some());
    }

    #[tokio::test]
    async fn test_network_error_notifies() {
        let h = harness(|_| Err(TransportError::network("connection refused")), CountingNavigator::default());
        let err = h.gateway.execute(RequestDescriptor::get("/x")).await.unwrap_err();
        assert_eq!(err, Error::Network("connection refused".into()));
        assert_eq!(h.notes.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_build_requires_transport() {
        assert!(matches!(Gateway::builder().build(), Err(Error::Config(_))));
    }

    #[test]
    fn test_from_config_uses_auth_settings() {
        let mut config = Config::default();
        config.auth.header_name = "ACCESS_TOKEN".into();
        config.auth.refresh_path = "/auth/renew".into();
        let gateway = GatewayBuilder::from_config(&config).unwrap().build().unwrap();
        assert_eq!(gateway.header.as_str(), "access_token");
        assert_eq!(gateway.refresher.refresh_path(), "/auth/renew");
    }
}
