//! The session: a persistent HTTP client with retry and error mapping.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::{ProxyScheme, SessionConfig};
use crate::error::{ApiError, Error, ErrorKind, ErrorMap, Result, StatusKind};
use crate::hooks::{NoHooks, SessionHooks};
use crate::request::{join_path, RequestBody, RequestBuilder, RequestMethod};
use crate::response::{Payload, Response};
use crate::retry::{RetryConfig, RetryPolicy};
use crate::utils::dict;

const REDACTED: &str = "REDACTED";

/// A configured connection to one REST API.
///
/// Cloning is cheap; clones share the HTTP connection pool, the
/// authentication state and the error map.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    http: reqwest::Client,
    config: SessionConfig,
    state: RwLock<AuthState>,
    error_map: RwLock<ErrorMap>,
    hooks: Arc<dyn SessionHooks>,
}

/// Headers and credentials sent with every request.
#[derive(Debug, Clone, Default)]
struct AuthState {
    headers: Vec<(String, String)>,
    auth: Option<Auth>,
}

#[derive(Clone)]
enum Auth {
    Bearer(String),
    Basic {
        username: String,
        password: Option<String>,
    },
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::Bearer(_) => f.write_str("Bearer([REDACTED])"),
            Auth::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("url", &self.inner.config.url)
            .field("base_path", &self.inner.config.base_path)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Session`].
pub struct SessionBuilder {
    config: SessionConfig,
    hooks: Arc<dyn SessionHooks>,
    http: Option<reqwest::Client>,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self {
            config: SessionConfig::default(),
            hooks: Arc::new(NoHooks),
            http: None,
        }
    }
}

impl SessionBuilder {
    /// Use this configuration.
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Install API-specific hooks.
    pub fn hooks(mut self, hooks: impl SessionHooks + 'static) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    /// Send requests through an existing HTTP client.
    ///
    /// The client's own timeouts, proxies, TLS settings and User-Agent are
    /// used; the matching `SessionConfig` fields are ignored.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http = Some(client);
        self
    }

    /// Build the session, creating an HTTP client unless one was supplied.
    pub fn build(self) -> Result<Session> {
        let http = match self.http {
            Some(http) => http,
            None => build_http_client(&self.config)?,
        };
        Ok(Session {
            inner: Arc::new(SessionInner {
                http,
                config: self.config,
                state: RwLock::new(AuthState::default()),
                error_map: RwLock::new(ErrorMap::default()),
                hooks: self.hooks,
            }),
        })
    }
}

fn build_http_client(config: &SessionConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .pool_idle_timeout(config.pool_idle_timeout)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .user_agent(config.user_agent())
        .gzip(config.compression)
        .deflate(config.compression);

    for proxy in &config.proxies {
        let built = match proxy.scheme {
            ProxyScheme::Http => reqwest::Proxy::http(&proxy.url),
            ProxyScheme::Https => reqwest::Proxy::https(&proxy.url),
            ProxyScheme::All => reqwest::Proxy::all(&proxy.url),
        }
        .map_err(|e| {
            Error::with_source(ErrorKind::Config(format!("invalid proxy {}", proxy.url)), e)
        })?;
        builder = builder.proxy(built);
    }

    if !config.ssl_verify {
        warn!("TLS certificate verification is disabled");
        builder = builder.danger_accept_invalid_certs(true);
    }

    if let Some(cert) = &config.client_cert {
        let read = |path: &std::path::Path| {
            std::fs::read(path).map_err(|e| {
                Error::with_source(
                    ErrorKind::Config(format!("cannot read {}", path.display())),
                    e,
                )
            })
        };
        let mut pem = read(cert.cert.as_path())?;
        pem.push(b'\n');
        pem.extend(read(cert.key.as_path())?);
        let identity = reqwest::Identity::from_pem(&pem).map_err(|e| {
            Error::with_source(ErrorKind::Config("invalid client certificate".to_string()), e)
        })?;
        builder = builder.identity(identity);
    }

    builder
        .build()
        .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))
}

impl Session {
    /// Create a session without hooks.
    pub fn new(config: SessionConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Create a session with API-specific hooks.
    pub fn with_hooks(config: SessionConfig, hooks: impl SessionHooks + 'static) -> Result<Self> {
        Self::builder().config(config).hooks(hooks).build()
    }

    /// Start building a session.
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    /// The session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Resolve a request path into a full URL.
    ///
    /// Absolute `http(s)://` paths are used as-is. Anything else is appended
    /// to the session URL, with the base path in between when `use_base` is
    /// set.
    pub fn url(&self, path: &str, use_base: bool) -> Result<Url> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(Url::parse(path)?);
        }

        let base = self.inner.config.url.as_deref().ok_or_else(|| {
            Error::new(ErrorKind::Config(format!(
                "no base URL configured to resolve {path}"
            )))
        })?;
        let base_path = match (use_base, self.inner.config.base_path.as_deref()) {
            (true, Some(base_path)) => base_path,
            _ => "",
        };

        let tail = join_path(&[base_path, path]);
        let base = base.trim_end_matches('/');
        let full = if tail.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{tail}")
        };
        Ok(Url::parse(&full)?)
    }

    /// Create a GET request builder.
    pub fn get(&self, path: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Get, path)
    }

    /// Create a POST request builder.
    pub fn post(&self, path: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Post, path)
    }

    /// Create a PUT request builder.
    pub fn put(&self, path: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Put, path)
    }

    /// Create a PATCH request builder.
    pub fn patch(&self, path: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Patch, path)
    }

    /// Create a DELETE request builder.
    pub fn delete(&self, path: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Delete, path)
    }

    /// Create a HEAD request builder.
    pub fn head(&self, path: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Head, path)
    }

    /// Create a request builder for a method given by name.
    pub fn request(&self, method: &str, path: impl Into<String>) -> Result<RequestBuilder> {
        Ok(RequestBuilder::new(method.parse()?, path))
    }

    /// Send a request, retrying retryable failures, and map error statuses
    /// onto [`ApiError`]s.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let retry = self
            .inner
            .config
            .retry
            .clone()
            .unwrap_or_else(RetryConfig::no_retry);
        let mut policy = RetryPolicy::new(retry);
        let mut request = request;

        loop {
            let url = self.request_url(&request)?;

            if self.inner.config.enable_tracing {
                let redact_fields = self.redact_fields(&request);
                if let Some((query, body)) =
                    describe_request(&request, self.is_restricted(&request), &redact_fields)
                {
                    debug!(path = %request.path, %query, %body, "Request payload");
                }
            }

            let response = match self.execute_once(&request, url).await {
                Ok(response) => response,
                Err(err) if err.is_retryable() => match policy.next_delay(None) {
                    Some(delay) => {
                        warn!(
                            attempt = policy.attempt(),
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "Request failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    None => return Err(err),
                },
                Err(err) => return Err(err),
            };

            if response.is_success() {
                return self.inner.hooks.check_response(response).await;
            }

            let status = response.status();
            let (kind, retryable) = {
                let map = self.error_map();
                let kind = map.lookup(status).unwrap_or(StatusKind::Unknown);
                (kind, map.is_retryable(kind))
            };

            if retryable {
                if let Some(delay) = policy.next_delay(response.retry_after()) {
                    warn!(
                        status,
                        kind = %kind,
                        attempt = policy.attempt(),
                        delay_ms = delay.as_millis() as u64,
                        "Retryable status, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    request = self
                        .inner
                        .hooks
                        .retry_request(&response, policy.attempt(), request)
                        .await?;
                    continue;
                }
            }

            return Err(Error::new(ErrorKind::Api(ApiError::from_response(
                &response,
                kind,
                retryable,
                policy.attempt(),
            ))));
        }
    }

    /// Send a request once, without retry or status handling.
    async fn execute_once(&self, request: &RequestBuilder, url: Url) -> Result<Response> {
        let state = self.state().clone();
        let mut req = self.inner.http.request(request.method.to_reqwest(), url);

        for (name, value) in &state.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        req = match (&request.bearer_token, &state.auth) {
            (Some(token), _) => req.bearer_auth(token),
            (None, Some(Auth::Bearer(token))) => req.bearer_auth(token),
            (None, Some(Auth::Basic { username, password })) => {
                req.basic_auth(username, password.as_ref())
            }
            (None, None) => req,
        };

        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        if let Some(body) = &request.body {
            req = match body {
                RequestBody::Json(value) => req.json(value),
                RequestBody::Text(text) => req.body(text.clone()),
                RequestBody::Bytes(bytes) => req.body(bytes.clone()),
            };
        }

        let response = req.send().await?;

        if self.inner.config.enable_tracing {
            let status = response.status().as_u16();
            let content_length = response.content_length();
            if response.status().is_success() {
                debug!(status, content_length, "Response received");
            } else {
                info!(status, content_length, "Non-success response");
            }
        }

        Response::from_reqwest(request.method, response).await
    }

    fn request_url(&self, request: &RequestBuilder) -> Result<Url> {
        let mut url = self.url(&request.path, request.use_base)?;
        if !request.query_params.is_empty() {
            url.query_pairs_mut().extend_pairs(
                request
                    .query_params
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str())),
            );
        }
        Ok(url)
    }

    fn is_restricted(&self, request: &RequestBuilder) -> bool {
        let path = request.path.trim_matches('/');
        self.inner
            .config
            .restricted_paths
            .iter()
            .any(|p| p.trim_matches('/') == path)
    }

    fn redact_fields(&self, request: &RequestBuilder) -> Vec<String> {
        self.inner
            .config
            .redact_fields
            .iter()
            .chain(request.redact_fields.iter())
            .cloned()
            .collect()
    }

    /// Send a request and deserialize the JSON response.
    pub async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        self.send(request).await?.json()
    }

    /// Send a request and decode the body as JSON when it is JSON.
    pub async fn payload(&self, request: RequestBuilder) -> Result<Payload> {
        self.send(request).await?.into_payload()
    }

    /// GET a path and deserialize the JSON response.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_json(self.get(path)).await
    }

    /// POST a JSON body and deserialize the JSON response.
    pub async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        self.send_json(self.post(path).json(body)?).await
    }

    /// PUT a JSON body and deserialize the JSON response.
    pub async fn put_json<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        self.send_json(self.put(path).json(body)?).await
    }

    /// PATCH a JSON body and deserialize the JSON response.
    pub async fn patch_json<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        self.send_json(self.patch(path).json(body)?).await
    }

    /// DELETE a path and deserialize the JSON response.
    pub async fn delete_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_json(self.delete(path)).await
    }

    fn state(&self) -> RwLockReadGuard<'_, AuthState> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&self) -> RwLockWriteGuard<'_, AuthState> {
        self.inner.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Send `Authorization: Bearer {token}` with every request.
    pub fn set_bearer_token(&self, token: impl Into<String>) {
        self.state_mut().auth = Some(Auth::Bearer(token.into()));
    }

    /// Send HTTP basic credentials with every request.
    pub fn set_basic_auth(&self, username: impl Into<String>, password: Option<String>) {
        self.state_mut().auth = Some(Auth::Basic {
            username: username.into(),
            password,
        });
    }

    /// Drop any credentials installed on the session.
    pub fn clear_auth(&self) {
        self.state_mut().auth = None;
    }

    /// Returns true if credentials are installed.
    pub fn has_auth(&self) -> bool {
        self.state().auth.is_some()
    }

    /// Send a header with every request, replacing an earlier value.
    pub fn set_header(&self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let mut state = self.state_mut();
        state.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        state.headers.push((name, value.into()));
    }

    /// Stop sending a header.
    pub fn remove_header(&self, name: &str) {
        self.state_mut()
            .headers
            .retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    }

    /// Run the `authenticate` hook.
    pub async fn authenticate(&self) -> Result<()> {
        self.inner.hooks.authenticate(self).await
    }

    /// Run the `deauthenticate` hook.
    pub async fn deauthenticate(&self) -> Result<()> {
        self.inner.hooks.deauthenticate(self).await
    }

    /// Authenticate, run `f`, then deauthenticate.
    ///
    /// `deauthenticate` runs even when `f` fails; the error from `f` wins
    /// over one from `deauthenticate`.
    pub async fn scoped<F, Fut, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(Session) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.authenticate().await?;
        let result = f(self.clone()).await;
        let logout = self.deauthenticate().await;
        let value = result?;
        logout?;
        Ok(value)
    }

    /// Read access to the session's error map.
    pub fn error_map(&self) -> RwLockReadGuard<'_, ErrorMap> {
        self.inner.error_map.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write access to the session's error map.
    pub fn error_map_mut(&self) -> RwLockWriteGuard<'_, ErrorMap> {
        self.inner.error_map.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark a status kind as retryable or not for this session.
    pub fn set_retryable(&self, kind: StatusKind, retryable: bool) {
        self.error_map_mut().set_retryable(kind, retryable);
    }
}

/// Render the query and body of a request for the debug log.
///
/// Returns None when there is nothing to log.
pub(crate) fn describe_request(
    request: &RequestBuilder,
    restricted: bool,
    redact_fields: &[String],
) -> Option<(String, String)> {
    if request.query_params.is_empty() && request.body.is_none() {
        return None;
    }
    if restricted {
        return Some((REDACTED.to_string(), REDACTED.to_string()));
    }

    let replacement = Value::String(REDACTED.to_string());
    let query: Map<String, Value> = request
        .query_params
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    let query = dict::redact(&Value::Object(query), redact_fields, &replacement);

    let body = match &request.body {
        Some(RequestBody::Json(value)) => dict::redact(value, redact_fields, &replacement).to_string(),
        Some(RequestBody::Text(text)) => format!("<{} bytes of text>", text.len()),
        Some(RequestBody::Bytes(bytes)) => format!("<{} bytes>", bytes.len()),
        None => "{}".to_string(),
    };

    Some((query.to_string(), body))
}
