//! Session configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryConfig;

/// Configuration for a [`Session`](crate::Session).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base URL that request paths are appended onto.
    pub url: Option<String>,
    /// Optional path inserted between the base URL and the request path.
    pub base_path: Option<String>,
    /// Retry configuration.
    pub retry: Option<RetryConfig>,
    /// Request timeout.
    pub timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Pool idle timeout.
    pub pool_idle_timeout: Duration,
    /// Maximum idle connections per host.
    pub pool_max_idle_per_host: usize,
    /// Proxies to route requests through.
    pub proxies: Vec<ProxyConfig>,
    /// Whether TLS certificates are verified.
    pub ssl_verify: bool,
    /// Client certificate for mutual TLS.
    pub client_cert: Option<ClientCert>,
    /// Identity of the integration, used in the User-Agent.
    pub identity: Identity,
    /// Name of the API library built on top of the session.
    pub lib_name: String,
    /// Version of the API library built on top of the session.
    pub lib_version: String,
    /// Paths whose query and body are never written to the logs.
    pub restricted_paths: Vec<String>,
    /// Field names masked in debug logs on every request.
    pub redact_fields: Vec<String>,
    /// Accept gzip/deflate compressed responses.
    pub compression: bool,
    /// Whether to enable request/response tracing.
    pub enable_tracing: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            url: None,
            base_path: None,
            retry: Some(RetryConfig::default()),
            timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(10),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 10,
            proxies: Vec::new(),
            ssl_verify: true,
            client_cert: None,
            identity: Identity::default(),
            lib_name: crate::LIB_NAME.to_string(),
            lib_version: crate::VERSION.to_string(),
            restricted_paths: Vec::new(),
            redact_fields: Vec::new(),
            compression: true,
            enable_tracing: true,
        }
    }
}

impl SessionConfig {
    /// Create a new session config builder.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// Build the User-Agent string.
    ///
    /// ```text
    /// Integration/1.0 (vendor; product; Build/build) lib/lib_version (restline/x.y.z; Rust; os/arch)
    /// ```
    pub fn user_agent(&self) -> String {
        format!(
            "Integration/1.0 ({}; {}; Build/{}) {}/{} ({}/{}; Rust; {}/{})",
            self.identity.vendor.as_deref().unwrap_or("unknown"),
            self.identity.product.as_deref().unwrap_or("unknown"),
            self.identity.build.as_deref().unwrap_or("unknown"),
            self.lib_name,
            self.lib_version,
            crate::LIB_NAME,
            crate::VERSION,
            std::env::consts::OS,
            std::env::consts::ARCH,
        )
    }
}

/// Builder for [`SessionConfig`].
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    /// Set the base URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.config.url = Some(url.into());
        self
    }

    /// Set the base path.
    pub fn with_base_path(mut self, path: impl Into<String>) -> Self {
        self.config.base_path = Some(path.into());
        self
    }

    /// Set the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = Some(retry);
        self
    }

    /// Set the number of retries, keeping the rest of the retry config.
    pub fn with_retries(mut self, retries: u32) -> Self {
        let retry = self.config.retry.take().unwrap_or_default();
        self.config.retry = Some(retry.with_max_attempts(retries));
        self
    }

    /// Set the backoff factor, keeping the rest of the retry config.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        let retry = self.config.retry.take().unwrap_or_default();
        self.config.retry = Some(retry.with_initial_delay(backoff));
        self
    }

    /// Disable retries.
    pub fn without_retry(mut self) -> Self {
        self.config.retry = None;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set pool idle timeout.
    pub fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.pool_idle_timeout = timeout;
        self
    }

    /// Set maximum idle connections per host.
    pub fn with_pool_max_idle(mut self, max: usize) -> Self {
        self.config.pool_max_idle_per_host = max;
        self
    }

    /// Route requests through a proxy.
    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.config.proxies.push(proxy);
        self
    }

    /// Enable or disable TLS certificate verification.
    pub fn with_ssl_verify(mut self, verify: bool) -> Self {
        self.config.ssl_verify = verify;
        self
    }

    /// Present a client certificate.
    pub fn with_client_cert(mut self, cert: ClientCert) -> Self {
        self.config.client_cert = Some(cert);
        self
    }

    /// Set the integration vendor.
    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.config.identity.vendor = Some(vendor.into());
        self
    }

    /// Set the integration product.
    pub fn with_product(mut self, product: impl Into<String>) -> Self {
        self.config.identity.product = Some(product.into());
        self
    }

    /// Set the integration build.
    pub fn with_build(mut self, build: impl Into<String>) -> Self {
        self.config.identity.build = Some(build.into());
        self
    }

    /// Set the library name and version reported in the User-Agent.
    pub fn with_library(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.config.lib_name = name.into();
        self.config.lib_version = version.into();
        self
    }

    /// Never log query or body for this path.
    pub fn with_restricted_path(mut self, path: impl Into<String>) -> Self {
        self.config.restricted_paths.push(path.into());
        self
    }

    /// Mask this field in debug logs on every request.
    pub fn with_redact_field(mut self, field: impl Into<String>) -> Self {
        self.config.redact_fields.push(field.into());
        self
    }

    /// Enable or disable compressed responses.
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.config.compression = enabled;
        self
    }

    /// Enable or disable request/response tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.config.enable_tracing = enabled;
        self
    }

    /// Build the session configuration.
    pub fn build(self) -> SessionConfig {
        self.config
    }
}

/// Identity of the integration using the session.
#[derive(Debug, Clone, Default)]
pub struct Identity {
    pub vendor: Option<String>,
    pub product: Option<String>,
    pub build: Option<String>,
}

/// Which requests a proxy applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyScheme {
    Http,
    Https,
    All,
}

/// A proxy for one scheme or for all traffic.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub scheme: ProxyScheme,
    pub url: String,
}

impl ProxyConfig {
    /// Proxy plain HTTP traffic.
    pub fn http(url: impl Into<String>) -> Self {
        Self {
            scheme: ProxyScheme::Http,
            url: url.into(),
        }
    }

    /// Proxy HTTPS traffic.
    pub fn https(url: impl Into<String>) -> Self {
        Self {
            scheme: ProxyScheme::Https,
            url: url.into(),
        }
    }

    /// Proxy all traffic.
    pub fn all(url: impl Into<String>) -> Self {
        Self {
            scheme: ProxyScheme::All,
            url: url.into(),
        }
    }
}

/// PEM encoded client certificate and private key.
#[derive(Debug, Clone)]
pub struct ClientCert {
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl ClientCert {
    pub fn new(cert: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
        Self {
            cert: cert.into(),
            key: key.into(),
        }
    }
}
