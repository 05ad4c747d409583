//! Error types for restline-client.
//!
//! HTTP error statuses are mapped onto [`StatusKind`] through an [`ErrorMap`].
//! The map is owned by each [`Session`](crate::Session), so which kinds are
//! retried can be tuned per session instead of globally.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;

use regex_lite::Regex;

use crate::response::Response;

/// Result type alias for restline-client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for restline-client operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        tracing::error!(error = %kind, "{}", kind.label());
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        tracing::error!(error = %kind, "{}", kind.label());
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// Returns true if this error came from an error response.
    pub fn is_api_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Api(_))
    }

    /// Returns the API error details, if any.
    pub fn api_error(&self) -> Option<&ApiError> {
        match &self.kind {
            ErrorKind::Api(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the status kind of an API error.
    pub fn status_kind(&self) -> Option<StatusKind> {
        self.api_error().map(|e| e.kind)
    }

    /// Returns the HTTP status code of an API error.
    pub fn status(&self) -> Option<u16> {
        self.api_error().map(|e| e.status)
    }

    /// Returns how many retries were made before this error was returned.
    pub fn retries(&self) -> Option<u32> {
        self.api_error().map(|e| e.retries)
    }

    /// Returns true if this is a rate limit error (420 or 429).
    pub fn is_rate_limited(&self) -> bool {
        self.status_kind() == Some(StatusKind::TooManyRequests)
    }

    /// Returns true if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        self.status_kind() == Some(StatusKind::Unauthorized)
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// The API answered with an error status.
    #[error("{0}")]
    Api(ApiError),

    /// Request timeout.
    #[error("Request timeout")]
    Timeout,

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Any other failure inside the HTTP library.
    #[error("Transport error: {0}")]
    Transport(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A value fell outside of the expected bounds.
    #[error("Unexpected value: {0}")]
    UnexpectedValue(String),

    /// A required value was not provided.
    #[error("Required parameter missing: {0}")]
    RequiredParameter(String),

    /// A value was not of the expected type.
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// A validator referenced a pattern name that does not exist.
    #[error("Unknown pattern: {0}")]
    UnknownPattern(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl ErrorKind {
    /// Returns true if this error kind is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            ErrorKind::Timeout => true,
            ErrorKind::Connection(_) => true,
            ErrorKind::Api(err) => err.retryable,
            _ => false,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ErrorKind::Api(err) => err.kind.name(),
            ErrorKind::Timeout => "Timeout",
            ErrorKind::Connection(_) => "ConnectionError",
            ErrorKind::Transport(_) => "TransportError",
            ErrorKind::Json(_) => "JsonError",
            ErrorKind::InvalidUrl(_) => "InvalidUrl",
            ErrorKind::Config(_) => "ConfigError",
            ErrorKind::UnexpectedValue(_) => "UnexpectedValueError",
            ErrorKind::RequiredParameter(_) => "RequiredParameterError",
            ErrorKind::TypeMismatch(_) => "TypeError",
            ErrorKind::UnknownPattern(_) => "UnknownPatternError",
            ErrorKind::Other(_) => "Error",
        }
    }
}

/// Named HTTP error statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    InvalidMethod,
    NotAcceptable,
    ProxyAuthentication,
    RequestTimeout,
    RequestConflict,
    NoLongerExists,
    LengthRequired,
    PreconditionFailed,
    PayloadTooLarge,
    UriTooLong,
    UnsupportedMediaType,
    RangeNotSatisfiable,
    ExpectationFailed,
    Teapot,
    TooManyRequests,
    MisdirectRequest,
    TooEarly,
    UpgradeRequired,
    PreconditionRequired,
    RequestHeaderFieldsTooLarge,
    UnavailableForLegalReasons,
    ServerError,
    MethodNotImplemented,
    BadGateway,
    ServiceUnavailable,
    GatewayTimeout,
    NotExtended,
    NetworkAuthenticationRequired,
    /// A non-success status without a dedicated kind.
    Unknown,
}

impl StatusKind {
    /// Map a status code to its default kind.
    pub fn from_status(status: u16) -> Option<StatusKind> {
        let kind = match status {
            400 => StatusKind::BadRequest,
            401 => StatusKind::Unauthorized,
            403 => StatusKind::Forbidden,
            404 => StatusKind::NotFound,
            405 => StatusKind::InvalidMethod,
            406 => StatusKind::NotAcceptable,
            407 => StatusKind::ProxyAuthentication,
            408 => StatusKind::RequestTimeout,
            409 => StatusKind::RequestConflict,
            410 => StatusKind::NoLongerExists,
            411 => StatusKind::LengthRequired,
            412 => StatusKind::PreconditionFailed,
            413 => StatusKind::PayloadTooLarge,
            414 => StatusKind::UriTooLong,
            415 => StatusKind::UnsupportedMediaType,
            416 => StatusKind::RangeNotSatisfiable,
            417 => StatusKind::ExpectationFailed,
            418 => StatusKind::Teapot,
            420 | 429 => StatusKind::TooManyRequests,
            421 => StatusKind::MisdirectRequest,
            425 => StatusKind::TooEarly,
            426 => StatusKind::UpgradeRequired,
            428 => StatusKind::PreconditionRequired,
            431 => StatusKind::RequestHeaderFieldsTooLarge,
            451 => StatusKind::UnavailableForLegalReasons,
            500 => StatusKind::ServerError,
            501 => StatusKind::MethodNotImplemented,
            502 => StatusKind::BadGateway,
            503 => StatusKind::ServiceUnavailable,
            504 => StatusKind::GatewayTimeout,
            510 => StatusKind::NotExtended,
            511 => StatusKind::NetworkAuthenticationRequired,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether this kind is retried out of the box.
    pub fn default_retryable(&self) -> bool {
        matches!(
            self,
            StatusKind::TooManyRequests
                | StatusKind::MethodNotImplemented
                | StatusKind::BadGateway
                | StatusKind::ServiceUnavailable
                | StatusKind::GatewayTimeout
        )
    }

    /// Human readable name of the kind.
    pub fn name(&self) -> &'static str {
        match self {
            StatusKind::BadRequest => "BadRequestError",
            StatusKind::Unauthorized => "UnauthorizedError",
            StatusKind::Forbidden => "ForbiddenError",
            StatusKind::NotFound => "NotFoundError",
            StatusKind::InvalidMethod => "InvalidMethodError",
            StatusKind::NotAcceptable => "NotAcceptableError",
            StatusKind::ProxyAuthentication => "ProxyAuthenticationError",
            StatusKind::RequestTimeout => "RequestTimeoutError",
            StatusKind::RequestConflict => "RequestConflictError",
            StatusKind::NoLongerExists => "NoLongerExistsError",
            StatusKind::LengthRequired => "LengthRequiredError",
            StatusKind::PreconditionFailed => "PreconditionFailedError",
            StatusKind::PayloadTooLarge => "PayloadTooLargeError",
            StatusKind::UriTooLong => "UriTooLongError",
            StatusKind::UnsupportedMediaType => "UnsupportedMediaTypeError",
            StatusKind::RangeNotSatisfiable => "RangeNotSatisfiableError",
            StatusKind::ExpectationFailed => "ExpectationFailedError",
            StatusKind::Teapot => "TeapotResponseError",
            StatusKind::TooManyRequests => "TooManyRequestsError",
            StatusKind::MisdirectRequest => "MisdirectRequestError",
            StatusKind::TooEarly => "TooEarlyError",
            StatusKind::UpgradeRequired => "UpgradeRequiredError",
            StatusKind::PreconditionRequired => "PreconditionRequiredError",
            StatusKind::RequestHeaderFieldsTooLarge => "RequestHeaderFieldsTooLargeError",
            StatusKind::UnavailableForLegalReasons => "UnavailableForLegalReasonsError",
            StatusKind::ServerError => "ServerError",
            StatusKind::MethodNotImplemented => "MethodNotImplementedError",
            StatusKind::BadGateway => "BadGatewayError",
            StatusKind::ServiceUnavailable => "ServiceUnavailableError",
            StatusKind::GatewayTimeout => "GatewayTimeoutError",
            StatusKind::NotExtended => "NotExtendedError",
            StatusKind::NetworkAuthenticationRequired => "NetworkAuthenticationRequiredError",
            StatusKind::Unknown => "APIError",
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Details of an error response.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// The mapped kind of the status.
    pub kind: StatusKind,
    /// HTTP status code of the offending response.
    pub status: u16,
    /// Method of the request that failed.
    pub method: String,
    /// Final URL of the request that failed.
    pub url: String,
    /// Sanitized, truncated response body.
    pub body: String,
    /// Number of retries made before giving up.
    pub retries: u32,
    /// Whether the kind was retryable under the session's error map.
    pub retryable: bool,
}

impl ApiError {
    /// Build the error details from a response.
    pub fn from_response(response: &Response, kind: StatusKind, retryable: bool, retries: u32) -> Self {
        Self {
            kind,
            status: response.status(),
            method: response.method().to_string(),
            url: response.url().to_string(),
            body: sanitize_error_message(&String::from_utf8_lossy(response.body())),
            retries,
            retryable,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}: {}] {} body={}",
            self.status, self.method, self.url, self.body
        )
    }
}

/// Status code to [`StatusKind`] table plus the set of retryable kinds.
#[derive(Debug, Clone)]
pub struct ErrorMap {
    codes: HashMap<u16, StatusKind>,
    retryable: HashSet<StatusKind>,
}

impl Default for ErrorMap {
    fn default() -> Self {
        let mut codes = HashMap::new();
        let mut retryable = HashSet::new();
        for status in 400..600u16 {
            if let Some(kind) = StatusKind::from_status(status) {
                codes.insert(status, kind);
                if kind.default_retryable() {
                    retryable.insert(kind);
                }
            }
        }
        Self { codes, retryable }
    }
}

impl ErrorMap {
    /// Look up the kind mapped to a status code.
    pub fn lookup(&self, status: u16) -> Option<StatusKind> {
        self.codes.get(&status).copied()
    }

    /// Map a status code onto a kind, replacing any existing mapping.
    pub fn insert(&mut self, status: u16, kind: StatusKind) {
        self.codes.insert(status, kind);
    }

    /// Remove a status code from the map; it then falls through to the
    /// catch-all error.
    pub fn remove(&mut self, status: u16) {
        self.codes.remove(&status);
    }

    /// Returns true if the kind is retried.
    pub fn is_retryable(&self, kind: StatusKind) -> bool {
        self.retryable.contains(&kind)
    }

    /// Mark a kind as retryable or not.
    pub fn set_retryable(&mut self, kind: StatusKind, value: bool) {
        if value {
            self.retryable.insert(kind);
        } else {
            self.retryable.remove(&kind);
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else if err.is_connect() {
            ErrorKind::Connection(err.to_string())
        } else if err.is_builder() {
            ErrorKind::Config(err.to_string())
        } else {
            ErrorKind::Transport(err.to_string())
        };

        Error::with_source(kind, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::InvalidUrl(err.to_string()), err)
    }
}

static BEARER_TOKEN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)bearer\s+[A-Za-z0-9._~+/=-]+").ok());

static CREDENTIAL_PARAM: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(access_token|refresh_token|api_key|apikey|password|secret)=[^&\s"]+"#)
        .ok()
});

/// Sanitize a response body before it is put into an error message.
///
/// Bearer tokens and credential-looking query/body parameters are replaced,
/// and the message is truncated to 500 characters.
pub(crate) fn sanitize_error_message(message: &str) -> String {
    const MAX_LENGTH: usize = 500;

    let mut sanitized = message.to_string();

    if let Some(bearer) = BEARER_TOKEN.as_ref() {
        sanitized = bearer
            .replace_all(&sanitized, "Bearer [REDACTED]")
            .to_string();
    }

    if let Some(params) = CREDENTIAL_PARAM.as_ref() {
        sanitized = params.replace_all(&sanitized, "$1=[REDACTED]").to_string();
    }

    if sanitized.chars().count() > MAX_LENGTH {
        sanitized = sanitized.chars().take(MAX_LENGTH).collect();
        sanitized.push_str("...[truncated]");
    }

    sanitized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(kind: StatusKind, status: u16, retryable: bool) -> Error {
        Error::new(ErrorKind::Api(ApiError {
            kind,
            status,
            method: "GET".into(),
            url: "https://api.example.com/items".into(),
            body: String::new(),
            retries: 0,
            retryable,
        }))
    }

    #[test]
    fn test_error_is_retryable() {
        assert!(Error::new(ErrorKind::Timeout).is_retryable());
        assert!(Error::new(ErrorKind::Connection("refused".into())).is_retryable());
        assert!(api_error(StatusKind::ServiceUnavailable, 503, true).is_retryable());
        assert!(!api_error(StatusKind::NotFound, 404, false).is_retryable());
        assert!(!Error::new(ErrorKind::Json("eof".into())).is_retryable());
    }

    #[test]
    fn test_status_helpers() {
        let err = api_error(StatusKind::TooManyRequests, 429, true);
        assert!(err.is_api_error());
        assert!(err.is_rate_limited());
        assert_eq!(err.status(), Some(429));
        assert_eq!(err.retries(), Some(0));

        let err = api_error(StatusKind::Unauthorized, 401, false);
        assert!(err.is_auth_error());
        assert!(!err.is_rate_limited());

        let err = Error::new(ErrorKind::Timeout);
        assert_eq!(err.status(), None);
        assert!(err.api_error().is_none());
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError {
            kind: StatusKind::BadRequest,
            status: 400,
            method: "POST".into(),
            url: "https://api.example.com/items".into(),
            body: "{\"message\":\"bad\"}".into(),
            retries: 0,
            retryable: false,
        };
        assert_eq!(
            err.to_string(),
            "[400: POST] https://api.example.com/items body={\"message\":\"bad\"}"
        );
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (400, StatusKind::BadRequest),
            (401, StatusKind::Unauthorized),
            (403, StatusKind::Forbidden),
            (404, StatusKind::NotFound),
            (418, StatusKind::Teapot),
            (420, StatusKind::TooManyRequests),
            (429, StatusKind::TooManyRequests),
            (451, StatusKind::UnavailableForLegalReasons),
            (500, StatusKind::ServerError),
            (511, StatusKind::NetworkAuthenticationRequired),
        ];
        for (status, kind) in cases {
            assert_eq!(StatusKind::from_status(status), Some(kind), "status {status}");
        }

        assert_eq!(StatusKind::from_status(422), None);
        assert_eq!(StatusKind::from_status(555), None);
        assert_eq!(StatusKind::from_status(200), None);
    }

    #[test]
    fn test_default_retryable_kinds() {
        let map = ErrorMap::default();
        for status in [420, 429, 501, 502, 503, 504] {
            let kind = map.lookup(status).unwrap();
            assert!(map.is_retryable(kind), "HTTP {status} should be retryable");
        }
        for status in [400, 401, 403, 404, 409, 500, 510] {
            let kind = map.lookup(status).unwrap();
            assert!(!map.is_retryable(kind), "HTTP {status} should NOT be retryable");
        }
    }

    #[test]
    fn test_set_retryable() {
        let mut map = ErrorMap::default();
        assert!(!map.is_retryable(StatusKind::ServerError));
        map.set_retryable(StatusKind::ServerError, true);
        assert!(map.is_retryable(StatusKind::ServerError));
        map.set_retryable(StatusKind::ServerError, false);
        assert!(!map.is_retryable(StatusKind::ServerError));
    }

    #[test]
    fn test_error_map_overrides() {
        let mut map = ErrorMap::default();
        map.insert(422, StatusKind::BadRequest);
        assert_eq!(map.lookup(422), Some(StatusKind::BadRequest));
        map.remove(404);
        assert_eq!(map.lookup(404), None);
    }

    #[test]
    fn test_error_kind_display_messages() {
        let cases: Vec<(ErrorKind, &str)> = vec![
            (ErrorKind::Timeout, "Request timeout"),
            (ErrorKind::Connection("refused".into()), "Connection error: refused"),
            (ErrorKind::Json("unexpected EOF".into()), "JSON error: unexpected EOF"),
            (ErrorKind::InvalidUrl("no scheme".into()), "Invalid URL: no scheme"),
            (ErrorKind::Config("missing url".into()), "Configuration error: missing url"),
            (
                ErrorKind::UnexpectedValue("test has value of 5".into()),
                "Unexpected value: test has value of 5",
            ),
            (ErrorKind::TypeMismatch("expected int".into()), "Type mismatch: expected int"),
            (ErrorKind::UnknownPattern("nope".into()), "Unknown pattern: nope"),
            (ErrorKind::Other("something else".into()), "something else"),
        ];

        for (kind, expected_substring) in cases {
            let display = kind.to_string();
            assert!(
                display.contains(expected_substring),
                "Expected '{display}' to contain '{expected_substring}'"
            );
        }
    }

    #[test]
    fn test_error_with_source() {
        let source_err = std::io::Error::other("disk full");
        let err = Error::with_source(ErrorKind::Other("write failed".into()), source_err);

        assert!(err.source.is_some());
        assert_eq!(err.to_string(), "write failed");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<String>("not valid json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err.kind, ErrorKind::Json(_)));
        assert!(err.source.is_some());
    }

    #[test]
    fn test_from_url_parse_error() {
        let url_err = url::Url::parse("not a url").unwrap_err();
        let err: Error = url_err.into();
        assert!(matches!(err.kind, ErrorKind::InvalidUrl(_)));
    }

    #[test]
    fn test_sanitize_patterns_compile() {
        assert!(BEARER_TOKEN.is_some());
        assert!(CREDENTIAL_PARAM.is_some());
    }

    #[test]
    fn test_sanitize_redacts_bearer_tokens() {
        let sanitized = sanitize_error_message("rejected Authorization: Bearer ghp_abc123.def");
        assert!(sanitized.contains("Bearer [REDACTED]"), "{sanitized}");
        assert!(!sanitized.contains("ghp_abc123"), "{sanitized}");
    }

    #[test]
    fn test_sanitize_redacts_credential_params() {
        let sanitized = sanitize_error_message("url was /login?user=bob&password=hunter2&x=1");
        assert!(sanitized.contains("password=[REDACTED]"), "{sanitized}");
        assert!(!sanitized.contains("hunter2"), "{sanitized}");
        assert!(sanitized.contains("user=bob"));
    }

    #[test]
    fn test_sanitize_truncates_long_messages() {
        let sanitized = sanitize_error_message(&"é".repeat(600));
        assert!(sanitized.ends_with("...[truncated]"));
        assert_eq!(sanitized.chars().count(), 500 + "...[truncated]".len());
    }

    #[test]
    fn test_sanitize_passes_through_clean_messages() {
        let msg = "{\"message\":\"Not Found\"}";
        assert_eq!(sanitize_error_message(msg), msg);
    }
}
