//! Buffered HTTP responses.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::{Error, ErrorKind, Result};
use crate::request::RequestMethod;

/// A fully read HTTP response.
///
/// The body is buffered so the response can be inspected by hooks, turned
/// into error messages, and decoded more than once.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    method: RequestMethod,
    url: String,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    /// Read a reqwest response to completion.
    pub(crate) async fn from_reqwest(method: RequestMethod, response: reqwest::Response) -> Result<Self> {
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok(Self {
            status,
            method,
            url,
            headers,
            body,
        })
    }

    /// Assemble a response by hand. Headers with invalid names or values are
    /// skipped.
    pub fn from_parts(
        status: u16,
        method: RequestMethod,
        url: impl Into<String>,
        headers: &[(&str, &str)],
        body: impl Into<Bytes>,
    ) -> Self {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                map.append(name, value);
            }
        }
        Self {
            status,
            method,
            url: url.into(),
            headers: map,
            body: body.into(),
        }
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns true if the response status is successful (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Method of the request that produced this response.
    pub fn method(&self) -> RequestMethod {
        self.method
    }

    /// Final URL, after redirects.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// All response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Returns true if the body should be treated as JSON. A missing
    /// Content-Type counts as JSON.
    pub fn is_json(&self) -> bool {
        self.content_type()
            .unwrap_or("application/json")
            .to_ascii_lowercase()
            .contains("application/json")
    }

    /// Get the Retry-After header as a Duration.
    ///
    /// Accepts delay seconds, including fractional values such as `.5`, and
    /// HTTP dates. Delays too large for a `Duration` saturate at
    /// `Duration::MAX`.
    pub fn retry_after(&self) -> Option<Duration> {
        let value = self.header("retry-after")?.trim();

        if let Ok(seconds) = value.parse::<f64>() {
            if seconds.is_finite() && seconds >= 0.0 {
                return Some(Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX));
            }
            return None;
        }

        let date = chrono::DateTime::parse_from_rfc2822(value).ok()?;
        let wait = date.with_timezone(&chrono::Utc) - chrono::Utc::now();
        Some(wait.to_std().unwrap_or(Duration::ZERO))
    }

    /// Raw body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Get the response body as bytes.
    pub fn bytes(&self) -> Bytes {
        self.body.clone()
    }

    /// Get the response body as text.
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec()).map_err(|e| {
            Error::with_source(
                ErrorKind::Other("Failed to decode response as UTF-8".to_string()),
                e,
            )
        })
    }

    /// Deserialize the response body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(Into::into)
    }

    /// Decode the body as JSON when it is JSON, otherwise hand the response
    /// back untouched.
    pub fn into_payload(self) -> Result<Payload> {
        if self.is_json() && !self.body.is_empty() {
            let value = self.json()?;
            return Ok(Payload::Json(value));
        }
        Ok(Payload::Raw(self))
    }
}

/// A response body decoded on a best-effort basis.
#[derive(Debug, Clone)]
pub enum Payload {
    /// The body was JSON (an object, a list, or a scalar).
    Json(serde_json::Value),
    /// The body was not JSON or was empty.
    Raw(Response),
}

impl Payload {
    /// Returns true if the body was decoded as JSON.
    pub fn is_json(&self) -> bool {
        matches!(self, Payload::Json(_))
    }

    /// Borrow the JSON value, if any.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Payload::Json(value) => Some(value),
            Payload::Raw(_) => None,
        }
    }

    /// Take the JSON value, if any.
    pub fn into_json(self) -> Option<serde_json::Value> {
        match self {
            Payload::Json(value) => Some(value),
            Payload::Raw(_) => None,
        }
    }

    /// Take the raw response, if the body was not JSON.
    pub fn into_response(self) -> Option<Response> {
        match self {
            Payload::Json(_) => None,
            Payload::Raw(response) => Some(response),
        }
    }
}
