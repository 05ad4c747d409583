//! HTTP request building.

use bytes::Bytes;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, ErrorKind, Result};

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
    Patch,
    Put,
    Delete,
    Head,
}

impl RequestMethod {
    /// Convert to reqwest::Method.
    pub fn to_reqwest(&self) -> reqwest::Method {
        match self {
            RequestMethod::Get => reqwest::Method::GET,
            RequestMethod::Post => reqwest::Method::POST,
            RequestMethod::Patch => reqwest::Method::PATCH,
            RequestMethod::Put => reqwest::Method::PUT,
            RequestMethod::Delete => reqwest::Method::DELETE,
            RequestMethod::Head => reqwest::Method::HEAD,
        }
    }

    /// Upper-case method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Patch => "PATCH",
            RequestMethod::Put => "PUT",
            RequestMethod::Delete => "DELETE",
            RequestMethod::Head => "HEAD",
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(RequestMethod::Get),
            "POST" => Ok(RequestMethod::Post),
            "PATCH" => Ok(RequestMethod::Patch),
            "PUT" => Ok(RequestMethod::Put),
            "DELETE" => Ok(RequestMethod::Delete),
            "HEAD" => Ok(RequestMethod::Head),
            other => Err(Error::new(ErrorKind::UnexpectedValue(format!(
                "method has value of {other}.  Expected one of GET,POST,PATCH,PUT,DELETE,HEAD"
            )))),
        }
    }
}

/// Builder for a request against a [`Session`](crate::Session).
///
/// The path is resolved against the session URL when the request is sent,
/// so the same builder can be replayed on retries.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    pub(crate) method: RequestMethod,
    pub(crate) path: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) query_params: Vec<(String, String)>,
    pub(crate) body: Option<RequestBody>,
    pub(crate) bearer_token: Option<String>,
    pub(crate) use_base: bool,
    pub(crate) redact_fields: Vec<String>,
}

/// Request body content.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(serde_json::Value),
    Text(String),
    Bytes(Bytes),
}

impl RequestBuilder {
    /// Create a new request builder.
    pub fn new(method: RequestMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            query_params: Vec::new(),
            body: None,
            bearer_token: None,
            use_base: true,
            redact_fields: Vec::new(),
        }
    }

    /// The request method.
    pub fn method(&self) -> RequestMethod {
        self.method
    }

    /// The unresolved request path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters added so far.
    pub fn query_params(&self) -> &[(String, String)] {
        &self.query_params
    }

    /// The request body, if any.
    pub fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    /// Value of a header set on this request.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Set the bearer token for this request only.
    pub fn bearer_auth(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Add a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add a query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query_params.push((name.into(), value.to_string()));
        self
    }

    /// Add several query parameters.
    pub fn query_pairs<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: ToString,
    {
        self.query_params
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.to_string())));
        self
    }

    /// Replace a query parameter, adding it if missing.
    pub fn set_query(mut self, name: &str, value: impl ToString) -> Self {
        self.query_params.retain(|(k, _)| k != name);
        self.query_params.push((name.to_string(), value.to_string()));
        self
    }

    /// Set JSON body.
    pub fn json<T: Serialize>(self, body: &T) -> Result<Self> {
        let value = serde_json::to_value(body)?;
        Ok(self.json_value(value))
    }

    /// Set raw JSON body.
    pub fn json_value(mut self, body: serde_json::Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self.headers
            .push(("Content-Type".to_string(), "application/json".to_string()));
        self
    }

    /// Set text body.
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Text(body.into()));
        self.headers
            .push(("Content-Type".to_string(), "text/plain".to_string()));
        self
    }

    /// Set bytes body.
    pub fn bytes(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(RequestBody::Bytes(body.into()));
        self
    }

    /// Skip the session base path for this request.
    pub fn use_base(mut self, use_base: bool) -> Self {
        self.use_base = use_base;
        self
    }

    /// Mask these fields when the request is logged.
    pub fn redact_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.redact_fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Prefix the path with an endpoint path.
    pub(crate) fn prefix_path(mut self, prefix: &str) -> Self {
        self.path = join_path(&[prefix, &self.path]);
        self
    }
}

/// Join path segments with `/`, skipping empty segments.
pub(crate) fn join_path(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim_matches('/'))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let req = RequestBuilder::new(RequestMethod::Get, "items")
            .bearer_auth("token123")
            .header("X-Custom", "value")
            .query("per_page", 10)
            .query("since", "0");

        assert_eq!(req.method(), RequestMethod::Get);
        assert_eq!(req.path(), "items");
        assert_eq!(req.bearer_token, Some("token123".to_string()));
        assert_eq!(req.header_value("x-custom"), Some("value"));
        assert_eq!(req.query_params().len(), 2);
        assert!(req.use_base);
    }

    #[test]
    fn test_set_query_replaces() {
        let req = RequestBuilder::new(RequestMethod::Get, "users")
            .query("since", 0)
            .set_query("since", 46);
        assert_eq!(req.query_params(), &[("since".to_string(), "46".to_string())]);
    }

    #[test]
    fn test_json_body() {
        let data = serde_json::json!({"name": "widget"});
        let req = RequestBuilder::new(RequestMethod::Post, "items")
            .json(&data)
            .unwrap();

        assert!(matches!(req.body(), Some(RequestBody::Json(_))));
        assert_eq!(req.header_value("Content-Type"), Some("application/json"));
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!("get".parse::<RequestMethod>().unwrap(), RequestMethod::Get);
        assert_eq!("PATCH".parse::<RequestMethod>().unwrap(), RequestMethod::Patch);
        let err = "TRACE".parse::<RequestMethod>().unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnexpectedValue(_)));
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path(&["users", "octocat"]), "users/octocat");
        assert_eq!(join_path(&["users", ""]), "users");
        assert_eq!(join_path(&["", "get"]), "get");
        assert_eq!(join_path(&["/users/", "/repos"]), "users/repos");
    }

    #[test]
    fn test_prefix_path() {
        let req = RequestBuilder::new(RequestMethod::Get, "42").prefix_path("users");
        assert_eq!(req.path(), "users/42");
    }
}
