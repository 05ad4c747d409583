//! Resource-scoped request helpers.

use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::request::{RequestBuilder, RequestMethod};
use crate::response::{Payload, Response};
use crate::session::Session;

/// A group of API calls that share a path under a [`Session`].
///
/// ```rust,no_run
/// # async fn example() -> restline_client::Result<()> {
/// use restline_client::{Endpoint, Session, SessionConfig};
///
/// let session = Session::new(SessionConfig::builder().with_url("https://api.example.com").build())?;
/// let items = Endpoint::with_path(session, "items");
///
/// // GET https://api.example.com/items/42
/// let item: serde_json::Value = items.get_json("42").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Endpoint {
    session: Session,
    path: Option<String>,
}

impl Endpoint {
    /// An endpoint rooted at the session's base URL.
    pub fn new(session: Session) -> Self {
        Self {
            session,
            path: None,
        }
    }

    /// An endpoint rooted at `path`.
    pub fn with_path(session: Session, path: impl Into<String>) -> Self {
        Self {
            session,
            path: Some(path.into()),
        }
    }

    /// The session requests go through.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The endpoint path, if any.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Build a request for `path` under the endpoint path. Empty segments
    /// are skipped.
    pub fn req(&self, method: RequestMethod, path: &str) -> RequestBuilder {
        RequestBuilder::new(method, path).prefix_path(self.path.as_deref().unwrap_or_default())
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.req(RequestMethod::Get, path)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.req(RequestMethod::Post, path)
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.req(RequestMethod::Put, path)
    }

    pub fn patch(&self, path: &str) -> RequestBuilder {
        self.req(RequestMethod::Patch, path)
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.req(RequestMethod::Delete, path)
    }

    pub fn head(&self, path: &str) -> RequestBuilder {
        self.req(RequestMethod::Head, path)
    }

    /// Send a request through the session.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        self.session.send(request).await
    }

    /// Send a request and deserialize the JSON response.
    pub async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        self.session.send_json(request).await
    }

    /// Send a request and decode the body as JSON when it is JSON.
    pub async fn payload(&self, request: RequestBuilder) -> Result<Payload> {
        self.session.payload(request).await
    }

    /// GET `path` under the endpoint and deserialize the JSON response.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_json(self.get(path)).await
    }
}

/// Implemented by typed endpoint wrappers.
pub trait ApiEndpoint {
    /// The endpoint the wrapper is built on.
    fn endpoint(&self) -> &Endpoint;

    fn session(&self) -> &Session {
        self.endpoint().session()
    }

    /// See [`Endpoint::req`].
    fn req(&self, method: RequestMethod, path: &str) -> RequestBuilder {
        self.endpoint().req(method, path)
    }
}
