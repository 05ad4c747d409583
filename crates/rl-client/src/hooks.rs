//! Extension points for API-specific session behavior.

use async_trait::async_trait;

use crate::error::Result;
use crate::request::RequestBuilder;
use crate::response::Response;
use crate::session::Session;

/// Hooks a concrete API binding implements to customize a [`Session`].
///
/// Every method has a no-op default, so an implementation only overrides what
/// its API needs.
#[async_trait]
pub trait SessionHooks: Send + Sync {
    /// Establish authentication, typically by installing a token on the
    /// session.
    async fn authenticate(&self, _session: &Session) -> Result<()> {
        Ok(())
    }

    /// Tear down authentication.
    async fn deauthenticate(&self, _session: &Session) -> Result<()> {
        Ok(())
    }

    /// Inspect a successful response.
    ///
    /// APIs that report errors inside 2xx bodies can turn them into errors
    /// here.
    async fn check_response(&self, response: Response) -> Result<Response> {
        Ok(response)
    }

    /// Rewrite a request before it is retried.
    ///
    /// `retries` counts the retries made so far, including the one about to
    /// happen.
    async fn retry_request(
        &self,
        _response: &Response,
        _retries: u32,
        request: RequestBuilder,
    ) -> Result<RequestBuilder> {
        Ok(request)
    }
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

#[async_trait]
impl SessionHooks for NoHooks {}
