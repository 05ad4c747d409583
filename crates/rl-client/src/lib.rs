//! # restline-client
//!
//! Scaffolding for REST API client libraries.
//!
//! This crate provides the building blocks an API binding is made of:
//! - [`Session`]: a persistent HTTP client with retry/backoff, Retry-After
//!   handling and status code to error mapping
//! - [`Endpoint`]: request helpers scoped to a resource path
//! - [`ApiIterator`]: lazy, record-at-a-time pagination
//! - [`check::Check`]: validation of caller supplied values
//! - [`utils`]: JSON object, string and URL helpers
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    API binding crate                        │
//! │  (typed endpoints, models, page fetchers, SessionHooks)     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Endpoint / ApiIterator                         │
//! │  - Path scoping and typed JSON helpers                      │
//! │  - Page fetching with total/max_items/max_pages limits      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Session                              │
//! │  - URL resolution, auth state, User-Agent                   │
//! │  - Retry state machine and ErrorMap                         │
//! │  - Buffered responses                                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use restline_client::{Session, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), restline_client::Error> {
//!     let session = Session::new(
//!         SessionConfig::builder()
//!             .with_url("https://httpbin.org")
//!             .with_vendor("acme")
//!             .with_product("example")
//!             .build(),
//!     )?;
//!
//!     let body: serde_json::Value = session.get_json("get").await?;
//!     println!("{body}");
//!     Ok(())
//! }
//! ```

pub mod check;
mod config;
mod endpoint;
mod error;
mod hooks;
mod iterator;
mod request;
mod response;
mod retry;
mod session;
pub mod utils;

pub use config::{
    ClientCert, Identity, ProxyConfig, ProxyScheme, SessionConfig, SessionConfigBuilder,
};
pub use endpoint::{ApiEndpoint, Endpoint};
pub use error::{ApiError, Error, ErrorKind, ErrorMap, Result, StatusKind};
pub use hooks::{NoHooks, SessionHooks};
pub use iterator::{ApiIterator, Page, PageCursor, PageFetcher};
pub use request::{RequestBody, RequestBuilder, RequestMethod};
pub use response::{Payload, Response};
pub use retry::{BackoffStrategy, RetryConfig, RetryPolicy};
pub use session::{Session, SessionBuilder};

/// Name reported for this library in the User-Agent.
pub const LIB_NAME: &str = "restline";

/// Version of this library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
