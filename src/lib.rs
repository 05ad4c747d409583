//! # restline
//!
//! Scaffolding for building REST API client wrappers in Rust.
//!
//! ## Crates
//!
//! - **restline-client** - Session with retry/backoff and status code to error
//!   mapping, endpoints, pagination iterators, validators and JSON utilities
//! - **restline-github** - Example bindings for the GitHub users API
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use restline::{ApiIterator, Endpoint, Session, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), restline::Error> {
//!     let session = Session::new(
//!         SessionConfig::builder()
//!             .with_url("https://api.example.com")
//!             .with_retries(3)
//!             .build(),
//!     )?;
//!
//!     let widgets = Endpoint::with_path(session, "widgets");
//!     let widget: serde_json::Value = widgets.get_json("42").await?;
//!     println!("{widget}");
//!     Ok(())
//! }
//! ```

pub use restline_client as client;
#[cfg(feature = "github")]
pub use restline_github as github;

pub use restline_client::check;
pub use restline_client::utils;
pub use restline_client::{
    ApiEndpoint, ApiError, ApiIterator, Endpoint, Error, ErrorKind, ErrorMap, Page, PageCursor,
    PageFetcher, Payload, RequestBuilder, RequestMethod, Response, Result, RetryConfig, Session,
    SessionConfig, SessionHooks, StatusKind,
};
#[cfg(feature = "github")]
pub use restline_github::GithubSession;
