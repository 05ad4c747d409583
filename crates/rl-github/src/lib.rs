//! # restline-github
//!
//! Bindings for the GitHub users API, built on `restline-client`.
//!
//! - [`GithubSession`]: bearer-token session against `api.github.com` or a
//!   GitHub Enterprise URL
//! - [`UsersApi`]: the user listing, single profiles and the authenticated user
//!
//! ## Example
//!
//! ```rust,no_run
//! use restline_github::{GithubSession, ListUsers};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), restline_github::Error> {
//!     let github = GithubSession::from_env()?;
//!     github
//!         .scoped(|github| async move {
//!             let mut users = github.users().list(ListUsers::default().max_pages(Some(1)));
//!             while let Some(user) = users.next().await? {
//!                 println!("{} {}", user.id, user.login);
//!             }
//!             Ok::<_, restline_github::Error>(())
//!         })
//!         .await
//! }
//! ```

mod error;
mod session;
mod types;
mod users;

pub use error::{Error, ErrorKind, Result};
pub use session::{GithubHooks, GithubSession, DEFAULT_URL, TOKEN_ENV, URL_ENV};
pub use types::User;
pub use users::{ListUsers, UsersApi, UsersPager, MAX_PER_PAGE};

/// Version of this library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
