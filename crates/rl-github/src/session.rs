//! The GitHub session.

use std::env;
use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use tracing::{debug, instrument};

use restline_client::{Session, SessionConfig, SessionHooks};

use crate::error::{Error, ErrorKind, Result};
use crate::users::UsersApi;

/// Public GitHub REST API.
pub const DEFAULT_URL: &str = "https://api.github.com";

/// Environment variable holding the API URL.
pub const URL_ENV: &str = "GITHUB_URL";

/// Environment variable holding the access token.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

const MEDIA_TYPE: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";

/// Installs the access token on `authenticate` and removes it on
/// `deauthenticate`.
#[derive(Clone)]
pub struct GithubHooks {
    token: String,
}

impl fmt::Debug for GithubHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubHooks")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl SessionHooks for GithubHooks {
    async fn authenticate(&self, session: &Session) -> restline_client::Result<()> {
        session.set_bearer_token(self.token.clone());
        debug!("GitHub token installed");
        Ok(())
    }

    async fn deauthenticate(&self, session: &Session) -> restline_client::Result<()> {
        session.clear_auth();
        debug!("GitHub token removed");
        Ok(())
    }
}

/// A session against the GitHub REST API.
///
/// # Example
///
/// ```rust,no_run
/// use restline_github::GithubSession;
///
/// # async fn example() -> restline_github::Result<()> {
/// let github = GithubSession::from_env()?;
/// github
///     .scoped(|github| async move {
///         let me = github.users().current_user().await?;
///         println!("{} ({})", me.login, me.id);
///         Ok::<_, restline_github::Error>(())
///     })
///     .await
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GithubSession {
    session: Session,
}

impl GithubSession {
    /// Create a session for `url` using `token`.
    ///
    /// The token is installed by [`authenticate`](Self::authenticate) or
    /// [`scoped`](Self::scoped).
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        Self::with_config(SessionConfig::builder().with_url(url).build(), token)
    }

    /// Create a session from `GITHUB_URL` and `GITHUB_TOKEN`.
    ///
    /// `GITHUB_URL` defaults to [`DEFAULT_URL`].
    pub fn from_env() -> Result<Self> {
        Self::resolve(None, None)
    }

    /// Create a session, taking whatever is not given from the environment.
    pub fn resolve(url: Option<String>, token: Option<String>) -> Result<Self> {
        let url = url
            .or_else(|| env::var(URL_ENV).ok())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_URL.to_string());
        let token = token.or_else(|| env::var(TOKEN_ENV).ok()).unwrap_or_default();
        Self::new(url, token)
    }

    /// Create a session with a custom configuration.
    ///
    /// A config without a URL points at [`DEFAULT_URL`].
    pub fn with_config(mut config: SessionConfig, token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(Error::new(ErrorKind::Config(
                "No Github token has been provided".to_string(),
            )));
        }

        if config.url.is_none() {
            config.url = Some(DEFAULT_URL.to_string());
        }
        config.lib_name = "restline-github".to_string();
        config.lib_version = crate::VERSION.to_string();

        let session = Session::with_hooks(config, GithubHooks { token })?;
        session.set_header("Accept", MEDIA_TYPE);
        session.set_header("X-GitHub-Api-Version", API_VERSION);
        Ok(Self { session })
    }

    /// The underlying session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The users API.
    pub fn users(&self) -> UsersApi {
        UsersApi::new(self.session.clone())
    }

    /// Install the access token.
    #[instrument(skip(self))]
    pub async fn authenticate(&self) -> Result<()> {
        self.session.authenticate().await.map_err(Into::into)
    }

    /// Remove the access token.
    #[instrument(skip(self))]
    pub async fn deauthenticate(&self) -> Result<()> {
        self.session.deauthenticate().await.map_err(Into::into)
    }

    /// Authenticate, run `f`, then deauthenticate, even if `f` failed.
    pub async fn scoped<F, Fut, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(GithubSession) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.authenticate().await?;
        let result = f(self.clone()).await;
        let logout = self.deauthenticate().await;
        let value = result?;
        logout?;
        Ok(value)
    }
}
