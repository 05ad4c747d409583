//! List GitHub users and show the authenticated user.
//!
//! ```sh
//! export GITHUB_TOKEN=ghp_...
//! cargo run --bin github-users -- --max-pages 1
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use restline_github::{GithubSession, ListUsers, DEFAULT_URL};

/// github-users - walk the GitHub user listing
///
/// Reads GITHUB_TOKEN and GITHUB_URL from the environment or a .env file.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Log level (trace, debug, info, warn, error); overrides RUST_LOG
    #[arg(long = "log-level", value_name = "LEVEL")]
    log_level: Option<String>,

    /// GitHub access token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// GitHub API URL
    #[arg(long, env = "GITHUB_URL", default_value = DEFAULT_URL)]
    url: String,

    /// Users per page (GitHub serves at most 100)
    #[arg(long, default_value_t = 10)]
    per_page: u32,

    /// List users with an id greater than this
    #[arg(long, default_value_t = 0)]
    since: u64,

    /// Stop after this many pages
    #[arg(long, default_value_t = 1)]
    max_pages: u64,

    /// Stop after this many users
    #[arg(long, default_value_t = 50)]
    max_items: u64,
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level.to_lowercase()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let github = GithubSession::new(cli.url.as_str(), cli.token.clone().unwrap_or_default())
        .context("Failed to create GitHub session")?;

    let params = ListUsers::default()
        .per_page(cli.per_page)
        .since(cli.since)
        .max_pages(Some(cli.max_pages))
        .max_items(Some(cli.max_items));

    github
        .scoped(|github| async move {
            info!("Fetching the list of users");
            let mut users = github.users().list(params);
            while let Some(user) = users.next().await? {
                info!(id = user.id, login = %user.login, "user");
            }

            info!("Fetching the details of the logged in user");
            let me = github.users().current_user().await?;
            info!(id = me.id, login = %me.login, name = ?me.name, "current user");
            Ok::<_, restline_github::Error>(())
        })
        .await
        .context("GitHub request failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["github-users", "--token", "t", "--url", DEFAULT_URL])
            .unwrap();
        assert_eq!(cli.token.as_deref(), Some("t"));
        assert_eq!(cli.url, DEFAULT_URL);
        assert_eq!(cli.per_page, 10);
        assert_eq!(cli.max_pages, 1);
        assert_eq!(cli.max_items, 50);
        assert!(cli.log_level.is_none());
    }

    #[test]
    fn test_cli_limits() {
        let cli = Cli::try_parse_from([
            "github-users",
            "--log-level",
            "DEBUG",
            "--per-page",
            "100",
            "--since",
            "42",
            "--max-pages",
            "3",
            "--max-items",
            "7",
        ])
        .unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("DEBUG"));
        assert_eq!(cli.per_page, 100);
        assert_eq!(cli.since, 42);
        assert_eq!(cli.max_pages, 3);
        assert_eq!(cli.max_items, 7);
    }
}
