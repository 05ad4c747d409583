use std::time::Duration;

use restline::github::GithubSession;
use restline::SessionConfig;
use serde_json::{json, Value};
use wiremock::MockServer;

pub const TOKEN: &str = "ghp_integration";

/// A GitHub session pointed at `server`, with short retry delays.
pub fn github_for(server: &MockServer) -> GithubSession {
    let config = SessionConfig::builder()
        .with_url(server.uri())
        .with_retries(2)
        .with_backoff(Duration::from_millis(10))
        .build();
    GithubSession::with_config(config, TOKEN).expect("session")
}

/// A page of user summaries with ids `first..=last`.
pub fn user_page(first: u64, last: u64) -> Value {
    Value::Array(
        (first..=last)
            .map(|id| {
                json!({
                    "login": format!("user{id}"),
                    "id": id,
                    "type": "User",
                    "site_admin": false
                })
            })
            .collect(),
    )
}
