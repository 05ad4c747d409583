use futures::TryStreamExt;
use restline::github::{ErrorKind, ListUsers, User};
use restline::StatusKind;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{github_for, user_page, TOKEN};

#[tokio::test]
async fn lists_users_then_current_user() {
    let server = MockServer::start().await;
    let bearer = format!("Bearer {TOKEN}");

    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("since", "0"))
        .and(query_param("per_page", "5"))
        .and(header("Authorization", bearer.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_page(1, 5)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("Authorization", bearer.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "login": "octocat",
            "id": 583231,
            "name": "The Octocat",
            "public_repos": 8
        })))
        .expect(1)
        .mount(&server)
        .await;

    let github = github_for(&server);
    let (listed, me) = github
        .scoped(|github| async move {
            let params = ListUsers::default().per_page(5).max_pages(Some(1));
            let listed: Vec<User> = github.users().list(params).collect_all().await?;
            let me = github.users().current_user().await?;
            Ok::<_, restline::github::Error>((listed, me))
        })
        .await
        .unwrap();

    assert_eq!(listed.len(), 5);
    assert_eq!(listed[4].login, "user5");
    assert_eq!(me.login, "octocat");
    assert_eq!(me.name.as_deref(), Some("The Octocat"));
    assert!(!github.session().has_auth());
}

#[tokio::test]
async fn pages_follow_the_last_id() {
    let server = MockServer::start().await;
    for (since, first, last) in [("0", 1, 3), ("3", 4, 6), ("6", 7, 9)] {
        Mock::given(method("GET"))
            .and(path("/users"))
            .and(query_param("since", since))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_page(first, last)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let github = github_for(&server);
    github.authenticate().await.unwrap();

    let params = ListUsers::default()
        .per_page(3)
        .max_pages(None)
        .max_items(Some(8));
    let ids: Vec<u64> = github
        .users()
        .list(params)
        .into_stream()
        .map_ok(|user| user.id)
        .try_collect()
        .await
        .unwrap();

    assert_eq!(ids, (1..=8).collect::<Vec<_>>());
}

#[tokio::test]
async fn rate_limit_is_retried_after_delay() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/octocat"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/octocat"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"login": "octocat", "id": 1})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let github = github_for(&server);
    let user = github.users().get("octocat").await.unwrap();
    assert_eq!(user.id, 1);
}

#[tokio::test]
async fn missing_user_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/ghost-user"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let github = github_for(&server);
    let err = github.users().get("ghost-user").await.unwrap_err();

    assert!(matches!(err.kind, ErrorKind::Client(_)));
    assert_eq!(err.status(), Some(404));
    let api = err.client_error().and_then(|e| e.api_error()).unwrap();
    assert_eq!(api.kind, StatusKind::NotFound);
    assert_eq!(api.retries, 0);
}

#[tokio::test]
async fn empty_token_is_rejected() {
    let err = restline::github::GithubSession::new("http://localhost:1", "").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Config(_)));
}
