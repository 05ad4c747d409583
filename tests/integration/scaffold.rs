//! A small offset/limit API built directly on the scaffold.

use async_trait::async_trait;
use restline::check::{Check, ExpectedType};
use restline::utils::dict;
use restline::{
    ApiEndpoint, ApiIterator, Endpoint, Page, PageCursor, PageFetcher, Result, Session,
    SessionConfig,
};
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct AssetPager {
    endpoint: Endpoint,
    limit: u64,
}

#[async_trait]
impl PageFetcher for AssetPager {
    type Item = Value;

    async fn fetch_page(&mut self, cursor: PageCursor) -> Result<Page<Value>> {
        let request = self
            .endpoint
            .get("")
            .query("offset", cursor.count)
            .query("limit", self.limit);
        let body: Value = self.endpoint.send_json(request).await?;
        let items = body["assets"].as_array().cloned().unwrap_or_default();
        Ok(match body["total"].as_u64() {
            Some(total) => Page::with_total(items, total),
            None => Page::new(items),
        })
    }
}

struct AssetsApi {
    endpoint: Endpoint,
}

impl ApiEndpoint for AssetsApi {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

impl AssetsApi {
    fn list(&self, limit: Value) -> Result<ApiIterator<AssetPager>> {
        let limit = Check::new("limit")
            .expect(ExpectedType::Int)
            .softcheck(true)
            .validate(&limit)?;
        Ok(ApiIterator::new(AssetPager {
            endpoint: self.endpoint.clone(),
            limit: limit.as_u64().unwrap_or(50),
        }))
    }

    async fn create(&self, name: &str, tags: Option<Vec<String>>) -> Result<Value> {
        let body = dict::clean(&json!({"name": name, "tags": tags, "meta": {}}));
        self.endpoint
            .send_json(self.endpoint.post("").json_value(body))
            .await
    }
}

fn assets_for(server: &MockServer) -> AssetsApi {
    let session = Session::new(
        SessionConfig::builder()
            .with_url(server.uri())
            .with_base_path("api/v1")
            .without_retry()
            .build(),
    )
    .expect("session");
    AssetsApi {
        endpoint: Endpoint::with_path(session, "assets"),
    }
}

async fn mount_assets(server: &MockServer, offset: &str, ids: std::ops::Range<u64>) {
    let assets: Vec<Value> = ids.map(|id| json!({"id": id})).collect();
    Mock::given(method("GET"))
        .and(path("/api/v1/assets"))
        .and(query_param("offset", offset))
        .and(query_param("limit", "2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"assets": assets, "total": 5})),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn offset_pagination_stops_at_total() {
    let server = MockServer::start().await;
    mount_assets(&server, "0", 0..2).await;
    mount_assets(&server, "2", 2..4).await;
    mount_assets(&server, "4", 4..5).await;

    let api = assets_for(&server);
    // A numeric string is cast to an int before it is used.
    let mut assets = api.list(json!("2")).unwrap();

    let mut seen = Vec::new();
    while let Some(asset) = assets.next().await.unwrap() {
        seen.push(asset["id"].as_u64().unwrap());
    }

    assert_eq!(seen, [0, 1, 2, 3, 4]);
    assert_eq!(assets.total(), Some(5));
    assert_eq!(assets.num_pages(), 3);
}

#[tokio::test]
async fn invalid_limit_never_reaches_the_server() {
    let server = MockServer::start().await;
    let api = assets_for(&server);

    let err = api.list(json!("many")).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Type mismatch: limit is of type str.  Expected int"
    );
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn create_sends_cleaned_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/assets"))
        .and(wiremock::matchers::body_json(json!({"name": "db01"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 9, "name": "db01"})))
        .expect(1)
        .mount(&server)
        .await;

    let api = assets_for(&server);
    let created = api.create("db01", None).await.unwrap();
    assert_eq!(created["id"], 9);
    assert!(api.session().config().base_path.is_some());
}
