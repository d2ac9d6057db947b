//! HTTP-level tests for the Airtable client against a mock server

#![allow(clippy::unwrap_used, clippy::panic)] // Test code can unwrap/panic

use serde::{Deserialize, Serialize};
use serde_json::json;
use tabletodo_airtable::{
    AirtableClient, AirtableConfig, AirtableError, ListQuery, Record, SortDirection,
};
use wiremock::matchers::{
    body_json, header, method, path, query_param, query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Fields {
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is_completed: Option<bool>,
}

fn client_for(server: &MockServer) -> AirtableClient {
    AirtableClient::new(
        AirtableConfig::new("appTest", "Todos", "test-pat")
            .with_api_url(format!("{}/v0", server.uri())),
    )
}

fn record(id: &str, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "createdTime": "2025-01-01T00:00:00.000Z",
        "fields": { "title": title, "isCompleted": false }
    })
}

#[tokio::test]
async fn list_sends_sort_filter_and_bearer_only() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v0/appTest/Todos"))
        .and(query_param("sort[0][field]", "createdTime"))
        .and(query_param("sort[0][direction]", "desc"))
        .and(query_param("filterByFormula", "{isCompleted}=FALSE()"))
        .and(header("authorization", "Bearer test-pat"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "records": [record("rec1", "Feed cat")] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let query = ListQuery::default()
        .sorted_by("createdTime", SortDirection::Desc)
        .filtered_by("{isCompleted}=FALSE()");
    let records: Vec<Record<Fields>> = client_for(&server).list(&query).await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "rec1");
    assert_eq!(records[0].fields.title, "Feed cat");

    let received = server.received_requests().await.unwrap();
    assert!(received[0].headers.get("content-type").is_none());
}

#[tokio::test]
async fn list_follows_pagination_offsets() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param_is_missing("offset"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [record("rec1", "First")],
            "offset": "itr2"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(query_param("offset", "itr2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "records": [record("rec2", "Second")] })),
        )
        .mount(&server)
        .await;

    let records: Vec<Record<Fields>> =
        client_for(&server).list(&ListQuery::default()).await.unwrap();

    let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["rec1", "rec2"]);
}

#[tokio::test]
async fn create_posts_single_record() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v0/appTest/Todos"))
        .and(header("authorization", "Bearer test-pat"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "records": [{ "fields": { "title": "Feed cat" } }] })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "records": [record("rec123", "Feed cat")] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let fields = Fields {
        title: "Feed cat".to_string(),
        is_completed: None,
    };
    let created: Record<Fields> = client_for(&server).create(&fields).await.unwrap();

    assert_eq!(created.id, "rec123");
    assert_eq!(created.created_time, "2025-01-01T00:00:00.000Z");
    assert_eq!(created.fields.is_completed, Some(false));
}

#[tokio::test]
async fn update_patches_by_id() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/v0/appTest/Todos"))
        .and(body_json(json!({
            "records": [{ "id": "rec1", "fields": { "title": "Feed dog", "isCompleted": true } }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{
                "id": "rec1",
                "createdTime": "2025-01-01T00:00:00.000Z",
                "fields": { "title": "Feed dog", "isCompleted": true }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fields = Fields {
        title: "Feed dog".to_string(),
        is_completed: Some(true),
    };
    let updated: Record<Fields> = client_for(&server).update("rec1", &fields).await.unwrap();

    assert_eq!(updated.fields, fields);
}

#[tokio::test]
async fn server_errors_are_categorised() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result: Result<Vec<Record<Fields>>, _> =
        client_for(&server).list(&ListQuery::default()).await;

    assert_eq!(result.unwrap_err(), AirtableError::Server { status: 503 });
}

#[tokio::test]
async fn client_errors_keep_status_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(422).set_body_string("INVALID_VALUE_FOR_COLUMN"))
        .mount(&server)
        .await;

    let fields = Fields {
        title: String::new(),
        is_completed: None,
    };
    let result: Result<Record<Fields>, _> = client_for(&server).create(&fields).await;

    match result.unwrap_err() {
        AirtableError::Http { status, body } => {
            assert_eq!(status, 422);
            assert_eq!(body, "INVALID_VALUE_FOR_COLUMN");
        },
        other => panic!("expected Http error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result: Result<Vec<Record<Fields>>, _> =
        client_for(&server).list(&ListQuery::default()).await;

    assert!(matches!(result, Err(AirtableError::Decode(_))));
}

#[tokio::test]
async fn empty_write_response_is_a_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "records": [] })))
        .mount(&server)
        .await;

    let fields = Fields {
        title: "x".to_string(),
        is_completed: None,
    };
    let result: Result<Record<Fields>, _> = client_for(&server).update("rec1", &fields).await;

    assert!(matches!(result, Err(AirtableError::Decode(_))));
}

/// URL of a local port nothing listens on
fn closed_api_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{address}/v0")
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let client = AirtableClient::new(
        AirtableConfig::new("appTest", "Todos", "test-pat").with_api_url(closed_api_url()),
    );

    let result: Result<Vec<Record<Fields>>, _> = client.list(&ListQuery::default()).await;

    assert!(result.unwrap_err().is_network());
}
