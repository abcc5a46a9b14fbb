// crates/consumers-server/tests/http_api.rs
// ============================================================================
// Module: HTTP Surface Tests
// Description: Routes, status codes, headers, and error bodies.
// Purpose: Exercise the consumer server end to end over the in-memory store.
// ============================================================================

//! HTTP surface tests for consumers-server.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use consumers_config::ServerAuthMode;
use consumers_core::ConsumerId;
use consumers_server::WireError;
use reqwest::Method;
use reqwest::StatusCode;
use serde_json::Value;
use serde_json::json;

use crate::common::TestServer;
use crate::common::scoped_config;
use crate::common::spawn_server;

async fn create(server: &TestServer, body: Value) -> Value {
    let response = server.scoped(Method::POST, "/").json(&body).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.unwrap()
}

fn id_of(consumer: &Value) -> ConsumerId {
    ConsumerId::parse(consumer["id"].as_str().unwrap()).unwrap()
}

async fn error_body(response: reqwest::Response) -> WireError {
    response.json().await.unwrap()
}

// ============================================================================
// SECTION: Health and Scope
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn ping_needs_no_scope() {
    let server = spawn_server(scoped_config()).await;
    let response = server.anonymous(Method::GET, "/ping").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(server.audit.requests().is_empty());
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_scope_header_is_unauthorized() {
    let server = spawn_server(scoped_config()).await;
    let response = server.anonymous(Method::GET, "/").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = error_body(response).await;
    assert_eq!(body.http_code, 401);
    assert_eq!(body.http_error, "Unauthorized");
    assert_eq!(body.error, "water-usage.MISSING_AUTHORIZATION_INFORMATION");

    let scopes = server.audit.scopes();
    assert_eq!(scopes.len(), 1);
    assert!(!scopes[0].allowed);
    assert_eq!(scopes[0].reason, "missing_scope_header");
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn foreign_scope_is_forbidden() {
    let server = spawn_server(scoped_config()).await;
    let response = server
        .anonymous(Method::GET, "/")
        .header(common::SCOPE_HEADER, "water-usage:usages")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_body(response).await.error, "water-usage.INSUFFICIENT_SCOPE");
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn disabled_auth_accepts_anonymous_requests() {
    let mut config = scoped_config();
    config.server.auth.mode = ServerAuthMode::Disabled;
    config.server.auth.scope = None;
    let server = spawn_server(config).await;
    let response = server.anonymous(Method::GET, "/").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(server.audit.scopes().is_empty());
    let warned = server
        .audit
        .lifecycle()
        .iter()
        .any(|event| event.kind == consumers_server::audit::LifecycleKind::SecurityWarning);
    assert!(warned);
    server.stop().await;
}

// ============================================================================
// SECTION: Create and Read
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn create_returns_location_and_projection() {
    let server = spawn_server(scoped_config()).await;
    let response = server
        .scoped(Method::POST, "/")
        .json(&json!({
            "name": "Brunnen Nord",
            "address": "Hauptstrasse 1",
            "coordinates": [51.2, 7.1],
            "usageType": "household",
            "additionalProperties": {"depth": 40}
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let location = response.headers()["location"].to_str().unwrap().to_string();
    let created: Value = response.json().await.unwrap();
    assert_eq!(location, format!("./{}", created["id"].as_str().unwrap()));
    assert_eq!(created["name"], "Brunnen Nord");
    assert_eq!(created["description"], Value::Null);
    assert_eq!(created["location"], json!({"type": "Point", "coordinates": [7.1, 51.2]}));
    assert_eq!(created["usageType"], "household");
    assert_eq!(created["additionalProperties"]["depth"], 40);

    let path = format!("/{}", created["id"].as_str().unwrap());
    let response = server.scoped(Method::GET, &path).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched: Value = response.json().await.unwrap();
    assert_eq!(fetched, created);
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn legacy_put_creates() {
    let server = spawn_server(scoped_config()).await;
    let response = server
        .scoped(Method::PUT, "/")
        .json(&json!({"name": "Legacy", "coordinates": [50.0, 8.0]}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(server.store.consumer_count(), 1);
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn create_validation_failures_are_bad_requests() {
    let server = spawn_server(scoped_config()).await;
    let cases = [
        (json!({"coordinates": [51.0, 7.0]}), "MISSING_FIELD"),
        (json!({"name": "  ", "coordinates": [51.0, 7.0]}), "BLANK_NAME"),
        (json!({"name": "Well", "coordinates": [91.0, 7.0]}), "INVALID_COORDINATES"),
        (json!({"name": "Well", "coordinates": [51.0]}), "INVALID_COORDINATES"),
        (json!({"name": "Well", "coordinates": [51.0, "x"]}), "INVALID_COORDINATES"),
        (json!({"name": "Well", "coordinates": "51,7"}), "INVALID_COORDINATES"),
        (
            json!({"name": "Well", "coordinates": [51.0, 7.0], "usageType": "x"}),
            "UNKNOWN_USAGE_TYPE",
        ),
        (
            json!({"name": "Well", "coordinates": [51.0, 7.0], "colour": "red"}),
            "INVALID_REQUEST_BODY",
        ),
    ];
    for (body, code) in cases {
        let response = server.scoped(Method::POST, "/").json(&body).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(error_body(response).await.error, format!("water-usage.{code}"));
    }
    assert_eq!(server.store.consumer_count(), 0);
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_json_is_bad_request() {
    let server = spawn_server(scoped_config()).await;
    let response = server
        .scoped(Method::POST, "/")
        .header("content-type", "application/json")
        .body("{\"name\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_body(response).await.error, "water-usage.INVALID_REQUEST_BODY");
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn duplicate_consumer_conflicts() {
    let server = spawn_server(scoped_config()).await;
    let body = json!({"name": "Twin", "coordinates": [51.0, 7.0]});
    create(&server, body.clone()).await;
    let response = server.scoped(Method::POST, "/").json(&body).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(error_body(response).await.error, "water-usage.DUPLICATE_CONSUMER");
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn oversized_body_is_rejected() {
    let mut config = scoped_config();
    config.server.max_body_bytes = 128;
    let server = spawn_server(config).await;
    let body = json!({"name": "x".repeat(512), "coordinates": [51.0, 7.0]});
    let response = server.scoped(Method::POST, "/").json(&body).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(error_body(response).await.error, "water-usage.REQUEST_BODY_TOO_LARGE");
    assert_eq!(server.store.consumer_count(), 0);
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn single_consumer_lookup_errors() {
    let server = spawn_server(scoped_config()).await;
    let response = server.scoped(Method::GET, "/not-a-uuid").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_body(response).await.error, "water-usage.INVALID_CONSUMER_ID");

    let response = server
        .scoped(Method::GET, "/6f1c2b3a-4d5e-4f60-8a7b-9c0d1e2f3a4b")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_body(response).await.error, "water-usage.NO_CONSUMER_FOUND");

    let events = server.audit.requests();
    let last = events.last().unwrap();
    assert_eq!(last.operation, "get");
    assert_eq!(last.status, 404);
    assert_eq!(last.error_code, Some("NO_CONSUMER_FOUND"));
    assert_eq!(last.consumer_id.as_deref(), Some("6f1c2b3a-4d5e-4f60-8a7b-9c0d1e2f3a4b"));
    server.stop().await;
}

// ============================================================================
// SECTION: Listing
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn empty_listing_is_no_content() {
    let server = spawn_server(scoped_config()).await;
    let response = server.scoped(Method::GET, "/").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.headers().get("warning").is_none());
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn filters_narrow_the_listing() {
    let server = spawn_server(scoped_config()).await;
    let west = id_of(&create(&server, json!({"name": "West", "coordinates": [51.2, 7.1]})).await);
    let east = id_of(&create(&server, json!({"name": "East", "coordinates": [52.5, 13.4]})).await);
    let south =
        id_of(&create(&server, json!({"name": "South", "coordinates": [48.1, 11.6]})).await);
    server.store.record_usage(west, 50.0).unwrap();
    server.store.record_usage(east, 150.0).unwrap();
    server.store.record_usage(south, 250.0).unwrap();
    server.store.assign_area("DEA", west).unwrap();
    server.store.assign_area("DE2", south).unwrap();

    let response = server.scoped(Method::GET, "/").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.json::<Vec<Value>>().await.unwrap().len(), 3);

    let path = format!("/?usageAbove=100&id={west}&id={east}");
    let listed: Vec<Value> =
        server.scoped(Method::GET, &path).send().await.unwrap().json().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(id_of(&listed[0]), east);

    let listed: Vec<Value> =
        server.scoped(Method::GET, "/?in=DEA&in=DE2").send().await.unwrap().json().await.unwrap();
    assert_eq!(listed.len(), 2);

    let response = server.scoped(Method::GET, "/?usageAbove=250").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let events = server.audit.requests();
    assert_eq!(events.last().unwrap().filters, vec!["usage_above"]);
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn single_id_filter_carries_deprecation_warning() {
    let server = spawn_server(scoped_config()).await;
    let id = id_of(&create(&server, json!({"name": "Solo", "coordinates": [51.0, 7.0]})).await);

    let response = server.scoped(Method::GET, &format!("/?id={id}")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let warning = response.headers()["warning"].to_str().unwrap().to_string();
    assert!(warning.starts_with("299 water-usage \"Selecting a single consumer"));
    assert!(warning.contains("/{consumer-id}"));

    let other = "6f1c2b3a-4d5e-4f60-8a7b-9c0d1e2f3a4b";
    let response =
        server.scoped(Method::GET, &format!("/?id={id}&id={other}")).send().await.unwrap();
    assert!(response.headers().get("warning").is_none());

    let response =
        server.scoped(Method::GET, &format!("/?id={id}&id={id}")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("warning").is_none());
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_area_key_yields_no_content() {
    let server = spawn_server(scoped_config()).await;
    let id = id_of(&create(&server, json!({"name": "Inland", "coordinates": [51.0, 7.0]})).await);

    let response = server.scoped(Method::GET, "/?in=NOWHERE").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response =
        server.scoped(Method::GET, &format!("/?in=NOWHERE&id={id}")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let events = server.audit.requests();
    assert_eq!(events.last().unwrap().filters, vec!["ids", "area_keys"]);
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_filters_are_bad_requests() {
    let server = spawn_server(scoped_config()).await;
    let response = server.scoped(Method::GET, "/?id=12345").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_body(response).await.error, "water-usage.INVALID_UUID_IN_FILTER");

    let response = server.scoped(Method::GET, "/?usageAbove=lots").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_body(response).await.error, "water-usage.USAGE_AMOUNT_NAN");
    assert!(server.store.statement_log().is_empty());
    server.stop().await;
}

// ============================================================================
// SECTION: Update and Delete
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn patch_updates_only_supplied_fields() {
    let server = spawn_server(scoped_config()).await;
    let created = create(
        &server,
        json!({"name": "Old", "description": "kept", "coordinates": [51.0, 7.0],
               "usageType": "industry"}),
    )
    .await;
    let path = format!("/{}", created["id"].as_str().unwrap());

    let response =
        server.scoped(Method::PATCH, &path).json(&json!({"name": "New"})).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["name"], "New");
    assert_eq!(updated["description"], "kept");
    assert_eq!(updated["usageType"], "industry");
    assert_eq!(updated["location"], created["location"]);
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_patch_is_not_modified() {
    let server = spawn_server(scoped_config()).await;
    let created = create(&server, json!({"name": "Idle", "coordinates": [51.0, 7.0]})).await;
    let writes = server.store.write_count();
    let path = format!("/{}", created["id"].as_str().unwrap());

    let response = server.scoped(Method::PATCH, &path).json(&json!({})).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(server.store.write_count(), writes);
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn patch_unknown_consumer_is_not_found() {
    let server = spawn_server(scoped_config()).await;
    let response = server
        .scoped(Method::PATCH, "/6f1c2b3a-4d5e-4f60-8a7b-9c0d1e2f3a4b")
        .json(&json!({"name": "Ghost"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_removes_consumer_once() {
    let server = spawn_server(scoped_config()).await;
    let created = create(&server, json!({"name": "Gone", "coordinates": [51.0, 7.0]})).await;
    let path = format!("/{}", created["id"].as_str().unwrap());

    let response = server.scoped(Method::DELETE, &path).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = server.scoped(Method::DELETE, &path).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = server.scoped(Method::GET, &path).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    server.stop().await;
}
