// manut-client/tests/rest_client.rs
// RestClient 请求形状与状态码映射（本地 axum 桩服务）

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use manut_client::{AuthApi, ClientConfig, ClientError, DispatchQuery, DispatchStore, SettingsStore, SiteDirectory};
use serde_json::{Value, json};
use shared::models::NewDispatch;

const API_KEY: &str = "anon-key";

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn has_api_key(headers: &HeaderMap) -> bool {
    headers.get("apikey").and_then(|v| v.to_str().ok()) == Some(API_KEY)
}

async fn sites(headers: HeaderMap, Query(params): Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
    if !has_api_key(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "no api key"})));
    }
    assert_eq!(params.get("order").map(String::as_str), Some("name.asc"));
    (
        StatusCode::OK,
        Json(json!([
            {"id": "s-1", "name": "Entrepôt Nord", "address": "Lille"},
            {"id": "s-2", "name": "Quai 7"}
        ])),
    )
}

async fn dispatches(Query(params): Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
    let select = params.get("select").cloned().unwrap_or_default();
    if !select.contains("client_sites(name)") {
        return (StatusCode::BAD_REQUEST, Json(json!({"message": "missing join"})));
    }
    // echo the site filter back so the test can see it arrived
    let site_id = params
        .get("site_id")
        .and_then(|f| f.strip_prefix("eq."))
        .unwrap_or("s-1")
        .to_string();
    (
        StatusCode::OK,
        Json(json!([
            {
                "id": "d-2",
                "site_id": site_id,
                "quantity": 3,
                "comment": "renfort",
                "created_at": "2024-01-11T09:00:00Z",
                "username": "anna",
                "user_id": "u-1",
                "client_sites": {"name": "Entrepôt Nord"}
            },
            {
                "id": "d-1",
                "site_id": site_id,
                "quantity": null,
                "comment": null,
                "created_at": "2024-01-10T09:00:00Z",
                "username": null,
                "user_id": null,
                "client_sites": null
            }
        ])),
    )
}

async fn create_dispatch(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if bearer(&headers).as_deref() != Some("user-token") {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "jwt required"})));
    }
    let row = &body[0];
    (
        StatusCode::CREATED,
        Json(json!([{
            "id": "d-new",
            "site_id": row["site_id"],
            "quantity": row["quantity"],
            "comment": row.get("comment").cloned().unwrap_or(Value::Null),
            "created_at": "2024-01-12T10:00:00Z",
            "username": row["username"],
            "user_id": row["user_id"],
            "client_sites": {"name": "Quai 7"}
        }])),
    )
}

async fn token(Query(params): Query<HashMap<String, String>>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    assert_eq!(params.get("grant_type").map(String::as_str), Some("password"));
    if body["password"] != "secret" {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "invalid_grant"})));
    }
    (
        StatusCode::OK,
        Json(json!({
            "access_token": "user-token",
            "refresh_token": "refresh",
            "expires_in": 3600,
            "user": {"id": "u-1", "email": body["email"], "user_metadata": {}}
        })),
    )
}

async fn user(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    match bearer(&headers).as_deref() {
        Some("user-token") => (
            StatusCode::OK,
            Json(json!({"id": "u-1", "email": "anna@ops.fr", "user_metadata": {"username": "Anna"}})),
        ),
        _ => (StatusCode::UNAUTHORIZED, Json(json!({"message": "invalid jwt"}))),
    }
}

async fn settings() -> Json<Value> {
    Json(json!([]))
}

async fn broken() -> (StatusCode, Json<Value>) {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"message": "boom"})))
}

/// Start the stub on an ephemeral port
async fn spawn_stub(routes: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, routes).await.unwrap();
    });
    addr
}

fn stub_routes() -> Router {
    Router::new()
        .route("/rest/v1/client_sites", get(sites))
        .route("/rest/v1/dispatches", get(dispatches).post(create_dispatch))
        .route("/rest/v1/user_settings", get(settings))
        .route("/auth/v1/token", post(token))
        .route("/auth/v1/user", get(user))
}

async fn client() -> manut_client::RestClient {
    let addr = spawn_stub(stub_routes()).await;
    ClientConfig::new(format!("http://{}", addr), API_KEY)
        .with_timeout(5)
        .build_rest_client()
        .unwrap()
}

#[tokio::test]
async fn test_fetch_sites_sends_api_key() {
    let client = client().await;
    let sites = client.fetch_sites().await.unwrap();
    assert_eq!(sites.len(), 2);
    assert_eq!(sites[1].address, "");
}

#[tokio::test]
async fn test_fetch_dispatches_joins_site_names() {
    let client = client().await;
    let records = client.fetch_dispatches(None).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].site_name.as_deref(), Some("Entrepôt Nord"));
    assert_eq!(records[1].site_name, None);
    assert_eq!(records[1].contribution(), 0);

    let query = DispatchQuery::new().site("s-9");
    let records = client.fetch_dispatches(Some(&query)).await.unwrap();
    assert!(records.iter().all(|r| r.site_id == "s-9"));
}

#[tokio::test]
async fn test_sign_in_then_create_dispatch() {
    let client = client().await;

    let payload = NewDispatch {
        site_id: "s-2".into(),
        quantity: 4,
        comment: None,
        user_id: "u-1".into(),
        username: "anna".into(),
    };
    assert!(matches!(
        client.create_dispatch(&payload).await,
        Err(ClientError::Unauthorized)
    ));

    let session = client.sign_in("anna@ops.fr", "secret").await.unwrap();
    assert_eq!(session.access_token, "user-token");
    assert!(session.expires_at.is_some());
    assert_eq!(client.token().as_deref(), Some("user-token"));

    let created = client.create_dispatch(&payload).await.unwrap();
    assert_eq!(created.id, "d-new");
    assert_eq!(created.quantity, Some(4));
    assert_eq!(created.site_name.as_deref(), Some("Quai 7"));

    let user = client.current_user().await.unwrap();
    assert_eq!(user.user_metadata.username.as_deref(), Some("Anna"));
}

#[tokio::test]
async fn test_bad_password_maps_to_unauthorized() {
    let client = client().await;
    assert!(matches!(
        client.sign_in("anna@ops.fr", "nope").await,
        Err(ClientError::Unauthorized)
    ));
    assert!(client.token().is_none());
}

#[tokio::test]
async fn test_missing_settings_row_is_none() {
    let client = client().await;
    assert_eq!(client.load_settings("u-1").await.unwrap(), None);
}

#[tokio::test]
async fn test_server_error_maps_to_api_error() {
    let addr = spawn_stub(Router::new().route("/rest/v1/client_sites", get(broken))).await;
    let client = ClientConfig::new(format!("http://{}", addr), API_KEY)
        .build_rest_client()
        .unwrap();

    match client.fetch_sites().await {
        Err(ClientError::Api { status, message }) => {
            assert_eq!(status, 500);
            assert!(message.contains("boom"));
        }
        other => panic!("expected api error, got {:?}", other),
    }
}
