use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::{OriginalUri, State};
use axum::http::{Method, Request, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use spinner_core::sign_init_data;
use spinner_server::{app, AppState, BotApi};
use tower::ServiceExt;

const TOKEN: &str = "123456:relay-test";
const REJECTING_TOKEN: &str = "999:rejected";

type Seen = Arc<Mutex<Vec<(String, Value)>>>;

async fn fake_create_invoice_link(
    State(seen): State<Seen>,
    OriginalUri(uri): OriginalUri,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let path = uri.path().to_string();
    seen.lock().unwrap().push((path.clone(), body));
    if path.contains(REJECTING_TOKEN) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"ok": false, "error_code": 400, "description": "Bad Request: CURRENCY_INVALID"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({"ok": true, "result": "https://t.me/$invoice-test"})),
    )
}

/// Starts a stand-in Bot API on an ephemeral port and returns its base URL.
async fn spawn_bot_api() -> (String, Seen) {
    let seen: Seen = Arc::default();
    let router = Router::new()
        .route("/*method", post(fake_create_invoice_link))
        .with_state(seen.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{addr}"), seen)
}

fn relay(token: Option<&str>, api_base: &str) -> Router {
    app(AppState {
        bot_token: token.map(str::to_owned),
        bot_api: BotApi::new(api_base),
    })
}

fn signed_for(token: &str, user: &str) -> String {
    sign_init_data(&[("auth_date", "1700000000"), ("query_id", "AAH"), ("user", user)], token)
}

async fn post_invoice(app: Router, body: Value) -> (StatusCode, Value) {
    let res = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/create-invoice")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn creates_invoice_for_signed_user() {
    let (base, seen) = spawn_bot_api().await;
    let init_data = signed_for(TOKEN, r#"{"id":42,"first_name":"Ann"}"#);

    let (status, body) = post_invoice(
        relay(Some(TOKEN), &base),
        json!({"amount": 100, "initData": init_data}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"invoiceUrl": "https://t.me/$invoice-test"}));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (path, sent) = &seen[0];
    assert_eq!(path, &format!("/bot{TOKEN}/createInvoiceLink"));
    assert_eq!(sent["currency"], "XTR");
    assert_eq!(sent["prices"], json!([{"label": "Donation", "amount": 100}]));
    let payload: Value = serde_json::from_str(sent["payload"].as_str().unwrap()).unwrap();
    assert_eq!(payload["userId"], 42);
    assert_eq!(payload["amount"], 100);
    assert!(payload["timestamp"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn whole_float_amount_is_accepted() {
    let (base, seen) = spawn_bot_api().await;
    let init_data = signed_for(TOKEN, r#"{"id":42}"#);

    let (status, _) = post_invoice(
        relay(Some(TOKEN), &base),
        json!({"amount": 100.0, "initData": init_data}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].1["prices"], json!([{"label": "Donation", "amount": 100}]));
}

#[tokio::test]
async fn rejects_bad_signature_without_calling_upstream() {
    let (base, seen) = spawn_bot_api().await;
    let forged = signed_for("other:token", r#"{"id":42}"#);

    let (status, body) =
        post_invoice(relay(Some(TOKEN), &base), json!({"amount": 100, "initData": forged})).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Invalid Telegram data"}));
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn validation_errors() {
    let (base, _) = spawn_bot_api().await;
    let good = signed_for(TOKEN, r#"{"id":1}"#);
    let no_user = sign_init_data(&[("auth_date", "1")], TOKEN);
    let bad_user = sign_init_data(&[("user", "not json")], TOKEN);

    let cases = [
        (json!({"initData": good}), StatusCode::BAD_REQUEST, "Invalid amount"),
        (json!({"amount": "5", "initData": good}), StatusCode::BAD_REQUEST, "Invalid amount"),
        (json!({"amount": 0, "initData": good}), StatusCode::BAD_REQUEST, "Invalid amount"),
        (json!({"amount": 2.5, "initData": good}), StatusCode::BAD_REQUEST, "Invalid amount"),
        (json!({"amount": 5}), StatusCode::BAD_REQUEST, "Missing initData"),
        (json!({"amount": 5, "initData": ""}), StatusCode::BAD_REQUEST, "Missing initData"),
        (json!({"amount": 5, "initData": no_user}), StatusCode::BAD_REQUEST, "User data not found"),
        (json!({"amount": 5, "initData": bad_user}), StatusCode::BAD_REQUEST, "Invalid user data"),
        (json!([1, 2]), StatusCode::BAD_REQUEST, "Invalid request body"),
    ];
    for (req, status, error) in cases {
        let (got, body) = post_invoice(relay(Some(TOKEN), &base), req.clone()).await;
        assert_eq!(got, status, "request {req}");
        assert_eq!(body["error"], error, "request {req}");
    }
}

#[tokio::test]
async fn missing_token_is_a_server_error() {
    let (status, body) = post_invoice(
        relay(None, "http://127.0.0.1:9"),
        json!({"amount": 100, "initData": "hash=00"}),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Server configuration error"}));
}

#[tokio::test]
async fn upstream_rejection_is_reported() {
    let (base, _) = spawn_bot_api().await;
    let init_data = signed_for(REJECTING_TOKEN, r#"{"id":7}"#);

    let (status, body) = post_invoice(
        relay(Some(REJECTING_TOKEN), &base),
        json!({"amount": 100, "initData": init_data}),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"error": "Failed to create invoice", "details": "Bad Request: CURRENCY_INVALID"})
    );
}

#[tokio::test]
async fn unreachable_upstream_is_internal_error() {
    // nothing listens on the discard port
    let init_data = signed_for(TOKEN, r#"{"id":7}"#);
    let (status, body) = post_invoice(
        relay(Some(TOKEN), "http://127.0.0.1:9"),
        json!({"amount": 100, "initData": init_data}),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
    let message = body["message"].as_str().unwrap();
    assert!(!message.contains(TOKEN));
}

#[tokio::test]
async fn health_reports_ok() {
    let res = relay(None, "http://127.0.0.1:9")
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
    assert!(chrono::DateTime::parse_from_rfc3339(body["timestamp"].as_str().unwrap()).is_ok());
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let res = relay(None, "http://127.0.0.1:9")
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/create-invoice")
                .header("origin", "https://example.org")
                .header("access-control-request-method", "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        res.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}
