use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use vibe_sitegen::config::{Config, DeployConfig, LlmConfig};
use vibe_sitegen::deploy::DeployGateway;
use vibe_sitegen::generate::SiteGenerator;
use vibe_sitegen::provider::make_provider;
use vibe_sitegen::server::{router, AppState};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn app(llm: &MockServer, deploy_command: &str) -> Router {
    let provider = make_provider(&LlmConfig {
        api_base: Some(llm.uri()),
        api_key: Some("sk-test".into()),
        timeout_secs: 5,
        ..LlmConfig::default()
    })
    .unwrap();
    let deployer = DeployGateway::from_config(&DeployConfig {
        command: deploy_command.to_string(),
        site_id: Some("example-site".into()),
        ..DeployConfig::default()
    })
    .unwrap();
    router(AppState::new(SiteGenerator::new(provider), deployer))
}

async fn mock_reply(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        })))
        .mount(server)
        .await;
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(resp: axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn generate_site_returns_artifact() {
    let llm = MockServer::start().await;
    mock_reply(&llm, r#"{"html":"<h1>Brew</h1>","css":"h1{color:brown}","js":""}"#).await;

    let resp = app(&llm, "true")
        .await
        .oneshot(post_json("/generate-site", json!({ "prompt": "a landing page for a coffee shop" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(read_json(resp).await, json!({ "html": "<h1>Brew</h1>", "css": "h1{color:brown}", "js": "" }));
}

#[tokio::test]
async fn generate_site_reports_malformed_output() {
    let llm = MockServer::start().await;
    mock_reply(&llm, "Sorry, I can't do that.").await;

    let resp = app(&llm, "true")
        .await
        .oneshot(post_json("/generate-site", json!({ "prompt": "x" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json(resp).await;
    assert_eq!(body["error"], "Invalid LLM output");
    assert_eq!(body["kind"], "malformed_output");
    assert_eq!(body["raw"], "Sorry, I can't do that.");
}

#[tokio::test]
async fn generate_site_maps_upstream_failure_to_bad_gateway() {
    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&llm)
        .await;

    let resp = app(&llm, "true")
        .await
        .oneshot(post_json("/generate-site", json!({ "prompt": "x" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body = read_json(resp).await;
    assert_eq!(body["kind"], "upstream");
    assert!(body["details"].as_str().unwrap().contains("overloaded"));
}

#[cfg(unix)]
#[tokio::test]
async fn deploy_returns_message_and_url() {
    let llm = MockServer::start().await;
    let resp = app(&llm, "sh -c 'echo Website deployed to https://example-site.netlify.app ...'")
        .await
        .oneshot(post_json("/deploy", json!({ "index.html": "<p>hi</p>" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        read_json(resp).await,
        json!({ "message": "Deployment successful!", "url": "https://example-site.netlify.app" })
    );
}

#[cfg(unix)]
#[tokio::test]
async fn deploy_failure_is_reported_with_details() {
    let llm = MockServer::start().await;
    let resp = app(&llm, "sh -c 'echo auth error >&2; exit 1'")
        .await
        .oneshot(post_json("/deploy", json!({ "index.html": "<p>hi</p>" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json(resp).await;
    assert_eq!(body["error"], "Deployment failed");
    assert_eq!(body["kind"], "deploy_failed");
    assert_eq!(body["details"].as_str().unwrap().trim(), "auth error");
}

#[tokio::test]
async fn deploy_rejects_path_traversal() {
    let llm = MockServer::start().await;
    let resp = app(&llm, "true")
        .await
        .oneshot(post_json("/deploy", json!({ "../index.html": "x" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(resp).await["kind"], "invalid_file_name");
}

#[tokio::test]
async fn compose_returns_document() {
    let llm = MockServer::start().await;
    let resp = app(&llm, "true")
        .await
        .oneshot(post_json("/compose", json!({ "html": "<h1>Brew</h1>", "css": "h1{}", "js": "go()" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let ct = resp.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(ct.starts_with("text/html"));
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let doc = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(doc.contains("<style>h1{}</style>"));
    assert!(doc.contains("<script>go()</script>"));
}

#[tokio::test]
async fn health_and_index_are_served() {
    let llm = MockServer::start().await;
    let router = app(&llm, "true").await;

    let resp = router.clone().oneshot(Request::get("/health").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = router.oneshot(Request::get("/").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("/generate-site"));
}

#[tokio::test]
async fn server_without_site_id_still_generates() {
    let llm = MockServer::start().await;
    mock_reply(&llm, r#"{"html":"<h1>Brew</h1>","css":"","js":""}"#).await;
    let cfg = Config {
        llm: LlmConfig { api_base: Some(llm.uri()), api_key: Some("sk-test".into()), ..LlmConfig::default() },
        ..Config::default()
    };
    let router = router(AppState::from_config(&cfg).unwrap());

    let resp = router
        .clone()
        .oneshot(post_json("/generate-site", json!({ "prompt": "a coffee shop" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(read_json(resp).await["html"], "<h1>Brew</h1>");

    let resp = router.oneshot(post_json("/deploy", json!({ "index.html": "<p>hi</p>" }))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json(resp).await;
    assert_eq!(body["kind"], "config");
    assert!(body["details"].as_str().unwrap().contains("site_id"));
}

#[tokio::test]
async fn bad_json_bodies_get_the_error_shape() {
    let llm = MockServer::start().await;
    let router = app(&llm, "true").await;

    let resp = router.clone().oneshot(post_json("/deploy", json!({ "index.html": 5 }))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = read_json(resp).await;
    assert_eq!(body["error"], "Invalid request body");
    assert_eq!(body["kind"], "invalid_request");
    assert!(!body["details"].as_str().unwrap().is_empty());

    let resp = router.oneshot(post_json("/generate-site", json!({ "text": "x" }))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(resp).await["kind"], "invalid_request");
}
