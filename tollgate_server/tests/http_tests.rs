use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tollgate_core::ProxyConfig;
use tollgate_server::{routes, AppState};
use tower::ServiceExt;
use wiremock::matchers::{body_json, header as header_is, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CALLER_KEY: &str = "caller-secret";
const PROVIDER_KEY: &str = "tvly-upstream-key";

fn app(base_url: &str, caller_key: Option<&str>) -> Router {
    let config = ProxyConfig::new(PROVIDER_KEY)
        .unwrap()
        .with_api_key(caller_key.map(String::from))
        .with_base_url(base_url)
        .unwrap();
    routes::app(AppState::new(&config).unwrap())
}

fn post(uri: &str, body: &str, key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(key) = key {
        builder = builder.header("api_key", key);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn search_defaults(query: &str) -> Value {
    json!({
        "query": query,
        "search_depth": "basic",
        "topic": "general",
        "days": 3,
        "time_range": "day",
        "max_results": 10,
        "include_images": false,
        "include_image_descriptions": false,
        "include_raw_content": false,
        "include_domains": [],
        "exclude_domains": []
    })
}

#[tokio::test]
async fn public_search_passes_provider_body_through_unauthenticated() {
    let mock = MockServer::start().await;
    let stub = json!({
        "query": "rust ownership",
        "results": [{"title": "x", "url": "http://x", "content": "c", "score": 0.9}]
    });
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(header_is("authorization", "Bearer tvly-upstream-key"))
        .and(body_json(search_defaults("rust ownership")))
        .respond_with(ResponseTemplate::new(200).set_body_json(stub.clone()))
        .expect(1)
        .mount(&mock)
        .await;

    let (status, body) = send(
        app(&mock.uri(), Some(CALLER_KEY)),
        post("/search", r#"{"query": "rust ownership"}"#, None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, stub);
}

#[tokio::test]
async fn extract_without_key_is_forbidden_and_never_reaches_upstream() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&mock)
        .await;

    let (status, body) = send(
        app(&mock.uri(), Some(CALLER_KEY)),
        post("/tavily-extract", r#"{"urls": ["http://a"]}"#, None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({"detail": "Invalid API key"}));

    let (status, _) = send(
        app(&mock.uri(), Some(CALLER_KEY)),
        post("/tavily-search", r#"{"query": "q"}"#, Some("not-the-key")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    assert!(mock.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn unset_caller_secret_forbids_even_an_empty_header() {
    let mock = MockServer::start().await;
    let (status, _) = send(
        app(&mock.uri(), None),
        post("/tavily-search", r#"{"query": "q"}"#, Some("")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(mock.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn upstream_503_becomes_generic_500() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream maintenance window, node eu-3"))
        .expect(1)
        .mount(&mock)
        .await;

    let (status, body) = send(
        app(&mock.uri(), Some(CALLER_KEY)),
        post("/tavily-search", r#"{"query": "q"}"#, Some(CALLER_KEY)),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"detail": "Tavily API error"}));
}

#[tokio::test]
async fn protected_search_uses_provider_credential_only() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .mount(&mock)
        .await;

    let (status, _) = send(
        app(&mock.uri(), Some(CALLER_KEY)),
        post(
            "/tavily-search",
            r#"{"query": "q", "topic": "news", "days": 7, "include_domains": ["rust-lang.org"]}"#,
            Some(CALLER_KEY),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let received = mock.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let sent = &received[0];
    assert_eq!(
        sent.headers.get("authorization").unwrap(),
        "Bearer tvly-upstream-key"
    );
    assert!(sent.headers.get("api_key").is_none());

    let payload: Value = serde_json::from_slice(&sent.body).unwrap();
    let mut expected = search_defaults("q");
    expected["topic"] = json!("news");
    expected["days"] = json!(7);
    expected["include_domains"] = json!(["rust-lang.org"]);
    assert_eq!(payload, expected);
}

#[tokio::test]
async fn protected_extract_forwards_to_extract_endpoint() {
    let mock = MockServer::start().await;
    let stub = json!({"results": [{"url": "http://a", "raw_content": "hello"}], "failed_results": []});
    Mock::given(method("POST"))
        .and(path("/extract"))
        .and(body_json(json!({"urls": ["http://a"], "extract_depth": "advanced", "include_images": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(stub.clone()))
        .expect(1)
        .mount(&mock)
        .await;

    let (status, body) = send(
        app(&mock.uri(), Some(CALLER_KEY)),
        post(
            "/tavily-extract",
            r#"{"urls": ["http://a"], "extract_depth": "advanced"}"#,
            Some(CALLER_KEY),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, stub);
}

#[tokio::test]
async fn invalid_enum_is_422_with_no_upstream_call() {
    let mock = MockServer::start().await;
    let (status, body) = send(
        app(&mock.uri(), Some(CALLER_KEY)),
        post("/search", r#"{"query": "q", "search_depth": "deep"}"#, None),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"][0]["loc"], json!(["body", "search_depth"]));
    assert!(mock.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_json_and_missing_query_are_rejected() {
    let mock = MockServer::start().await;

    let (status, body) = send(app(&mock.uri(), None), post("/search", "{not json", None)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"][0]["type"], "json_invalid");

    let (status, body) = send(app(&mock.uri(), None), post("/search", "{}", None)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"][0]["loc"], json!(["body", "query"]));

    assert!(mock.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn repeated_requests_each_hit_upstream() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(2)
        .mount(&mock)
        .await;

    let router = app(&mock.uri(), None);
    for _ in 0..2 {
        let (status, _) = send(router.clone(), post("/search", r#"{"query": "same"}"#, None)).await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn transport_failure_is_generic_500() {
    // nothing listens on port 1
    let (status, body) = send(
        app("http://127.0.0.1:1", None),
        post("/search", r#"{"query": "q"}"#, None),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"detail": "Tavily API error"}));
}

#[tokio::test]
async fn mcp_discovery_is_gated_and_lists_protected_tools() {
    let mock = MockServer::start().await;
    let list = r#"{"jsonrpc": "2.0", "id": 1, "method": "tools/list", "params": {}}"#;

    let (status, _) = send(app(&mock.uri(), Some(CALLER_KEY)), post("/mcp", list, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        app(&mock.uri(), Some(CALLER_KEY)),
        post("/mcp", list, Some(CALLER_KEY)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["tavily_search", "tavily_extract"]);
}

#[tokio::test]
async fn mcp_tool_call_reaches_upstream() {
    let mock = MockServer::start().await;
    let stub = json!({"query": "q", "results": []});
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_json(search_defaults("q")))
        .respond_with(ResponseTemplate::new(200).set_body_json(stub.clone()))
        .expect(1)
        .mount(&mock)
        .await;

    let call = r#"{"jsonrpc": "2.0", "id": "a", "method": "tools/call", "params": {"name": "tavily_search", "arguments": {"query": "q"}}}"#;
    let (status, body) = send(
        app(&mock.uri(), Some(CALLER_KEY)),
        post("/mcp", call, Some(CALLER_KEY)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "a");
    assert_eq!(body["result"]["structuredContent"], stub);
}

#[tokio::test]
async fn mcp_notifications_and_parse_errors() {
    let mock = MockServer::start().await;

    let (status, body) = send(
        app(&mock.uri(), Some(CALLER_KEY)),
        post(
            "/mcp",
            r#"{"jsonrpc": "2.0", "method": "notifications/initialized"}"#,
            Some(CALLER_KEY),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(body.is_null());

    let (status, body) = send(
        app(&mock.uri(), Some(CALLER_KEY)),
        post("/mcp", "{{{", Some(CALLER_KEY)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], -32700);
}

#[tokio::test]
async fn cors_preflight_allows_any_origin() {
    let mock = MockServer::start().await;
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/search")
        .header(header::ORIGIN, "https://untrusted.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type,api_key")
        .body(Body::empty())
        .unwrap();

    let resp = app(&mock.uri(), None).oneshot(request).await.unwrap();
    assert!(resp.status().is_success());
    assert_eq!(
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "https://untrusted.example"
    );
}

#[tokio::test]
async fn health_reports_whether_protected_routes_are_enabled() {
    let mock = MockServer::start().await;
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(&mock.uri(), None), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["protected_routes_enabled"], false);
}
