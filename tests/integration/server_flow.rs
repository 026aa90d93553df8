/// End-to-end tests against a local stand-in for the map API
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{to_bytes, Body, Bytes};
use axum::extract::{Query, State};
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower::ServiceExt;

use yahoo_map_mcp::*;

type Calls = Arc<Mutex<Vec<HashMap<String, String>>>>;

/// Records every query string it receives
#[derive(Clone, Default)]
struct StubUpstream {
    calls: Calls,
}

impl StubUpstream {
    fn starts(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|params| params.get("start").cloned())
            .collect()
    }
}

async fn stub_local_search(
    State(stub): State<StubUpstream>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let start = params.get("start").cloned().unwrap_or_default();
    stub.calls.lock().unwrap().push(params);

    Json(json!({
        "ResultInfo": {"Count": 1, "Start": start},
        "Feature": [{
            "Name": format!("shop-{start}"),
            "Geometry": {"Type": "point", "Coordinates": "139.70,35.69"},
            "Property": {"Address": "東京都新宿区", "Tel1": "03-0000-0000", "Genre": [{"Name": "ラーメン"}]}
        }]
    }))
}

async fn stub_geocode(
    State(stub): State<StubUpstream>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let query = params.get("query").cloned().unwrap_or_default();
    stub.calls.lock().unwrap().push(params);

    if query == "fail" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream down").into_response();
    }
    Json(json!({
        "Feature": [{"Name": query, "Geometry": {"Coordinates": "139.7671,35.6812"}}]
    }))
    .into_response()
}

async fn stub_reverse_geocode(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let lat = params.get("lat").cloned().unwrap_or_default();
    Json(json!({
        "Feature": [{"Property": {"Address": format!("address at {lat}")}}]
    }))
}

/// Start the stub on an ephemeral port and return its base URL
async fn spawn_stub(stub: StubUpstream) -> String {
    let app = Router::new()
        .route("/localSearch", get(stub_local_search))
        .route("/geoCoder", get(stub_geocode))
        .route("/reverseGeoCoder", get(stub_reverse_geocode))
        .with_state(stub);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

struct Harness {
    server: YahooMapServer,
    clock: Arc<ManualClock>,
    stub: StubUpstream,
}

async fn harness() -> Harness {
    let stub = StubUpstream::default();
    let base = spawn_stub(stub.clone()).await;

    let config = AppConfig {
        endpoints: UpstreamEndpoints {
            local_search: format!("{base}/localSearch"),
            geocode: format!("{base}/geoCoder"),
            reverse_geocode: format!("{base}/reverseGeoCoder"),
        },
        upstream_timeout: Duration::from_secs(5),
        ..Default::default()
    };
    let repository = YahooMapRepository::new(config.endpoints.clone(), config.upstream_timeout).unwrap();
    let clock = Arc::new(ManualClock::default());
    let server = YahooMapServer::with_repository(config, Arc::new(repository), clock.clone()).unwrap();

    Harness { server, clock, stub }
}

impl Harness {
    async fn send(&self, request: Request<Body>) -> (StatusCode, Bytes) {
        let response = self.server.router().oneshot(request).await.unwrap();
        let status = response.status();
        (status, to_bytes(response.into_body(), usize::MAX).await.unwrap())
    }

    /// `tools/call` over `POST /mcp`, returning the tool call result
    async fn call_tool(&self, name: &str, arguments: Value) -> Value {
        let (status, body) = self.send(tool_call_request(name, arguments)).await;
        assert_eq!(status, StatusCode::OK);
        let response: Value = serde_json::from_slice(&body).unwrap();
        response["result"].clone()
    }
}

fn tool_call_request(name: &str, arguments: Value) -> Request<Body> {
    let body = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": {"name": name, "arguments": arguments}
    });
    Request::post("/mcp")
        .header(header::AUTHORIZATION, "Bearer test-app-id")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Parse the JSON document carried in a successful tool result
fn output(result: &Value) -> Value {
    assert!(result.get("isError").is_none(), "unexpected error: {result}");
    serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap()
}

#[tokio::test]
async fn test_local_search_pages_through_session() {
    let h = harness().await;
    let args = json!({"query": "ramen", "sessionId": "s1"});

    let first = output(&h.call_tool("localSearch", args.clone()).await);
    let second = output(&h.call_tool("localSearch", args.clone()).await);

    assert_eq!(first["nextOffset"], 10);
    assert_eq!(second["nextOffset"], 20);
    assert_eq!(first["items"][0]["name"], "shop-1");
    assert_eq!(first["items"][0]["category"], "ラーメン");
    assert_eq!(first["items"][0]["lat"], 35.69);
    assert_eq!(h.stub.starts(), vec!["1", "11"]);

    let calls = h.stub.calls.lock().unwrap().clone();
    assert_eq!(calls[0]["appid"], "test-app-id");
    assert_eq!(calls[0]["output"], "json");
    assert_eq!(calls[0]["results"], "10");
    assert!(!calls[0].contains_key("sessionId"));
}

#[tokio::test]
async fn test_session_restarts_after_ttl() {
    let h = harness().await;
    let args = json!({"query": "ramen", "sessionId": "s1", "results": 5});

    h.call_tool("localSearch", args.clone()).await;
    h.call_tool("localSearch", args.clone()).await;
    h.clock.advance(chrono::Duration::seconds(301));
    h.call_tool("localSearch", args).await;

    assert_eq!(h.stub.starts(), vec!["1", "6", "1"]);
}

#[tokio::test]
async fn test_search_without_session_never_pages() {
    let h = harness().await;

    for _ in 0..2 {
        let result = output(&h.call_tool("localSearch", json!({"query": "ramen"})).await);
        assert!(result.get("nextOffset").is_none());
    }
    assert_eq!(h.stub.starts(), vec!["1", "1"]);
    assert!(h.server.pagination().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_calls_never_share_a_page() {
    let h = harness().await;
    let router = h.server.router();
    let args = json!({"query": "ramen", "sessionId": "busy"});

    let tasks = (0..10).map(|_| {
        let router = router.clone();
        let request = tool_call_request("localSearch", args.clone());
        tokio::spawn(async move { router.oneshot(request).await.unwrap().status() })
    });
    for status in futures::future::join_all(tasks).await {
        assert_eq!(status.unwrap(), StatusCode::OK);
    }

    let mut starts: Vec<u64> = h.stub.starts().iter().map(|s| s.parse().unwrap()).collect();
    starts.sort_unstable();
    assert_eq!(starts, (0..10).map(|i| i * 10 + 1).collect::<Vec<u64>>());
}

#[tokio::test]
async fn test_geocode_round_trip() {
    let h = harness().await;

    let result = output(&h.call_tool("geocode", json!({"query": "東京都千代田区"})).await);
    assert_eq!(result["items"][0]["address"], "東京都千代田区");
    assert_eq!(result["items"][0]["lng"], 139.7671);
    assert!(result["raw"]["Feature"].is_array());
}

#[tokio::test]
async fn test_upstream_failure_is_error_result() {
    let h = harness().await;

    let result = h.call_tool("geocode", json!({"query": "fail"})).await;
    assert_eq!(result["isError"], true);
    assert!(result["content"][0]["text"].as_str().unwrap().contains("HTTP 500"));
}

#[tokio::test]
async fn test_reverse_geocode_via_rest_endpoint() {
    let h = harness().await;
    let request = Request::post("/mcp/tools/reverseGeocode")
        .header(header::AUTHORIZATION, "Bearer test-app-id")
        .body(Body::from(json!({"lat": 35.5, "lng": 139.5}).to_string()))
        .unwrap();

    let (status, body) = h.send(request).await;
    let result: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(output(&result)["items"][0]["address"], "address at 35.5");
}

#[tokio::test]
async fn test_health_reports_paging_entries() {
    let h = harness().await;
    h.call_tool("localSearch", json!({"query": "ramen", "sessionId": "a"})).await;
    h.call_tool("localSearch", json!({"query": "sushi", "sessionId": "a"})).await;

    let (status, body) = h.send(Request::get("/health").body(Body::empty()).unwrap()).await;
    let health: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["pagingEntries"], 2);
}
