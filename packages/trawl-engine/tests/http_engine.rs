use std::{
	collections::VecDeque,
	sync::{Arc, Mutex},
};

use axum::{
	Json, Router,
	body::Bytes,
	extract::State,
	http::{Method, StatusCode, Uri},
};
use serde_json::Value;
use time::macros::datetime;
use tokio::net::TcpListener;

use trawl_domain::{Predicate, TimeRange};
use trawl_engine::{
	Error, PageStatus, SearchEngine, SearchRequest, http::HttpEngine,
};

#[derive(Debug, Clone)]
struct Recorded {
	method: Method,
	path: String,
	query: Option<String>,
	body: Value,
}

#[derive(Clone, Default)]
struct MockEngine {
	responses: Arc<Mutex<VecDeque<(StatusCode, Value)>>>,
	requests: Arc<Mutex<Vec<Recorded>>>,
}
impl MockEngine {
	fn respond(&self, status: StatusCode, body: Value) {
		self.responses.lock().unwrap_or_else(|err| err.into_inner()).push_back((status, body));
	}

	fn requests(&self) -> Vec<Recorded> {
		self.requests.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}

async fn handle(
	State(mock): State<MockEngine>,
	method: Method,
	uri: Uri,
	body: Bytes,
) -> (StatusCode, Json<Value>) {
	let body = serde_json::from_slice(&body).unwrap_or(Value::Null);

	mock.requests.lock().unwrap_or_else(|err| err.into_inner()).push(Recorded {
		method,
		path: uri.path().to_string(),
		query: uri.query().map(str::to_string),
		body,
	});

	let (status, body) = mock
		.responses
		.lock()
		.unwrap_or_else(|err| err.into_inner())
		.pop_front()
		.unwrap_or((StatusCode::INTERNAL_SERVER_ERROR, serde_json::json!({ "error": "unscripted" })));

	(status, Json(body))
}

async fn spawn_engine(mock: MockEngine, base_path: &str) -> HttpEngine {
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind mock engine.");
	let addr = listener.local_addr().expect("Failed to read mock engine address.");
	let app = Router::new().fallback(handle).with_state(mock);

	tokio::spawn(async move {
		axum::serve(listener, app).await.expect("Mock engine failed.");
	});

	let cfg = trawl_config::Engine { url: format!("http://{addr}{base_path}"), timeout_ms: Some(5_000) };

	HttpEngine::new(&cfg).expect("Failed to build engine client.")
}

fn request(indices: &[&str]) -> SearchRequest {
	let range = TimeRange::new(datetime!(2019-11-20 0:00 UTC), datetime!(2019-12-05 0:00 UTC))
		.expect("Range must be valid.");

	SearchRequest {
		indices: indices.iter().map(|index| index.to_string()).collect(),
		ignore_unavailable: true,
		page_size: 10_000,
		keep_alive: "2m".to_string(),
		query: Predicate::date_range("@timestamp", &range),
	}
}

#[tokio::test]
async fn opening_scroll_targets_every_index() {
	let mock = MockEngine::default();

	mock.respond(
		StatusCode::OK,
		serde_json::json!({
			"_scroll_id": "scroll-1",
			"hits": { "hits": [{ "_source": { "id": 1 } }, { "_source": { "id": 2 } }] }
		}),
	);

	let engine = spawn_engine(mock.clone(), "").await;
	let page = engine
		.search(&request(&["type_2019.11", "type_2019.12"]))
		.await
		.expect("Search failed.");

	assert_eq!(page.status, PageStatus::Valid);
	assert_eq!(page.scroll_id.as_deref(), Some("scroll-1"));
	assert_eq!(
		page.documents,
		vec![serde_json::json!({ "id": 1 }), serde_json::json!({ "id": 2 })]
	);

	let requests = mock.requests();

	assert_eq!(requests.len(), 1);
	assert_eq!(requests[0].method, Method::POST);
	assert_eq!(requests[0].path, "/type_2019.11,type_2019.12/_search");

	let query = requests[0].query.clone().expect("Missing query string.");

	assert!(query.contains("scroll=2m"), "Unexpected query string: {query}");
	assert!(query.contains("ignore_unavailable=true"), "Unexpected query string: {query}");
	assert_eq!(
		requests[0].body,
		serde_json::json!({
			"size": 10_000,
			"query": {
				"range": {
					"@timestamp": { "gte": "2019-11-20T00:00:00Z", "lt": "2019-12-05T00:00:00Z" }
				}
			}
		})
	);
}

#[tokio::test]
async fn base_path_is_preserved() {
	let mock = MockEngine::default();

	mock.respond(StatusCode::OK, serde_json::json!({ "hits": { "hits": [] } }));

	let engine = spawn_engine(mock.clone(), "/es/").await;
	let page = engine.search(&request(&["type_2019.11"])).await.expect("Search failed.");

	assert!(page.documents.is_empty());
	assert_eq!(page.scroll_id, None);
	assert_eq!(mock.requests()[0].path, "/es/type_2019.11/_search");
}

#[tokio::test]
async fn next_page_redeems_scroll_id() {
	let mock = MockEngine::default();

	mock.respond(
		StatusCode::OK,
		serde_json::json!({ "_scroll_id": "scroll-2", "hits": { "hits": [{ "_source": { "id": 3 } }] } }),
	);

	let engine = spawn_engine(mock.clone(), "").await;
	let page = engine.next_page("2m", "scroll-1").await.expect("Scroll failed.");

	assert_eq!(page.scroll_id.as_deref(), Some("scroll-2"));
	assert_eq!(page.documents, vec![serde_json::json!({ "id": 3 })]);

	let requests = mock.requests();

	assert_eq!(requests[0].path, "/_search/scroll");
	assert_eq!(requests[0].body, serde_json::json!({ "scroll": "2m", "scroll_id": "scroll-1" }));
}

#[tokio::test]
async fn engine_rejection_is_an_invalid_page() {
	let mock = MockEngine::default();

	mock.respond(
		StatusCode::BAD_REQUEST,
		serde_json::json!({ "error": { "reason": "no such field" }, "status": 400 }),
	);

	let engine = spawn_engine(mock, "").await;
	let page = engine.search(&request(&["type_2019.11"])).await.expect("Search failed.");

	assert!(!page.is_valid());
	assert_eq!(page.invalid_reason(), Some("no such field"));
	assert!(page.documents.is_empty());
}

#[tokio::test]
async fn expired_scroll_is_an_invalid_page() {
	let mock = MockEngine::default();

	mock.respond(
		StatusCode::NOT_FOUND,
		serde_json::json!({
			"error": {
				"root_cause": [{ "type": "search_context_missing_exception", "reason": "No search context found for id [7]" }],
				"type": "search_phase_execution_exception",
				"reason": "all shards failed"
			},
			"status": 404
		}),
	);

	let engine = spawn_engine(mock, "").await;
	let page = engine.next_page("2m", "stale").await.expect("Scroll failed.");

	assert_eq!(
		page.invalid_reason(),
		Some("all shards failed: No search context found for id [7]")
	);
}

#[tokio::test]
async fn empty_index_list_is_rejected_before_sending() {
	let mock = MockEngine::default();
	let engine = spawn_engine(mock.clone(), "").await;
	let err = engine.search(&request(&[])).await.expect_err("Expected empty index error.");

	assert!(matches!(err, Error::InvalidRequest { .. }), "Unexpected error: {err}");
	assert!(mock.requests().is_empty());
}

#[test]
fn invalid_url_is_a_config_error() {
	let cfg = trawl_config::Engine { url: "not a url".to_string(), timeout_ms: None };
	let err = match HttpEngine::new(&cfg) {
		Ok(_) => panic!("Expected URL validation error."),
		Err(err) => err,
	};

	assert!(matches!(err, Error::InvalidConfig { .. }), "Unexpected error: {err}");
}
