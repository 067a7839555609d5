use std::time::Duration;

use reqwest::{Client, Response, StatusCode, Url};
use serde_json::Value;

use crate::{BoxFuture, Error, Result, ResultPage, SearchEngine, SearchRequest, query_dsl};

/// Elasticsearch REST client bound to a single endpoint.
pub struct HttpEngine {
	client: Client,
	base_url: Url,
}
impl HttpEngine {
	pub fn new(cfg: &trawl_config::Engine) -> Result<Self> {
		let mut builder = Client::builder();

		if let Some(timeout_ms) = cfg.timeout_ms {
			builder = builder.timeout(Duration::from_millis(timeout_ms));
		}

		let client = builder.build()?;
		let base_url = Url::parse(&cfg.url).map_err(|err| Error::InvalidConfig {
			message: format!("engine.url is not a valid URL: {err}."),
		})?;

		if base_url.cannot_be_a_base() {
			return Err(Error::InvalidConfig {
				message: "engine.url must be a base URL.".to_string(),
			});
		}

		Ok(Self { client, base_url })
	}

	fn endpoint(&self, segments: &[&str]) -> Result<Url> {
		let mut url = self.base_url.clone();

		{
			let mut path = url.path_segments_mut().map_err(|_| Error::InvalidConfig {
				message: "engine.url must be a base URL.".to_string(),
			})?;

			path.pop_if_empty().extend(segments);
		}

		Ok(url)
	}

	async fn open_scroll(&self, req: &SearchRequest) -> Result<ResultPage> {
		if req.indices.is_empty() {
			return Err(Error::InvalidRequest {
				message: "A scroll search needs at least one index.".to_string(),
			});
		}

		let indices = req.indices.join(",");
		let mut url = self.endpoint(&[indices.as_str(), "_search"])?;

		url.query_pairs_mut()
			.append_pair("scroll", &req.keep_alive)
			.append_pair("ignore_unavailable", if req.ignore_unavailable { "true" } else { "false" });

		let body = serde_json::json!({
			"size": req.page_size,
			"query": query_dsl::to_query(&req.query)?,
		});

		tracing::debug!(indices = req.indices.len(), page_size = req.page_size, "Opening scroll.");

		let res = self.client.post(url).json(&body).send().await?;

		read_page(res).await
	}

	async fn continue_scroll(&self, keep_alive: &str, scroll_id: &str) -> Result<ResultPage> {
		let url = self.endpoint(&["_search", "scroll"])?;
		let body = serde_json::json!({ "scroll": keep_alive, "scroll_id": scroll_id });
		let res = self.client.post(url).json(&body).send().await?;

		read_page(res).await
	}
}
impl SearchEngine for HttpEngine {
	fn search<'a>(&'a self, req: &'a SearchRequest) -> BoxFuture<'a, Result<ResultPage>> {
		Box::pin(self.open_scroll(req))
	}

	fn next_page<'a>(
		&'a self,
		keep_alive: &'a str,
		scroll_id: &'a str,
	) -> BoxFuture<'a, Result<ResultPage>> {
		Box::pin(self.continue_scroll(keep_alive, scroll_id))
	}
}

async fn read_page(res: Response) -> Result<ResultPage> {
	let status = res.status();
	let body = res.bytes().await?;

	if status.is_success() {
		let json: Value = serde_json::from_slice(&body)?;

		return parse_scroll_response(json);
	}

	let json = serde_json::from_slice::<Value>(&body).ok();

	Ok(ResultPage::invalid(error_reason(json.as_ref(), status)))
}

fn parse_scroll_response(json: Value) -> Result<ResultPage> {
	let scroll_id = json
		.get("_scroll_id")
		.and_then(Value::as_str)
		.filter(|id| !id.is_empty())
		.map(str::to_string);
	let hits = json
		.get("hits")
		.and_then(|v| v.get("hits"))
		.and_then(Value::as_array)
		.ok_or_else(|| Error::InvalidResponse {
			message: "Search response is missing hits.hits array.".to_string(),
		})?;
	let mut documents = Vec::with_capacity(hits.len());

	for hit in hits {
		let source = hit.get("_source").cloned().ok_or_else(|| Error::InvalidResponse {
			message: "Search hit is missing _source.".to_string(),
		})?;

		documents.push(source);
	}

	Ok(ResultPage::valid(documents, scroll_id))
}

fn error_reason(json: Option<&Value>, status: StatusCode) -> String {
	let error = json.and_then(|v| v.get("error"));
	let reason = error.and_then(|v| v.get("reason")).and_then(Value::as_str);
	let root_cause = error
		.and_then(|v| v.get("root_cause"))
		.and_then(Value::as_array)
		.and_then(|causes| causes.first())
		.and_then(|cause| cause.get("reason"))
		.and_then(Value::as_str);

	match (reason, root_cause) {
		(Some(reason), Some(cause)) if reason != cause => format!("{reason}: {cause}"),
		(Some(reason), _) => reason.to_string(),
		(None, Some(cause)) => cause.to_string(),
		(None, None) => match error.and_then(Value::as_str) {
			Some(message) => message.to_string(),
			None => format!("Engine responded with HTTP {status}."),
		},
	}
}
