use std::{collections::VecDeque, env, sync::Mutex};

use serde_json::Value;

use trawl_engine::{BoxFuture, Error, Result, ResultPage, SearchEngine, SearchRequest};

#[derive(Debug, Clone)]
pub enum Call {
	Search(SearchRequest),
	NextPage { keep_alive: String, scroll_id: String },
}

enum Step {
	Page(ResultPage),
	Fail(String),
}
impl Step {
	fn into_result(self) -> Result<ResultPage> {
		match self {
			Self::Page(page) => Ok(page),
			Self::Fail(message) => Err(Error::InvalidResponse { message }),
		}
	}
}

/// In-memory engine that replays scripted responses in order and records every call.
///
/// Opening searches and continuation fetches have separate scripts. A call with nothing
/// left to replay fails like a transport error.
#[derive(Default)]
pub struct ScriptedEngine {
	searches: Mutex<VecDeque<Step>>,
	pages: Mutex<VecDeque<Step>>,
	calls: Mutex<Vec<Call>>,
}
impl ScriptedEngine {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn on_search(self, page: ResultPage) -> Self {
		lock(&self.searches).push_back(Step::Page(page));

		self
	}

	pub fn on_search_fail(self, message: &str) -> Self {
		lock(&self.searches).push_back(Step::Fail(message.to_string()));

		self
	}

	pub fn then_page(self, page: ResultPage) -> Self {
		lock(&self.pages).push_back(Step::Page(page));

		self
	}

	pub fn then_fail(self, message: &str) -> Self {
		lock(&self.pages).push_back(Step::Fail(message.to_string()));

		self
	}

	pub fn calls(&self) -> Vec<Call> {
		lock(&self.calls).clone()
	}

	pub fn search_calls(&self) -> Vec<SearchRequest> {
		self.calls()
			.into_iter()
			.filter_map(|call| match call {
				Call::Search(req) => Some(req),
				Call::NextPage { .. } => None,
			})
			.collect()
	}

	/// Scroll ids redeemed so far, in call order.
	pub fn redeemed(&self) -> Vec<String> {
		self.calls()
			.into_iter()
			.filter_map(|call| match call {
				Call::Search(_) => None,
				Call::NextPage { scroll_id, .. } => Some(scroll_id),
			})
			.collect()
	}

	pub fn remaining_pages(&self) -> usize {
		lock(&self.pages).len()
	}
}
impl SearchEngine for ScriptedEngine {
	fn search<'a>(&'a self, req: &'a SearchRequest) -> BoxFuture<'a, Result<ResultPage>> {
		lock(&self.calls).push(Call::Search(req.clone()));

		let step = lock(&self.searches).pop_front();

		Box::pin(async move {
			step.map(Step::into_result).unwrap_or_else(|| {
				Err(Error::InvalidResponse {
					message: "Scripted engine has no search response left.".to_string(),
				})
			})
		})
	}

	fn next_page<'a>(
		&'a self,
		keep_alive: &'a str,
		scroll_id: &'a str,
	) -> BoxFuture<'a, Result<ResultPage>> {
		lock(&self.calls).push(Call::NextPage {
			keep_alive: keep_alive.to_string(),
			scroll_id: scroll_id.to_string(),
		});

		let step = lock(&self.pages).pop_front();

		Box::pin(async move {
			step.map(Step::into_result).unwrap_or_else(|| {
				Err(Error::InvalidResponse {
					message: "Scripted engine has no scroll page left.".to_string(),
				})
			})
		})
	}
}

/// A valid page of `{ "n": ... }` documents numbered from `first`.
pub fn numbered_page(first: u64, len: u64, scroll_id: Option<&str>) -> ResultPage {
	let documents = (first..first + len).map(|n| serde_json::json!({ "n": n })).collect();

	ResultPage::valid(documents, scroll_id.map(str::to_string))
}

pub fn empty_page(scroll_id: Option<&str>) -> ResultPage {
	ResultPage::valid(Vec::<Value>::new(), scroll_id.map(str::to_string))
}

/// Base URL of a live engine for opt-in integration tests.
pub fn env_engine_url() -> Option<String> {
	env::var("TRAWL_ES_URL").ok().filter(|url| !url.trim().is_empty())
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|err| err.into_inner())
}
