//! Scroll draining.
//!
//! A scan opens a scroll against the resolved indices and then keeps redeeming the latest
//! scroll id until the engine hands back a page with no documents. Pages are fetched one
//! at a time because every fetch needs the id returned by the previous one. Scroll
//! contexts are never cleared explicitly; the engine drops them once `keep_alive` lapses.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use trawl_domain::{IndexName, Predicate};
use trawl_engine::{PageStatus, ResultPage, SearchEngine, SearchRequest};

use crate::{Error, Result};

/// How a scan ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
	/// The engine returned an empty page, or never opened a scroll.
	Complete,
	/// A continuation fetch failed; `documents` holds everything gathered before it.
	Truncated { reason: String },
}

#[derive(Debug, Clone)]
pub struct ScanResult<T> {
	pub documents: Vec<T>,
	pub completion: Completion,
	/// Engine responses consumed, the opening search included.
	pub pages: usize,
}
impl<T> ScanResult<T> {
	pub fn is_complete(&self) -> bool {
		self.completion == Completion::Complete
	}

	pub fn into_documents(self) -> Vec<T> {
		self.documents
	}
}

struct Drained {
	documents: Vec<Value>,
	completion: Completion,
	pages: usize,
}

pub struct PagedQueryExecutor {
	engine: Arc<dyn SearchEngine>,
	page_size: u32,
	keep_alive: String,
}
impl PagedQueryExecutor {
	pub fn new(engine: Arc<dyn SearchEngine>, scan: &trawl_config::Scan) -> Self {
		Self { engine, page_size: scan.page_size, keep_alive: scan.keep_alive.clone() }
	}

	/// Runs `predicate` over `indices` and collects every page.
	///
	/// Fails with [`Error::Query`] when the engine rejects the opening search. Failures
	/// after the first page end the scan early and are reported through
	/// [`ScanResult::completion`].
	pub async fn execute<T>(
		&self,
		indices: &[IndexName],
		predicate: Predicate,
	) -> Result<ScanResult<T>>
	where
		T: DeserializeOwned,
	{
		let req = SearchRequest {
			indices: indices.iter().map(ToString::to_string).collect(),
			ignore_unavailable: true,
			page_size: self.page_size,
			keep_alive: self.keep_alive.clone(),
			query: predicate,
		};
		let first = self.engine.search(&req).await?;

		if let PageStatus::Invalid { reason } = first.status {
			return Err(Error::Query { reason });
		}

		let drained = self.drain(first).await;
		let documents = drained
			.documents
			.into_iter()
			.map(serde_json::from_value)
			.collect::<std::result::Result<Vec<T>, _>>()
			.map_err(|err| Error::Decode { message: err.to_string() })?;

		Ok(ScanResult { documents, completion: drained.completion, pages: drained.pages })
	}

	async fn drain(&self, first: ResultPage) -> Drained {
		let mut pages = 1;
		let mut documents = first.documents;
		let Some(mut scroll_id) = first.scroll_id else {
			return Drained { documents, completion: Completion::Complete, pages };
		};
		let mut last_len = documents.len();

		while last_len > 0 {
			let page = match self.engine.next_page(&self.keep_alive, &scroll_id).await {
				Ok(page) => page,
				Err(err) => return truncated(documents, pages, err.to_string()),
			};

			pages += 1;

			if let PageStatus::Invalid { reason } = page.status {
				return truncated(documents, pages, reason);
			}
			if let Some(next) = page.scroll_id {
				scroll_id = next;
			}

			last_len = page.documents.len();

			tracing::debug!(page = pages, documents = last_len, "Fetched scroll page.");

			documents.extend(page.documents);
		}

		Drained { documents, completion: Completion::Complete, pages }
	}
}

fn truncated(documents: Vec<Value>, pages: usize, reason: String) -> Drained {
	tracing::warn!(pages, documents = documents.len(), %reason, "Scroll ended early.");

	Drained { documents, completion: Completion::Truncated { reason }, pages }
}
