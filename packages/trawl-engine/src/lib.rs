pub mod http;
pub mod query_dsl;

mod error;

pub use error::{Error, Result};

use std::{future::Future, pin::Pin};

use serde_json::Value;

use trawl_domain::Predicate;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Opening request of a scroll scan.
#[derive(Debug, Clone)]
pub struct SearchRequest {
	pub indices: Vec<String>,
	pub ignore_unavailable: bool,
	pub page_size: u32,
	/// How long the engine keeps the scroll context alive between page fetches.
	pub keep_alive: String,
	pub query: Predicate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStatus {
	Valid,
	Invalid { reason: String },
}

/// One page of a scroll scan as reported by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPage {
	/// Document sources in engine order.
	pub documents: Vec<Value>,
	pub scroll_id: Option<String>,
	pub status: PageStatus,
}
impl ResultPage {
	pub fn valid(documents: Vec<Value>, scroll_id: Option<String>) -> Self {
		Self { documents, scroll_id, status: PageStatus::Valid }
	}

	pub fn invalid(reason: impl Into<String>) -> Self {
		Self {
			documents: Vec::new(),
			scroll_id: None,
			status: PageStatus::Invalid { reason: reason.into() },
		}
	}

	pub fn is_valid(&self) -> bool {
		matches!(self.status, PageStatus::Valid)
	}

	pub fn invalid_reason(&self) -> Option<&str> {
		match &self.status {
			PageStatus::Valid => None,
			PageStatus::Invalid { reason } => Some(reason),
		}
	}
}

/// Document-search engine that serves scroll scans.
///
/// An engine-side rejection is reported as an invalid [`ResultPage`]; `Err` is reserved
/// for transport and protocol failures.
pub trait SearchEngine
where
	Self: Send + Sync,
{
	fn search<'a>(&'a self, req: &'a SearchRequest) -> BoxFuture<'a, Result<ResultPage>>;

	fn next_page<'a>(
		&'a self,
		keep_alive: &'a str,
		scroll_id: &'a str,
	) -> BoxFuture<'a, Result<ResultPage>>;
}
