pub mod executor;

mod error;

pub use error::{Error, Result};
pub use executor::{Completion, PagedQueryExecutor, ScanResult};

use std::sync::Arc;

use serde::de::DeserializeOwned;
use time::OffsetDateTime;

use trawl_domain::{LowerBound, TermsFilter, TimeRange};
use trawl_engine::{SearchEngine, http::HttpEngine};

/// Parameters of one scan. Filters are optional and always ANDed with the time range.
#[derive(Debug, Clone)]
pub struct ScanRequest {
	pub doc_type: Option<String>,
	pub start: OffsetDateTime,
	pub end: OffsetDateTime,
	pub terms: Vec<TermsFilter>,
	pub lower_bound: Option<LowerBound>,
}
impl ScanRequest {
	pub fn new(doc_type: impl Into<String>, start: OffsetDateTime, end: OffsetDateTime) -> Self {
		Self { doc_type: Some(doc_type.into()), start, end, terms: Vec::new(), lower_bound: None }
	}
}

pub struct TrawlService {
	timestamp_field: String,
	executor: PagedQueryExecutor,
}
impl TrawlService {
	pub fn new(scan: &trawl_config::Scan, engine: Arc<dyn SearchEngine>) -> Self {
		Self {
			timestamp_field: scan.timestamp_field.clone(),
			executor: PagedQueryExecutor::new(engine, scan),
		}
	}

	pub fn from_config(cfg: &trawl_config::Config) -> Result<Self> {
		let engine = HttpEngine::new(&cfg.engine)?;

		Ok(Self::new(&cfg.scan, Arc::new(engine)))
	}

	pub async fn search<T>(
		&self,
		doc_type: Option<&str>,
		start: OffsetDateTime,
		end: OffsetDateTime,
	) -> Result<Option<ScanResult<T>>>
	where
		T: DeserializeOwned,
	{
		self.search_with(&ScanRequest {
			doc_type: doc_type.map(str::to_string),
			start,
			end,
			terms: Vec::new(),
			lower_bound: None,
		})
		.await
	}

	pub async fn search_by_terms<T>(
		&self,
		doc_type: Option<&str>,
		terms: &[TermsFilter],
		start: OffsetDateTime,
		end: OffsetDateTime,
	) -> Result<Option<ScanResult<T>>>
	where
		T: DeserializeOwned,
	{
		self.search_with(&ScanRequest {
			doc_type: doc_type.map(str::to_string),
			start,
			end,
			terms: terms.to_vec(),
			lower_bound: None,
		})
		.await
	}

	pub async fn search_by_lower_bound<T>(
		&self,
		doc_type: Option<&str>,
		start: OffsetDateTime,
		end: OffsetDateTime,
		lower_bound: &LowerBound,
	) -> Result<Option<ScanResult<T>>>
	where
		T: DeserializeOwned,
	{
		self.search_with(&ScanRequest {
			doc_type: doc_type.map(str::to_string),
			start,
			end,
			terms: Vec::new(),
			lower_bound: Some(lower_bound.clone()),
		})
		.await
	}

	pub async fn search_by_terms_lower_bound<T>(
		&self,
		doc_type: Option<&str>,
		start: OffsetDateTime,
		end: OffsetDateTime,
		lower_bound: &LowerBound,
		terms: &[TermsFilter],
	) -> Result<Option<ScanResult<T>>>
	where
		T: DeserializeOwned,
	{
		self.search_with(&ScanRequest {
			doc_type: doc_type.map(str::to_string),
			start,
			end,
			terms: terms.to_vec(),
			lower_bound: Some(lower_bound.clone()),
		})
		.await
	}

	/// Resolves the indices for `req` and drains a scan over them.
	///
	/// Returns `Ok(None)` without contacting the engine when there is no type or the range
	/// is empty.
	pub async fn search_with<T>(&self, req: &ScanRequest) -> Result<Option<ScanResult<T>>>
	where
		T: DeserializeOwned,
	{
		let Some(doc_type) = req.doc_type.as_deref().filter(|value| !value.trim().is_empty())
		else {
			return Ok(None);
		};
		let Some(range) = TimeRange::new(req.start, req.end) else {
			tracing::debug!(doc_type, "Empty time range; nothing to scan.");

			return Ok(None);
		};
		let indices = trawl_domain::resolve_range(doc_type, &range, |index| {
			tracing::debug!(%index, "Resolved index.");
		});
		let query = trawl_domain::compose(
			&self.timestamp_field,
			&range,
			&req.terms,
			req.lower_bound.as_ref(),
		);

		tracing::info!(doc_type, indices = indices.len(), "Starting scan.");

		let result = self.executor.execute::<T>(&indices, query).await?;

		tracing::info!(
			documents = result.documents.len(),
			pages = result.pages,
			complete = result.is_complete(),
			"Scan finished."
		);

		Ok(Some(result))
	}
}
