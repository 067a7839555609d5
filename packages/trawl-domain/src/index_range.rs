//! Month-partitioned index resolution.
//!
//! Documents of one type live in one index per calendar month, named
//! `{type}_{year}.{month}` with the type lowercased and the month zero-padded
//! (`login_2019.11`). A time range maps to every month it touches, both ends
//! inclusive. Months that have no index on the engine side are still emitted;
//! the search request is sent with `ignore_unavailable` instead of checking each
//! candidate up front.

use std::fmt;

use time::{OffsetDateTime, UtcOffset};

/// A non-empty, UTC-normalized `[start, end)` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
	start: OffsetDateTime,
	end: OffsetDateTime,
}
impl TimeRange {
	/// Returns `None` unless `end` is strictly after `start`.
	pub fn new(start: OffsetDateTime, end: OffsetDateTime) -> Option<Self> {
		let start = start.to_offset(UtcOffset::UTC);
		let end = end.to_offset(UtcOffset::UTC);

		if end <= start {
			return None;
		}

		Some(Self { start, end })
	}

	pub fn start(&self) -> OffsetDateTime {
		self.start
	}

	pub fn end(&self) -> OffsetDateTime {
		self.end
	}

	/// Number of month boundaries crossed between `start` and `end`.
	pub fn month_span(&self) -> u32 {
		(month_ordinal(self.end) - month_ordinal(self.start)) as u32
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexName(String);
impl IndexName {
	fn monthly(doc_type: &str, ordinal: i64) -> Self {
		let year = ordinal.div_euclid(12);
		let month = ordinal.rem_euclid(12) + 1;

		Self(format!("{doc_type}_{year}.{month:02}"))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn into_string(self) -> String {
		self.0
	}
}
impl fmt::Display for IndexName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}
impl AsRef<str> for IndexName {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

/// Resolves the monthly indices covering `[start, end)` for `doc_type`.
///
/// Returns an empty list when the type is missing or blank, or when `end` is not after
/// `start`.
pub fn resolve(
	doc_type: Option<&str>,
	start: OffsetDateTime,
	end: OffsetDateTime,
) -> Vec<IndexName> {
	resolve_observed(doc_type, start, end, |_| {})
}

/// Same as [`resolve`], calling `observe` once per generated name in output order.
pub fn resolve_observed<F>(
	doc_type: Option<&str>,
	start: OffsetDateTime,
	end: OffsetDateTime,
	observe: F,
) -> Vec<IndexName>
where
	F: FnMut(&IndexName),
{
	let Some(doc_type) = doc_type.filter(|value| !value.trim().is_empty()) else {
		return Vec::new();
	};
	let Some(range) = TimeRange::new(start, end) else {
		return Vec::new();
	};

	resolve_range(doc_type, &range, observe)
}

pub fn resolve_range<F>(doc_type: &str, range: &TimeRange, mut observe: F) -> Vec<IndexName>
where
	F: FnMut(&IndexName),
{
	let doc_type = doc_type.to_lowercase();
	let first = month_ordinal(range.start);
	let last = month_ordinal(range.end);
	let mut indices = Vec::with_capacity((last - first + 1) as usize);

	for ordinal in first..=last {
		let index = IndexName::monthly(&doc_type, ordinal);

		observe(&index);

		indices.push(index);
	}

	indices
}

// Months since year zero, so consecutive calendar months differ by one.
fn month_ordinal(at: OffsetDateTime) -> i64 {
	i64::from(at.year()) * 12 + i64::from(u8::from(at.month())) - 1
}
