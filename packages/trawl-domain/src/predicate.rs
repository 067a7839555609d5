use time::OffsetDateTime;

use crate::TimeRange;

/// Boolean filter handed to the search engine.
///
/// Only conjunction is expressible. The engine adapter owns the translation into its
/// query language.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
	/// `gte <= field < lt`.
	DateRange { field: String, gte: OffsetDateTime, lt: OffsetDateTime },
	/// `field` equals any of `values`.
	Terms { field: String, values: Vec<String> },
	/// `field >= gte`.
	NumericRange { field: String, gte: f64 },
	And(Vec<Predicate>),
}
impl Predicate {
	pub fn date_range(field: impl Into<String>, range: &TimeRange) -> Self {
		Self::DateRange { field: field.into(), gte: range.start(), lt: range.end() }
	}

	pub fn terms<I, S>(field: impl Into<String>, values: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::Terms { field: field.into(), values: values.into_iter().map(Into::into).collect() }
	}

	pub fn at_least(field: impl Into<String>, gte: f64) -> Self {
		Self::NumericRange { field: field.into(), gte }
	}

	/// Conjunction of `self` and `other`, flattening nested `And`s.
	pub fn and(self, other: Predicate) -> Self {
		let mut clauses = match self {
			Self::And(clauses) => clauses,
			single => vec![single],
		};

		match other {
			Self::And(more) => clauses.extend(more),
			single => clauses.push(single),
		}

		Self::And(clauses)
	}

	/// Leaf predicates in composition order.
	pub fn clauses(&self) -> Vec<&Predicate> {
		match self {
			Self::And(clauses) => clauses.iter().flat_map(Predicate::clauses).collect(),
			leaf => vec![leaf],
		}
	}

	pub fn has_date_range_on(&self, field: &str) -> bool {
		self.clauses()
			.into_iter()
			.any(|clause| matches!(clause, Self::DateRange { field: f, .. } if f == field))
	}
}

/// Restricts `field` to a set of allowed values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermsFilter {
	pub field: String,
	pub values: Vec<String>,
}
impl TermsFilter {
	pub fn new<I, S>(field: impl Into<String>, values: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self { field: field.into(), values: values.into_iter().map(Into::into).collect() }
	}

	// A filter without a field or values carries no condition and is left out of the query.
	fn is_conditionless(&self) -> bool {
		self.field.trim().is_empty() || self.values.is_empty()
	}
}

/// Inclusive numeric lower bound on `field`.
#[derive(Debug, Clone, PartialEq)]
pub struct LowerBound {
	pub field: String,
	pub gte: f64,
}
impl LowerBound {
	pub fn new(field: impl Into<String>, gte: f64) -> Self {
		Self { field: field.into(), gte }
	}
}

/// Builds the scan query: the date range on `timestamp_field`, then the optional lower
/// bound, then each terms filter, all ANDed together.
///
/// Conditionless terms filters are skipped. The result is a bare `DateRange` when nothing
/// else applies.
pub fn compose(
	timestamp_field: &str,
	range: &TimeRange,
	terms: &[TermsFilter],
	lower_bound: Option<&LowerBound>,
) -> Predicate {
	let mut query = Predicate::date_range(timestamp_field, range);

	if let Some(bound) = lower_bound {
		query = query.and(Predicate::at_least(bound.field.clone(), bound.gte));
	}

	for filter in terms.iter().filter(|filter| !filter.is_conditionless()) {
		query = query.and(Predicate::terms(filter.field.clone(), filter.values.iter().cloned()));
	}

	query
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use super::*;

	#[test]
	fn and_flattens_both_sides() {
		let left = Predicate::at_least("a", 1.0).and(Predicate::at_least("b", 2.0));
		let right = Predicate::terms("c", ["x"]).and(Predicate::terms("d", ["y"]));
		let Predicate::And(clauses) = left.and(right) else {
			panic!("Expected a conjunction.");
		};

		assert_eq!(clauses.len(), 4);
		assert!(clauses.iter().all(|clause| !matches!(clause, Predicate::And(_))));
	}

	#[test]
	fn clauses_walks_nested_conjunctions() {
		let nested = Predicate::And(vec![
			Predicate::at_least("a", 1.0),
			Predicate::And(vec![Predicate::terms("b", ["1"]), Predicate::at_least("c", 0.0)]),
		]);

		assert_eq!(nested.clauses().len(), 3);
	}

	#[test]
	fn conditionless_terms_are_skipped() {
		let range = TimeRange::new(datetime!(2019-11-20 0:00 UTC), datetime!(2019-11-29 0:00 UTC))
			.expect("Range must be valid.");
		let terms = [
			TermsFilter::new("TownshipCode", Vec::<String>::new()),
			TermsFilter::new(" ", ["1000508"]),
		];
		let query = compose("@timestamp", &range, &terms, None);

		assert_eq!(query, Predicate::date_range("@timestamp", &range));
	}
}
