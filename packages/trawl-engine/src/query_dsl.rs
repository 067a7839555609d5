use serde_json::{Map, Value};
use time::format_description::well_known::Rfc3339;

use trawl_domain::Predicate;

use crate::{Error, Result};

/// Renders `predicate` as an Elasticsearch query object.
///
/// Conjunctions become a `bool` query with every clause in filter context, since scans do
/// not need scoring.
pub fn to_query(predicate: &Predicate) -> Result<Value> {
	match predicate {
		Predicate::DateRange { field, gte, lt } => {
			let bounds = serde_json::json!({
				"gte": gte.format(&Rfc3339)?,
				"lt": lt.format(&Rfc3339)?,
			});

			Ok(single_field("range", field, bounds))
		},
		Predicate::Terms { field, values } => Ok(single_field("terms", field, values.clone().into())),
		Predicate::NumericRange { field, gte } => {
			if !gte.is_finite() {
				return Err(Error::InvalidRequest {
					message: format!("Lower bound on {field} must be a finite number."),
				});
			}

			Ok(single_field("range", field, serde_json::json!({ "gte": gte })))
		},
		Predicate::And(clauses) => {
			let filter = clauses.iter().map(to_query).collect::<Result<Vec<_>>>()?;

			Ok(serde_json::json!({ "bool": { "filter": filter } }))
		},
	}
}

fn single_field(kind: &str, field: &str, body: Value) -> Value {
	let mut inner = Map::new();

	inner.insert(field.to_string(), body);

	let mut outer = Map::new();

	outer.insert(kind.to_string(), Value::Object(inner));

	Value::Object(outer)
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use trawl_domain::{LowerBound, TermsFilter, TimeRange};

	use super::*;

	#[test]
	fn date_range_is_half_open_rfc3339() {
		let range = TimeRange::new(datetime!(2019-11-20 0:00 UTC), datetime!(2019-11-29 0:00 UTC))
			.expect("Range must be valid.");
		let query = to_query(&Predicate::date_range("@timestamp", &range)).expect("render failed");

		assert_eq!(
			query,
			serde_json::json!({
				"range": {
					"@timestamp": { "gte": "2019-11-20T00:00:00Z", "lt": "2019-11-29T00:00:00Z" }
				}
			})
		);
	}

	#[test]
	fn conjunction_renders_filter_clauses_in_order() {
		let range = TimeRange::new(datetime!(2019-11-20 0:00 UTC), datetime!(2019-11-29 0:00 UTC))
			.expect("Range must be valid.");
		let predicate = trawl_domain::compose(
			"@timestamp",
			&range,
			&[TermsFilter::new("TownshipCode", ["1000508"])],
			Some(&LowerBound::new("PGA", 1.0)),
		);
		let query = to_query(&predicate).expect("render failed");

		assert_eq!(
			query,
			serde_json::json!({
				"bool": {
					"filter": [
						{
							"range": {
								"@timestamp": {
									"gte": "2019-11-20T00:00:00Z",
									"lt": "2019-11-29T00:00:00Z"
								}
							}
						},
						{ "range": { "PGA": { "gte": 1.0 } } },
						{ "terms": { "TownshipCode": ["1000508"] } }
					]
				}
			})
		);
	}

	#[test]
	fn non_finite_bound_is_rejected() {
		let err = to_query(&Predicate::at_least("PGA", f64::NAN)).expect_err("Expected error.");

		assert!(err.to_string().contains("PGA"), "Unexpected error: {err}");
	}
}
