pub mod index_range;
pub mod predicate;

pub use index_range::{IndexName, TimeRange, resolve, resolve_observed, resolve_range};
pub use predicate::{LowerBound, Predicate, TermsFilter, compose};
