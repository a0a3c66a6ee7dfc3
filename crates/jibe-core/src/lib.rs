//! Decision logic shared by the API: the near-duplicate gate for new
//! insult text and the builder that turns loose request fields into a
//! typed filter predicate.

pub mod filter;
pub mod similarity;

pub use filter::{FieldKind, Filter, FilterClause, Schema, build_filter};
pub use similarity::{Decision, Gate};
