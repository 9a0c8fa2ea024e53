//! Predicate language for selecting objects by label.
//!
//! # Syntax
//!
//! A predicate string is a comma-separated list of `label=value` terms:
//!
//! ```text
//! arangodb_cluster_name=cluster1,tier=prod
//! ```
//!
//! - Every term must hold for an object to match (conjunction).
//! - Only equality is supported; comparison is exact and case-sensitive.
//! - The first `=` splits label from value, so values may contain `=`.
//! - An empty string selects every object of the class.

mod parser;

pub use parser::{parse_predicates, PredicateSet};
