//! Roundup: query the metadata service by label.
//!
//! Objects of one class (hosts, stacks, services, containers) are fetched
//! from a read-only HTTP key/value service, filtered by a conjunction of
//! `label=value` predicates, and a named value is resolved for each match.

pub mod config;
pub mod engine;
pub mod error;
pub mod query;
pub mod schema;
pub mod source;

pub use config::Config;
pub use engine::{QueryEngine, QueryOptions, QueryRequest};
pub use error::{Error, Result};
pub use query::{parse_predicates, PredicateSet};
pub use schema::{LabeledObject, ObjectClass};
pub use source::{Accept, HttpSource, MetadataSource};
