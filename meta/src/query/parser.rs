//! Predicate parser for label selectors.

use std::collections::hash_map;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::schema::LabeledObject;
use crate::{Error, Result};

/// A parsed set of required label values.
///
/// Each label appears at most once; parsing keeps the last value given for
/// a repeated label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredicateSet {
    required: HashMap<String, String>,
}

impl PredicateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `label` to be set to exactly `value`, replacing any earlier
    /// requirement on the same label.
    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<String>) {
        self.required.insert(label.into(), value.into());
    }

    /// Number of distinct labels constrained.
    pub fn len(&self) -> usize {
        self.required.len()
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty()
    }

    /// True when the set selects every object (no predicates).
    pub fn is_match_all(&self) -> bool {
        self.is_empty()
    }

    /// Required value for a label, if constrained.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.required.get(label).map(String::as_str)
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, String> {
        self.required.iter()
    }

    /// Number of predicates the object satisfies.
    ///
    /// A predicate is satisfied only when the label is present with an
    /// identical value; an absent label never counts, even against an empty
    /// required value.
    pub fn satisfied_by(&self, object: &LabeledObject) -> usize {
        self.required
            .iter()
            .filter(|(label, value)| object.label(label) == Some(value.as_str()))
            .count()
    }

    /// Check whether the object satisfies every predicate.
    pub fn matches(&self, object: &LabeledObject) -> bool {
        self.satisfied_by(object) == self.len()
    }
}

impl FromStr for PredicateSet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_predicates(s)
    }
}

impl fmt::Display for PredicateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut terms: Vec<_> = self.required.iter().collect();
        terms.sort();
        for (i, (label, value)) in terms.into_iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}={}", label, value)?;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PredicateSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = PredicateSet::new();
        for (label, value) in iter {
            set.insert(label, value);
        }
        set
    }
}

/// Parse a predicate string into a set of required label values.
///
/// Only the empty string yields an empty set. Every term of any other
/// input, whitespace included, must contain `=` and a non-empty label.
pub fn parse_predicates(input: &str) -> Result<PredicateSet> {
    let mut set = PredicateSet::new();

    if input.is_empty() {
        return Ok(set);
    }

    for term in input.split(',') {
        let (label, value) = parse_term(term)?;
        set.insert(label, value);
    }

    Ok(set)
}

/// Split one `label=value` term on its first `=`.
fn parse_term(term: &str) -> Result<(&str, &str)> {
    let (label, value) = term.split_once('=').ok_or_else(|| {
        Error::MalformedPredicate(format!("'{}' is not of the form label=value", term))
    })?;

    if label.is_empty() {
        return Err(Error::MalformedPredicate(format!(
            "'{}' has an empty label",
            term
        )));
    }

    Ok((label, value))
}
