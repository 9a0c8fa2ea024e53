//! Query engine: list, filter, resolve, aggregate.
//!
//! Each query is an independent pass through
//! validate → parse → fetch list → filter and resolve → join.
//! Any failure ends the query; values gathered before the failure are
//! dropped, never returned.

use tracing::{debug, trace};

use crate::query::{parse_predicates, PredicateSet};
use crate::schema::{decode_objects, LabeledObject, ObjectClass};
use crate::source::{Accept, MetadataSource};
use crate::Result;

/// Output shaping for a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Stop at the first matching object and return its value alone.
    pub first_only: bool,
    /// Join values with `,` instead of newlines.
    pub csv: bool,
}

impl QueryOptions {
    pub fn separator(&self) -> &'static str {
        if self.csv {
            ","
        } else {
            "\n"
        }
    }
}

/// A fully validated query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub class: ObjectClass,
    pub predicates: PredicateSet,
    pub value_name: String,
    pub options: QueryOptions,
}

impl QueryRequest {
    /// Validate the object class and parse the predicate string.
    pub fn parse(
        class: &str,
        predicates: &str,
        value_name: impl Into<String>,
        options: QueryOptions,
    ) -> Result<Self> {
        Ok(Self {
            class: class.parse()?,
            predicates: parse_predicates(predicates)?,
            value_name: value_name.into(),
            options,
        })
    }
}

/// Runs label queries against a metadata source.
pub struct QueryEngine<S> {
    source: S,
}

impl<S: MetadataSource> QueryEngine<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Query by raw arguments: validates the class, parses the predicate
    /// string, then runs the query.
    pub fn query(
        &self,
        class: &str,
        predicates: &str,
        value_name: &str,
        options: &QueryOptions,
    ) -> Result<String> {
        let request = QueryRequest::parse(class, predicates, value_name, *options)?;
        self.run(&request)
    }

    /// Run a validated query and return the aggregated output.
    ///
    /// With `first_only`, the first match's raw value is returned and no
    /// later object is examined. Zero matches yield an empty string.
    pub fn run(&self, request: &QueryRequest) -> Result<String> {
        debug!(
            class = %request.class,
            predicates = %request.predicates,
            value = %request.value_name,
            "running query"
        );

        let objects = self.list(request.class)?;
        let mut values = Vec::new();

        for object in &objects {
            if !request.predicates.matches(object) {
                trace!(object = %object.name, "skipped");
                continue;
            }
            trace!(object = %object.name, "matched");

            let value = self.resolve(request.class, object, &request.value_name)?;
            if request.options.first_only {
                return Ok(value);
            }
            values.push(value);
        }

        debug!(matches = values.len(), "query complete");
        Ok(values.join(request.options.separator()))
    }

    /// Fetch every object of a class, in the order the service returns them.
    pub fn list(&self, class: ObjectClass) -> Result<Vec<LabeledObject>> {
        let body = self.source.fetch(class.as_str(), Accept::Json)?;
        let objects = decode_objects(&body)?;
        debug!(class = %class, count = objects.len(), "listed objects");
        Ok(objects)
    }

    /// Fetch the objects of a class that satisfy every predicate.
    pub fn select(
        &self,
        class: ObjectClass,
        predicates: &PredicateSet,
    ) -> Result<Vec<LabeledObject>> {
        Ok(self
            .list(class)?
            .into_iter()
            .filter(|object| predicates.matches(object))
            .collect())
    }

    /// Fetch one named value of an object as raw text.
    pub fn resolve(
        &self,
        class: ObjectClass,
        object: &LabeledObject,
        value_name: &str,
    ) -> Result<String> {
        self.source
            .fetch(&class.value_path(&object.name, value_name), Accept::Text)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};

    use super::*;
    use crate::Error;

    /// In-memory source that records every fetch.
    #[derive(Default)]
    struct FakeSource {
        bodies: HashMap<String, String>,
        failing: HashSet<String>,
        calls: RefCell<Vec<(String, Accept)>>,
    }

    impl FakeSource {
        fn with(mut self, path: &str, body: &str) -> Self {
            self.bodies.insert(path.to_string(), body.to_string());
            self
        }

        fn failing_on(mut self, path: &str) -> Self {
            self.failing.insert(path.to_string());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|(p, _)| p.clone()).collect()
        }
    }

    impl MetadataSource for FakeSource {
        fn fetch(&self, path: &str, accept: Accept) -> Result<String> {
            self.calls.borrow_mut().push((path.to_string(), accept));
            if self.failing.contains(path) {
                return Err(Error::Retrieval {
                    url: path.to_string(),
                    message: "connection reset".to_string(),
                });
            }
            self.bodies.get(path).cloned().ok_or_else(|| Error::Retrieval {
                url: path.to_string(),
                message: "HTTP 404 Not Found".to_string(),
            })
        }
    }

    const CONTAINERS: &str = r#"[
        {"name": "web-1", "labels": {"env": "prod", "tier": "web"}},
        {"name": "db-1", "labels": {"env": "prod", "tier": "db"}},
        {"name": "web-2", "labels": {"env": "prod", "tier": "web"}},
        {"name": "web-3", "labels": {"env": "staging", "tier": "web"}},
        {"name": "web-4", "labels": {"env": "prod", "tier": "web"}}
    ]"#;

    fn containers() -> FakeSource {
        FakeSource::default()
            .with("containers", CONTAINERS)
            .with("containers/web-1/primary_ip", "10.0.0.1")
            .with("containers/db-1/primary_ip", "10.0.0.2")
            .with("containers/web-2/primary_ip", "10.0.0.3")
            .with("containers/web-3/primary_ip", "10.0.0.4")
            .with("containers/web-4/primary_ip", "10.0.0.5")
    }

    fn opts(first_only: bool, csv: bool) -> QueryOptions {
        QueryOptions { first_only, csv }
    }

    #[test]
    fn test_newline_joined_by_default() {
        let engine = QueryEngine::new(containers());
        let out = engine
            .query("containers", "env=prod,tier=web", "primary_ip", &opts(false, false))
            .unwrap();
        assert_eq!(out, "10.0.0.1\n10.0.0.3\n10.0.0.5");
    }

    #[test]
    fn test_csv_joined() {
        let engine = QueryEngine::new(containers());
        let out = engine
            .query("containers", "env=prod,tier=web", "primary_ip", &opts(false, true))
            .unwrap();
        assert_eq!(out, "10.0.0.1,10.0.0.3,10.0.0.5");
    }

    #[test]
    fn test_first_only_stops_retrieving() {
        let source = containers();
        let engine = QueryEngine::new(&source);
        let out = engine
            .query("containers", "tier=web", "primary_ip", &opts(true, true))
            .unwrap();

        assert_eq!(out, "10.0.0.1");
        assert_eq!(
            source.calls(),
            vec!["containers", "containers/web-1/primary_ip"]
        );
    }

    #[test]
    fn test_first_only_skips_leading_non_matches() {
        let source = containers();
        let engine = QueryEngine::new(&source);
        let out = engine
            .query("containers", "tier=db", "primary_ip", &opts(true, false))
            .unwrap();

        assert_eq!(out, "10.0.0.2");
        assert_eq!(source.calls().len(), 2);
    }

    #[test]
    fn test_empty_predicates_match_everything() {
        let engine = QueryEngine::new(containers());
        let out = engine
            .query("containers", "", "primary_ip", &opts(false, true))
            .unwrap();
        assert_eq!(out, "10.0.0.1,10.0.0.2,10.0.0.3,10.0.0.4,10.0.0.5");
    }

    #[test]
    fn test_zero_matches_is_empty_string() {
        for csv in [false, true] {
            let source = containers();
            let engine = QueryEngine::new(&source);
            let out = engine
                .query("containers", "tier=cache", "primary_ip", &opts(false, csv))
                .unwrap();
            assert_eq!(out, "");
            assert_eq!(source.calls(), vec!["containers"]);
        }
    }

    #[test]
    fn test_first_only_with_zero_matches() {
        let engine = QueryEngine::new(containers());
        let out = engine
            .query("containers", "tier=cache", "primary_ip", &opts(true, false))
            .unwrap();
        assert_eq!(out, "");
    }

    #[test]
    fn test_values_are_not_trimmed_or_deduplicated() {
        let source = FakeSource::default()
            .with("hosts", r#"[{"name": "h1", "labels": {}}, {"name": "h2", "labels": {}}]"#)
            .with("hosts/h1/agent_ip", " 10.0.0.9\n")
            .with("hosts/h2/agent_ip", " 10.0.0.9\n");
        let engine = QueryEngine::new(source);
        let out = engine.query("hosts", "", "agent_ip", &opts(false, true)).unwrap();
        assert_eq!(out, " 10.0.0.9\n, 10.0.0.9\n");
    }

    #[test]
    fn test_invalid_object_class_fetches_nothing() {
        let source = containers();
        let engine = QueryEngine::new(&source);
        let err = engine
            .query("volumes", "", "name", &QueryOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidObjectClass(_)));
        assert!(source.calls().is_empty());
    }

    #[test]
    fn test_malformed_predicate_fetches_nothing() {
        let source = containers();
        let engine = QueryEngine::new(&source);
        let err = engine
            .query("containers", "tier", "name", &QueryOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::MalformedPredicate(_)));
        assert!(source.calls().is_empty());
    }

    #[test]
    fn test_list_failure_aborts_before_resolving() {
        let source = containers().failing_on("containers");
        let engine = QueryEngine::new(&source);
        let err = engine
            .query("containers", "", "primary_ip", &QueryOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::Retrieval { .. }));
        assert_eq!(source.calls(), vec!["containers"]);
    }

    #[test]
    fn test_malformed_list_aborts_before_resolving() {
        let source = FakeSource::default()
            .with("stacks", "<html>oops</html>")
            .with("stacks/s1/name", "s1");
        let engine = QueryEngine::new(&source);
        let err = engine
            .query("stacks", "", "name", &QueryOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert_eq!(source.calls(), vec!["stacks"]);
    }

    #[test]
    fn test_resolve_failure_discards_partial_results() {
        let source = containers().failing_on("containers/web-2/primary_ip");
        let engine = QueryEngine::new(&source);
        let err = engine
            .query("containers", "env=prod,tier=web", "primary_ip", &opts(false, false))
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Retrieval { ref url, .. } if url == "containers/web-2/primary_ip"
        ));
        assert_eq!(
            source.calls(),
            vec![
                "containers",
                "containers/web-1/primary_ip",
                "containers/web-2/primary_ip"
            ]
        );
    }

    #[test]
    fn test_request_hints() {
        let source = containers();
        let engine = QueryEngine::new(&source);
        engine
            .query("containers", "tier=db", "primary_ip", &QueryOptions::default())
            .unwrap();

        let calls = source.calls.borrow();
        assert_eq!(calls[0].1, Accept::Json);
        assert_eq!(calls[1].1, Accept::Text);
    }

    #[test]
    fn test_arangodb_cluster_container_name() {
        let source = FakeSource::default()
            .with(
                "containers",
                r#"[
                    {"name": "arangodb-agent-1", "labels": {"arangodb_cluster_name": "cluster1"}},
                    {"name": "arangodb-agent-2", "labels": {"arangodb_cluster_name": "cluster2"}}
                ]"#,
            )
            .with("containers/arangodb-agent-1/name", "arangodb-agent-1")
            .with("containers/arangodb-agent-2/name", "arangodb-agent-2");
        let engine = QueryEngine::new(&source);

        let out = engine
            .query(
                "containers",
                "arangodb_cluster_name=cluster1",
                "name",
                &QueryOptions::default(),
            )
            .unwrap();
        assert_eq!(out, "arangodb-agent-1");
        assert_eq!(source.calls().len(), 2);
    }

    #[test]
    fn test_select_preserves_order() {
        let engine = QueryEngine::new(containers());
        let predicates = parse_predicates("env=prod").unwrap();
        let names: Vec<_> = engine
            .select(ObjectClass::Containers, &predicates)
            .unwrap()
            .into_iter()
            .map(|o| o.name)
            .collect();
        assert_eq!(names, vec!["web-1", "db-1", "web-2", "web-4"]);
    }

    #[test]
    fn test_request_parse() {
        let request =
            QueryRequest::parse("services", "a=1", "fqdn", QueryOptions::default()).unwrap();
        assert_eq!(request.class, ObjectClass::Services);
        assert_eq!(request.predicates.get("a"), Some("1"));
        assert_eq!(request.value_name, "fqdn");
    }
}
