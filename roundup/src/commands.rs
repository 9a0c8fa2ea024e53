//! CLI command implementations.

use std::io::{self, Write};

use meta::{Config, HttpSource, QueryEngine, QueryOptions};
use tracing::info;

/// Arguments of a single query invocation.
pub struct QueryArgs<'a> {
    pub object_class: &'a str,
    pub predicates: &'a str,
    pub value_name: &'a str,
    pub first: bool,
    pub csv: bool,
    pub hostname: Option<&'a str>,
    pub url: Option<&'a str>,
    pub timeout: Option<u64>,
}

/// Resolve configuration: file and environment first, then CLI overrides.
fn resolve_config(args: &QueryArgs<'_>) -> meta::Result<Config> {
    let mut config = Config::load()?;

    if let Some(url) = args.url {
        config.metadata_url = Config::with_url(url).metadata_url;
    } else if let Some(host) = args.hostname {
        config.metadata_url = Config::with_hostname(host).metadata_url;
    }

    if let Some(secs) = args.timeout {
        config.timeout_secs = secs;
    }

    Ok(config)
}

/// Run one query and print its result to stdout as-is.
pub fn query(args: &QueryArgs<'_>) -> meta::Result<()> {
    let config = resolve_config(args)?;
    info!(url = %config.metadata_url, "querying metadata service");

    let engine = QueryEngine::new(HttpSource::new(&config));
    let options = QueryOptions {
        first_only: args.first,
        csv: args.csv,
    };
    let output = engine.query(args.object_class, args.predicates, args.value_name, &options)?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
