//! roundup: query the rancher-metadata service by label.

use clap::{ArgAction, Parser};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

const EXAMPLES: &str = "\
Examples:
  Fetch the first container name that has the label \"arangodb_cluster_name\" with the value \"cluster1\":
    roundup --first containers arangodb_cluster_name=cluster1 name

  List primary IPs of all production web containers, comma separated:
    roundup --csv containers env=prod,tier=web primary_ip";

#[derive(Parser)]
#[command(name = "roundup")]
#[command(about = "Roundup - query the rancher-metadata by label")]
#[command(version)]
#[command(after_help = EXAMPLES)]
struct Cli {
    /// Select first entry only
    #[arg(short = 'f', long = "first")]
    first: bool,

    /// Return as comma separated values
    #[arg(short = 'c', long = "csv")]
    csv: bool,

    /// Hostname of the metadata service (default: rancher-metadata)
    #[arg(short = 'H', long = "hostname")]
    hostname: Option<String>,

    /// Full base URL of the metadata API (overrides --hostname)
    #[arg(short = 'u', long = "url", conflicts_with = "hostname")]
    url: Option<String>,

    /// Request timeout in seconds (at least 1)
    #[arg(short = 't', long = "timeout", value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    /// Object class to query
    #[arg(value_parser = ["hosts", "stacks", "services", "containers"])]
    object_class: String,

    /// Comma separated label=value predicates (empty matches everything)
    predicates: String,

    /// Name of the value to fetch from each matching object
    value_name: String,
}

/// Boolean long flags also accepted Go `flag` style (`-first`, `-first=true`).
const LEGACY_BOOL_FLAGS: [&str; 2] = ["first", "csv"];

/// Valued long flags also accepted with a single dash (`-hostname x`).
const LEGACY_VALUE_FLAGS: [&str; 1] = ["hostname"];

/// Boolean spellings understood by Go's `strconv.ParseBool`.
fn parse_go_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Rewrite Go-style flags into the form clap expects. Stops at `--`.
///
/// - `-first`, `-csv`, `-hostname[=x]` gain a second dash.
/// - `-first=true` becomes `--first`; `-first=false` is dropped.
///   The same holds with a double dash.
/// - Any other boolean value is passed on as `--first=value` for clap to
///   reject.
fn normalize_legacy_flags<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen_terminator = false;
    args.into_iter()
        .filter_map(|arg| {
            if seen_terminator {
                return Some(arg);
            }
            if arg == "--" {
                seen_terminator = true;
                return Some(arg);
            }
            let Some(flag) = arg.strip_prefix("--").or_else(|| arg.strip_prefix('-')) else {
                return Some(arg);
            };
            let (name, value) = match flag.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (flag, None),
            };

            if LEGACY_BOOL_FLAGS.contains(&name) {
                return match value.map(parse_go_bool) {
                    None | Some(Some(true)) => Some(format!("--{}", name)),
                    Some(Some(false)) => None,
                    Some(None) => Some(format!("--{}", flag)),
                };
            }
            if LEGACY_VALUE_FLAGS.contains(&name) {
                return Some(format!("--{}", flag));
            }
            Some(arg)
        })
        .collect()
}

/// Install the stderr log subscriber. `RUST_LOG` takes precedence over `-v`.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse_from(normalize_legacy_flags(std::env::args()));
    init_logging(cli.verbose);

    let opts = commands::QueryArgs {
        object_class: &cli.object_class,
        predicates: &cli.predicates,
        value_name: &cli.value_name,
        first: cli.first,
        csv: cli.csv,
        hostname: cli.hostname.as_deref(),
        url: cli.url.as_deref(),
        timeout: cli.timeout,
    };

    if let Err(e) = commands::query(&opts) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
