//! Argument grammar for the `ricochet` binary.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Out-of-band correlation scanner for second-order web vulnerabilities.
#[derive(Debug, Parser)]
#[command(name = "ricochet", version, about, long_about = None)]
pub struct Cli {
    /// Path to the findings database. Defaults to `~/.ricochet/ricochet.db`.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Minimum log level written to stderr. `RUST_LOG` overrides this.
    #[arg(long, global = true, value_enum, default_value_t = LogLevelArg::Info)]
    pub log_level: LogLevelArg,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormatArg::Text)]
    pub log_format: LogFormatArg,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Mirrors [`ricochet_telemetry::LogLevel`] as a `clap`-parseable enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevelArg {
    /// Everything, including per-request tracing.
    Debug,
    /// Lifecycle events.
    Info,
    /// Dropped callbacks, retried requests.
    Warn,
    /// Failures that abort a command.
    Error,
}

/// Mirrors [`ricochet_telemetry::LogFormat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    /// Human-readable, one line per event.
    Text,
    /// One JSON object per event.
    Json,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP and/or DNS callback listener(s).
    Listen(ListenArgs),
    /// Inject a payload into one or more vectors.
    Inject(InjectArgs),
    /// Inject, then adaptively poll the store for callbacks against this batch.
    Passive(PassiveArgs),
    /// Probe a catalog of known endpoints on a base URL for out-of-band triggers.
    Active(ActiveArgs),
    /// Suggest likely trigger contexts for a parameter, token, or recent batch.
    Suggest(SuggestArgs),
    /// List recorded findings.
    Findings(FindingsArgs),
    /// Render a bug-bounty-style report from recorded findings.
    Report(ReportArgs),
    /// Interact with an external out-of-band collaborator server.
    Interactsh(InteractshArgs),
}

/// `listen --http` / `listen --dns`.
#[derive(Debug, Args)]
pub struct ListenArgs {
    /// Start the HTTP callback listener.
    #[arg(long)]
    pub http: bool,
    /// Start the DNS callback listener.
    #[arg(long)]
    pub dns: bool,
    /// Bind address (host only; combined with `--port`/`--dns-port`).
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,
    /// HTTP listener port.
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
    /// DNS listener port.
    #[arg(long = "dns-port", default_value_t = 5353)]
    pub dns_port: u16,
}

/// Shared injection options, embedded by both `inject` and `passive`.
#[derive(Debug, Args)]
pub struct InjectionOpts {
    /// Target URL (used with `-p`/`--param`; mutually exclusive with `-r`).
    #[arg(short = 'u', long = "url")]
    pub url: Option<String>,
    /// Single parameter name to inject into (requires `-u`).
    #[arg(short = 'p', long = "param")]
    pub param: Option<String>,
    /// Burp-style raw request file (mutually exclusive with `-u`/`-p`).
    #[arg(short = 'r', long = "request-file")]
    pub request_file: Option<PathBuf>,
    /// A single payload template containing `{{CALLBACK}}`.
    #[arg(long)]
    pub payload: Option<String>,
    /// File of payload templates, one per line (`#` and blank lines skipped).
    #[arg(long)]
    pub payloads: Option<PathBuf>,
    /// Context tag driving severity derivation (e.g. `xss:html`, `sqli:mssql`).
    #[arg(long, default_value = "info")]
    pub context: String,
    /// Base callback URL each payload is joined against, e.g. `http://cb.example`.
    #[arg(long)]
    pub callback: String,
    /// Outbound requests per second. Falls back to config/default.
    #[arg(long)]
    pub rate: Option<u32>,
    /// Per-request timeout, in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,
    /// Outbound proxy URL.
    #[arg(long)]
    pub proxy: Option<String>,
    /// Skip TLS certificate verification.
    #[arg(long)]
    pub insecure: bool,
    /// Record injections without sending any request.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
    /// Crawler-produced JSON vector file (`[{"url","parameters":[...]}]`).
    #[arg(long = "from-crawl")]
    pub from_crawl: Option<PathBuf>,
}

/// `inject`.
#[derive(Debug, Args)]
pub struct InjectArgs {
    #[command(flatten)]
    pub injection: InjectionOpts,
}

/// `passive`.
#[derive(Debug, Args)]
pub struct PassiveArgs {
    #[command(flatten)]
    pub injection: InjectionOpts,
    /// Starting poll interval, in seconds, before adaptive backoff.
    #[arg(long = "poll-interval")]
    pub poll_interval: Option<u64>,
    /// Total wall-time budget for polling, in seconds.
    #[arg(long = "poll-timeout")]
    pub poll_timeout: Option<u64>,
}

/// `active`.
#[derive(Debug, Args)]
pub struct ActiveArgs {
    /// Base URL to probe.
    #[arg(short = 'u', long = "url")]
    pub base_url: String,
    /// File of endpoint paths to probe, one per line. Defaults to a small
    /// built-in catalog of commonly-instrumented paths.
    #[arg(long)]
    pub endpoints: Option<PathBuf>,
    /// Base callback URL each payload is joined against, e.g. `http://cb.example`.
    #[arg(long)]
    pub callback: String,
    /// Outbound requests per second.
    #[arg(long)]
    pub rate: Option<u32>,
    /// Outbound proxy URL.
    #[arg(long)]
    pub proxy: Option<String>,
}

/// `suggest`.
#[derive(Debug, Args)]
pub struct SuggestArgs {
    /// Suggest trigger contexts for a parameter name.
    #[arg(long)]
    pub param: Option<String>,
    /// Suggest based on a specific injection's recorded context.
    #[arg(long = "correlation-id")]
    pub correlation_id: Option<String>,
    /// Suggest based on the N most recent injections still awaiting a callback.
    #[arg(long)]
    pub recent: Option<u32>,
}

/// `findings`.
#[derive(Debug, Args)]
pub struct FindingsArgs {
    /// Output format.
    #[arg(short = 'o', long = "output", value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
    /// Only findings received at most this many hours ago.
    #[arg(long)]
    pub since: Option<f64>,
    /// Minimum severity to include (`info`, `medium`, `high`).
    #[arg(long = "min-severity")]
    pub min_severity: Option<String>,
    /// Include full callback headers/body in text output.
    #[arg(long)]
    pub verbose: bool,
}

/// Output format shared by `findings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per line.
    Json,
    /// Human-readable summary.
    Text,
}

/// `report`.
#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Render a single report for one injection's findings.
    #[arg(long = "correlation-id")]
    pub correlation_id: Option<String>,
    /// Render one report per injection that has at least one finding.
    #[arg(long)]
    pub all: bool,
    /// Directory reports are written to (required with `--all`).
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// `interactsh url` / `interactsh poll`.
#[derive(Debug, Args)]
pub struct InteractshArgs {
    #[command(subcommand)]
    pub action: InteractshAction,
}

/// Interactsh subcommands.
#[derive(Debug, Subcommand)]
pub enum InteractshAction {
    /// Mint a fresh out-of-band URL from the collaborator server.
    Url {
        /// Collaborator server base URL.
        #[arg(long)]
        server: String,
    },
    /// Poll the collaborator server for interactions against a correlation ID.
    Poll {
        /// Collaborator server base URL.
        #[arg(long)]
        server: String,
        /// Correlation ID returned by a prior `interactsh url` call.
        #[arg(long = "correlation-id")]
        correlation_id: String,
    },
}
