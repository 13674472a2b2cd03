use clap::{Args, Parser, Subcommand};
use rtpbench_core::{DEFAULT_GRACE_PERIOD, DEFAULT_STAGGER};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_DURATION: Duration = Duration::from_secs(20);

fn parse_duration(input: &str) -> Result<humantime::Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("duration cannot be empty (expected e.g. 20s, 250ms, 1m)".to_string());
    }
    humantime::parse_duration(s)
        .map(humantime::Duration::from)
        .map_err(|err| format!("invalid duration '{s}': {err} (expected e.g. 20s, 250ms, 1m)"))
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary.
    HumanReadable,
    /// Emit JSON lines (NDJSON) to stdout.
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "rtpbench",
    author,
    version,
    about = "Concurrent load-test harness for real-time media clients",
    long_about = "rtpbench launches N client processes against a media server, lets each run for a fixed duration, captures their output, and reports time to first RTP, peak bitrate and peak packet rate per client and on average.\n\nClients are started one after another with a stagger delay and each one is killed if it outlives its duration plus a grace period."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a benchmark.
    Run(RunArgs),

    /// Re-parse previously captured client logs.
    Parse(ParseArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Client executable; a bare name is looked up on PATH
    #[arg(long, env = "RTPBENCH_CLIENT", default_value = "./client/client")]
    pub client: PathBuf,

    /// Number of clients to launch
    #[arg(long, env = "RTPBENCH_CLIENTS", default_value_t = 5)]
    pub clients: u32,

    /// How long each client stays connected (e.g. 20s, 1m)
    #[arg(
        long,
        env = "RTPBENCH_DURATION",
        default_value_t = humantime::Duration::from(DEFAULT_DURATION),
        value_parser = parse_duration
    )]
    pub duration: humantime::Duration,

    /// Delay between consecutive client launches
    #[arg(
        long,
        env = "RTPBENCH_STAGGER",
        default_value_t = humantime::Duration::from(DEFAULT_STAGGER),
        value_parser = parse_duration
    )]
    pub stagger: humantime::Duration,

    /// Extra time past `--duration` before a client is killed
    #[arg(
        long,
        env = "RTPBENCH_GRACE",
        default_value_t = humantime::Duration::from(DEFAULT_GRACE_PERIOD),
        value_parser = parse_duration
    )]
    pub grace: humantime::Duration,

    /// Directory for captured client output (client-<id>.log)
    #[arg(long, env = "RTPBENCH_LOG_DIR", default_value = "logs")]
    pub log_dir: PathBuf,

    /// Do not write captured output to disk
    #[arg(long, default_value_t = false)]
    pub no_logs: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,

    /// Extra arguments passed to every client after `--duration=<secs>`
    #[arg(last = true)]
    pub client_args: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ParseArgs {
    /// Captured client logs; `client-<id>.log` names keep their id
    #[arg(required = true)]
    pub logs: Vec<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,
}
