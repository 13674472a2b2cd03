mod client;
mod error;
mod extract;
mod logs;
mod orchestrator;
mod preflight;
mod report;

pub use client::{ClientRun, RunOutcome, run_client};
pub use error::{Error, Result};
pub use extract::{ClientMetrics, MetricExtractor, extract};
pub use logs::{client_log_path, read_log_lines, write_client_logs};
pub use orchestrator::{
    BenchmarkConfig, BenchmarkResult, ClientEvent, ClientReport, DEFAULT_GRACE_PERIOD,
    DEFAULT_STAGGER, ProgressFn, collect_results, run_benchmark,
};
pub use preflight::resolve_executable;
pub use report::AggregateReport;
