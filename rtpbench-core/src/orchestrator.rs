use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::client::{ClientRun, RunOutcome, run_client_at};
use crate::error::{Error, Result};
use crate::extract::{ClientMetrics, extract};
use crate::preflight::resolve_executable;
use crate::report::AggregateReport;

pub const DEFAULT_STAGGER: Duration = Duration::from_millis(100);
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    pub executable: PathBuf,
    pub client_count: u32,
    /// Forwarded to each client as `--duration=<secs>`.
    pub duration: Duration,
    /// Minimum spacing between consecutive client launches.
    pub stagger: Duration,
    /// Added to `duration` to form each client's hard deadline.
    pub grace_period: Duration,
    /// Appended after the duration flag.
    pub extra_args: Vec<String>,
}

impl BenchmarkConfig {
    #[must_use]
    pub fn new(executable: impl Into<PathBuf>, client_count: u32, duration: Duration) -> Self {
        Self {
            executable: executable.into(),
            client_count,
            duration,
            stagger: DEFAULT_STAGGER,
            grace_period: DEFAULT_GRACE_PERIOD,
            extra_args: Vec::new(),
        }
    }

    #[must_use]
    pub fn client_timeout(&self) -> Duration {
        self.duration.saturating_add(self.grace_period)
    }

    #[must_use]
    pub fn client_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(1 + self.extra_args.len());
        args.push(format!("--duration={}", self.duration_secs()));
        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// Whole seconds handed to the client, rounded up so sub-second runs are not zero.
    #[must_use]
    pub fn duration_secs(&self) -> u64 {
        self.duration.as_secs() + u64::from(self.duration.subsec_nanos() > 0)
    }

    fn validate(&self) -> Result<()> {
        if self.client_count == 0 {
            return Err(Error::InvalidClientCount);
        }
        if self.duration.is_zero() {
            return Err(Error::InvalidDuration);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum ClientEvent {
    Launched { client_id: u32, offset: Duration },
    Finished { client_id: u32, outcome: RunOutcome },
}

pub type ProgressFn = Arc<dyn Fn(ClientEvent) + Send + Sync + 'static>;

/// Per-client result: the raw run plus metrics when the run succeeded.
#[derive(Debug, Clone)]
pub struct ClientReport {
    pub run: ClientRun,
    pub metrics: Option<ClientMetrics>,
}

#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    /// Ordered by `client_id`.
    pub clients: Vec<ClientReport>,
    pub report: AggregateReport,
    pub elapsed: Duration,
}

impl BenchmarkResult {
    pub fn failed(&self) -> impl Iterator<Item = &ClientRun> {
        self.clients
            .iter()
            .filter(|c| !c.run.outcome.is_success())
            .map(|c| &c.run)
    }
}

/// Runs every client concurrently with staggered starts and aggregates the results.
///
/// Only configuration and launch-time errors are returned; per-client failures
/// are reported through each client's [`RunOutcome`].
pub async fn run_benchmark(
    cfg: &BenchmarkConfig,
    progress: Option<ProgressFn>,
) -> Result<BenchmarkResult> {
    cfg.validate()?;
    let executable = Arc::new(resolve_executable(&cfg.executable)?);
    let args = Arc::new(cfg.client_args());
    let timeout = cfg.client_timeout();

    info!(
        executable = %executable.display(),
        clients = cfg.client_count,
        duration_secs = cfg.duration_secs(),
        timeout_secs = timeout.as_secs(),
        "starting benchmark"
    );

    let started = Instant::now();
    let mut handles = Vec::with_capacity(cfg.client_count as usize);

    for client_id in 0..cfg.client_count {
        if client_id > 0 {
            tokio::time::sleep(cfg.stagger).await;
        }

        let offset = started.elapsed();
        if let Some(progress) = &progress {
            progress(ClientEvent::Launched { client_id, offset });
        }

        let executable = Arc::clone(&executable);
        let args = Arc::clone(&args);
        let progress = progress.clone();
        let handle = tokio::spawn(async move {
            let run = run_client_at(client_id, &executable, &args, timeout, offset).await;
            if let Some(progress) = &progress {
                progress(ClientEvent::Finished {
                    client_id,
                    outcome: run.outcome.clone(),
                });
            }
            run
        });
        handles.push((client_id, offset, handle));
    }

    // Join barrier: aggregation never observes a pending client.
    let mut runs = Vec::with_capacity(handles.len());
    for (client_id, offset, handle) in handles {
        let run = match handle.await {
            Ok(run) => run,
            Err(err) => {
                warn!(client_id, error = %err, "client task did not complete");
                ClientRun::failed(client_id, offset, format!("client task: {err}"))
            }
        };
        runs.push(run);
    }

    let result = collect_results(runs, started.elapsed());
    info!(
        successful = result.report.successful_count,
        total = result.report.total_count,
        "benchmark finished"
    );
    Ok(result)
}

/// Extracts metrics from successful runs and builds the aggregate report.
#[must_use]
pub fn collect_results(mut runs: Vec<ClientRun>, elapsed: Duration) -> BenchmarkResult {
    runs.sort_by_key(|r| r.client_id);
    let total_count = runs.len();

    let clients = runs
        .into_iter()
        .map(|run| {
            let metrics = run
                .outcome
                .is_success()
                .then(|| extract(run.client_id, &run.output));
            if let Some(m) = &metrics {
                debug!(
                    client_id = m.client_id,
                    first_rtp_ms = ?m.first_rtp_latency_ms,
                    max_bitrate_kbps = m.max_bitrate_kbps,
                    max_packet_rate = m.max_packet_rate,
                    "extracted client metrics"
                );
            }
            ClientReport { run, metrics }
        })
        .collect::<Vec<_>>();

    let successful = clients
        .iter()
        .filter_map(|c| c.metrics.clone())
        .collect::<Vec<_>>();
    let report = AggregateReport::from_successful(&successful, total_count);

    BenchmarkResult {
        clients,
        report,
        elapsed,
    }
}
