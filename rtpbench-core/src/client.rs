use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Upper bound for draining buffered output once the process is gone.
/// A descendant that left the client's process group could otherwise keep the
/// readers alive.
const OUTPUT_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

const RSS_SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// Terminal state of one client process.
#[derive(Debug, Clone, PartialEq, Eq, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum RunOutcome {
    Success,
    /// Exit code, or -1 when the process was terminated by a signal.
    NonZeroExit(i32),
    /// The deadline elapsed; the process was killed and reaped.
    Timeout,
    /// The runner could not drive the process (spawn/wait error, panicked task).
    Failed { reason: String },
}

impl RunOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.into()
    }

    fn from_status(status: ExitStatus) -> Self {
        match status.code() {
            Some(0) => Self::Success,
            Some(code) => Self::NonZeroExit(code),
            None => Self::NonZeroExit(-1),
        }
    }
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::NonZeroExit(code) => write!(f, "exit code {code}"),
            Self::Timeout => write!(f, "timeout"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// Everything one runner observed about its client.
#[derive(Debug, Clone)]
pub struct ClientRun {
    pub client_id: u32,
    pub outcome: RunOutcome,
    /// Combined stdout/stderr, interleaved in arrival order.
    pub output: Vec<String>,
    /// Launch time relative to the benchmark start.
    pub launched_at: Duration,
    pub elapsed: Duration,
    pub pid: Option<u32>,
    pub peak_rss_bytes: Option<u64>,
}

impl ClientRun {
    pub(crate) fn failed(client_id: u32, launched_at: Duration, reason: String) -> Self {
        Self {
            client_id,
            outcome: RunOutcome::Failed { reason },
            output: Vec::new(),
            launched_at,
            elapsed: Duration::ZERO,
            pid: None,
            peak_rss_bytes: None,
        }
    }
}

/// Runs one client to completion or until `timeout` elapses.
///
/// Never returns an error: every process failure is folded into [`RunOutcome`].
/// When this returns, the process has exited or has been killed and reaped, and
/// on unix anything left in its process group has been killed too.
pub async fn run_client(
    client_id: u32,
    executable: &Path,
    args: &[String],
    timeout: Duration,
) -> ClientRun {
    run_client_at(client_id, executable, args, timeout, Duration::ZERO).await
}

pub(crate) async fn run_client_at(
    client_id: u32,
    executable: &Path,
    args: &[String],
    timeout: Duration,
    launched_at: Duration,
) -> ClientRun {
    let started = Instant::now();

    let mut cmd = Command::new(executable);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            warn!(client_id, error = %err, "failed to spawn client");
            return ClientRun::failed(client_id, launched_at, format!("spawn client: {err}"));
        }
    };

    let pid = child.id();
    let mut group = ProcessGroup::new(client_id, pid);
    info!(client_id, pid = ?pid, args = ?args, "client started");

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let mut readers = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push(tokio::spawn(forward_lines(stdout, tx.clone())));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(tokio::spawn(forward_lines(stderr, tx.clone())));
    }
    drop(tx);

    let peak_rss = Arc::new(AtomicU64::new(0));
    let sampler = pid.map(|pid| tokio::spawn(sample_peak_rss(pid, Arc::clone(&peak_rss))));

    let waited = tokio::time::timeout(timeout, child.wait()).await;
    let outcome = match waited {
        Ok(Ok(status)) => RunOutcome::from_status(status),
        Ok(Err(err)) => {
            warn!(client_id, error = %err, "failed waiting for client");
            group.kill();
            if let Err(err) = child.kill().await {
                warn!(client_id, error = %err, "failed to kill client");
            }
            RunOutcome::Failed {
                reason: format!("wait client: {err}"),
            }
        }
        Err(_) => {
            warn!(
                client_id,
                timeout_ms = timeout.as_millis() as u64,
                "client timed out, killing process group"
            );
            group.kill();
            if let Err(err) = child.kill().await {
                warn!(client_id, error = %err, "failed to kill timed-out client");
            }
            RunOutcome::Timeout
        }
    };

    // Background children of an exited client would keep loading the server.
    group.kill();

    if let Some(sampler) = sampler {
        sampler.abort();
    }

    let mut output = Vec::new();
    let flush_deadline = tokio::time::Instant::now() + OUTPUT_FLUSH_TIMEOUT;
    while let Ok(Some(line)) = tokio::time::timeout_at(flush_deadline, rx.recv()).await {
        output.push(line);
    }
    for reader in readers {
        reader.abort();
    }

    let elapsed = started.elapsed();
    match &outcome {
        RunOutcome::Success => {
            info!(
                client_id,
                elapsed_ms = elapsed.as_millis() as u64,
                "client finished"
            );
        }
        RunOutcome::NonZeroExit(code) => {
            warn!(client_id, code = *code, "client exited with non-zero code");
        }
        RunOutcome::Timeout | RunOutcome::Failed { .. } => {}
    }
    debug!(client_id, lines = output.len(), "captured client output");

    let peak = peak_rss.load(Ordering::Relaxed);
    ClientRun {
        client_id,
        outcome,
        output,
        launched_at,
        elapsed,
        pid,
        peak_rss_bytes: (peak > 0).then_some(peak),
    }
}

async fn forward_lines<R>(reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\n', '\r']).to_string();
                if tx.send(line).is_err() {
                    return;
                }
            }
        }
    }
}

/// The client's process group. The client is spawned with `process_group(0)`,
/// so the group id is the client's pid.
///
/// Killed at most once: after the leader is reaped its pid may be reused.
/// Dropping an armed group (a cancelled runner) kills it as well.
struct ProcessGroup {
    client_id: u32,
    pgid: Option<u32>,
}

impl ProcessGroup {
    fn new(client_id: u32, pid: Option<u32>) -> Self {
        Self {
            client_id,
            pgid: pid,
        }
    }

    fn kill(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            kill_process_group(self.client_id, pgid);
        }
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(unix)]
fn kill_process_group(client_id: u32, pgid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pgid) else {
        return;
    };

    // SAFETY: killpg takes plain integers and touches no memory.
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc == 0 {
        debug!(client_id, pgid, "killed client process group");
        return;
    }

    let err = std::io::Error::last_os_error();
    // ESRCH: the group is already empty.
    if err.raw_os_error() != Some(libc::ESRCH) {
        warn!(client_id, pgid, error = %err, "failed to kill client process group");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_client_id: u32, _pgid: u32) {}

async fn sample_peak_rss(pid: u32, peak: Arc<AtomicU64>) {
    let pid = Pid::from_u32(pid);
    let refresh = RefreshKind::nothing().with_processes(ProcessRefreshKind::nothing().with_memory());
    let mut sys = System::new_with_specifics(refresh);

    let mut interval = tokio::time::interval(RSS_SAMPLE_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        // Refreshing reads /proc synchronously; keep it off the runtime workers.
        let sampled = tokio::task::spawn_blocking(move || {
            sys.refresh_processes_specifics(
                ProcessesToUpdate::Some(&[pid]),
                true,
                ProcessRefreshKind::nothing().with_memory(),
            );
            let rss = sys.process(pid).map(|p| p.memory());
            (sys, rss)
        })
        .await;

        let Ok((returned, rss)) = sampled else {
            return;
        };
        sys = returned;
        if let Some(rss) = rss {
            peak.fetch_max(rss, Ordering::Relaxed);
        }
    }
}
