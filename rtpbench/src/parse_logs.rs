use anyhow::Context as _;
use std::path::Path;
use std::time::Duration;

use crate::cli::ParseArgs;
use crate::exit_codes::ExitCode;
use crate::output;

/// Re-runs metric extraction over captured logs. Every log counts as a
/// successful client; failures were already decided when it was captured.
pub async fn parse(args: ParseArgs) -> anyhow::Result<ExitCode> {
    let out = output::formatter(args.output);

    let mut runs = Vec::with_capacity(args.logs.len());
    for (idx, path) in args.logs.iter().enumerate() {
        let output = rtpbench_core::read_log_lines(path)
            .await
            .with_context(|| format!("failed to read client log: {}", path.display()))?;

        runs.push(rtpbench_core::ClientRun {
            client_id: client_id_from_path(path).unwrap_or(idx as u32),
            outcome: rtpbench_core::RunOutcome::Success,
            output,
            launched_at: Duration::ZERO,
            elapsed: Duration::ZERO,
            pid: None,
            peak_rss_bytes: None,
        });
    }

    let result = rtpbench_core::collect_results(runs, Duration::ZERO);
    out.print_summary(&result)?;

    Ok(ExitCode::from_report(&result.report))
}

fn client_id_from_path(path: &Path) -> Option<u32> {
    path.file_name()?
        .to_str()?
        .strip_prefix("client-")?
        .strip_suffix(".log")?
        .parse()
        .ok()
}
