use anyhow::Context as _;

use crate::cli::RunArgs;
use crate::exit_codes::ExitCode;
use crate::output;
use crate::run_error::RunError;

pub async fn run(args: RunArgs) -> Result<ExitCode, RunError> {
    let out = output::formatter(args.output);

    // Fail before printing anything if the client cannot be started at all.
    let executable = rtpbench_core::resolve_executable(&args.client)?;
    let cfg = benchmark_config(&args, executable);

    out.print_header(&cfg);
    let result = rtpbench_core::run_benchmark(&cfg, out.progress()).await?;

    // The report is printed first so a failed log write never hides it.
    out.print_summary(&result).map_err(RunError::RuntimeError)?;

    if !args.no_logs {
        let runs = result.clients.iter().map(|c| &c.run).collect::<Vec<_>>();
        let written = rtpbench_core::write_client_logs(&args.log_dir, &runs)
            .await
            .with_context(|| {
                format!(
                    "failed to write client logs: {}",
                    args.log_dir.display()
                )
            })
            .map_err(RunError::RuntimeError)?;
        tracing::debug!(
            files = written.len(),
            dir = %args.log_dir.display(),
            "wrote client logs"
        );
        eprintln!("logs={}", args.log_dir.display());
    }

    Ok(ExitCode::from_report(&result.report))
}

fn benchmark_config(
    args: &RunArgs,
    executable: std::path::PathBuf,
) -> rtpbench_core::BenchmarkConfig {
    let mut cfg =
        rtpbench_core::BenchmarkConfig::new(executable, args.clients, args.duration.into());
    cfg.stagger = args.stagger.into();
    cfg.grace_period = args.grace.into();
    cfg.extra_args = args.client_args.clone();
    cfg
}
