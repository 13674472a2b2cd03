mod cli;
mod exit_codes;
mod output;
mod parse_logs;
mod run;
mod run_error;

use clap::Parser;
use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

// Returning (instead of `std::process::exit`) drops the runtime, which cancels
// still-running client tasks and kills their process groups.
#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = match cli::Cli::try_parse() {
        Ok(v) => v,
        Err(err) => {
            use clap::error::ErrorKind;
            let _ = err.print();
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => exit_codes::ExitCode::Success,
                _ => exit_codes::ExitCode::InvalidInput,
            };
            return code.into();
        }
    };

    // Progress bars and reports own stdout/stderr; diagnostics stay quiet unless asked for.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let code = match cli.command {
        cli::Command::Run(args) => tokio::select! {
            res = run::run(args) => match res {
                Ok(code) => code,
                Err(err) => {
                    eprintln!("{err}");
                    err.exit_code()
                }
            },
            _ = tokio::signal::ctrl_c() => {
                eprintln!("interrupted, stopping clients");
                exit_codes::ExitCode::Interrupted
            }
        },
        cli::Command::Parse(args) => match parse_logs::parse(args).await {
            Ok(code) => code,
            Err(err) => {
                eprintln!("{err:#}");
                exit_codes::ExitCode::RuntimeError
            }
        },
    };

    code.into()
}
