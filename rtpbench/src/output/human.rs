use std::sync::Arc;

mod format;
mod progress;
mod summary;

use progress::HumanProgress;
use summary::render;

use super::OutputFormatter;

pub(crate) struct HumanReadableOutput {
    progress: Arc<HumanProgress>,
}

impl HumanReadableOutput {
    pub(crate) fn new() -> Self {
        Self {
            progress: Arc::new(HumanProgress::new()),
        }
    }
}

impl OutputFormatter for HumanReadableOutput {
    fn print_header(&self, cfg: &rtpbench_core::BenchmarkConfig) {
        println!("client: {}", cfg.executable.display());
        println!(
            "clients: {} duration={}s stagger={:?} timeout={:?}",
            cfg.client_count,
            cfg.duration_secs(),
            cfg.stagger,
            cfg.client_timeout()
        );
        if !cfg.extra_args.is_empty() {
            println!("client args: {}", cfg.extra_args.join(" "));
        }
        println!();
        self.progress.start(u64::from(cfg.client_count));
    }

    fn progress(&self) -> Option<rtpbench_core::ProgressFn> {
        let progress = self.progress.clone();
        Some(Arc::new(move |event: rtpbench_core::ClientEvent| {
            progress.on_event(&event);
        }))
    }

    fn print_summary(&self, result: &rtpbench_core::BenchmarkResult) -> anyhow::Result<()> {
        self.progress.finish();
        print!("{}", render(result));
        Ok(())
    }
}
